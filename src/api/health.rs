use crate::server::state::AppStateExt;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub checks: HealthChecks,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub server: String,
    pub database: String,
    pub memory: String,
    /// Seconds since the service started
    pub uptime: f64,
    pub response_time_millis: u64,
}

/// Process self-inspection, computed per request.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthSnapshot {
    pub status: String,
    pub uptime_seconds: f64,
    pub memory_healthy: bool,
    pub response_time_millis: u64,
}

/// What the OS reports about the current process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ProcessStats {
    /// Resident size in bytes
    memory: Option<u64>,
    /// Seconds since the process started
    run_time: Option<u64>,
}

fn current_process_stats() -> ProcessStats {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return ProcessStats::default();
    };

    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );

    system
        .process(pid)
        .map(|process| ProcessStats {
            memory: Some(process.memory()),
            run_time: Some(process.run_time()),
        })
        .unwrap_or_default()
}

/// Process uptime, or time since `started_at` when the OS does not report one.
fn uptime_seconds(run_time: Option<u64>, started_at: Instant) -> f64 {
    match run_time {
        Some(seconds) => seconds as f64,
        None => started_at.elapsed().as_secs_f64(),
    }
}

impl HealthSnapshot {
    pub fn capture(started_at: Instant) -> Self {
        let start = Instant::now();

        let stats = current_process_stats();
        // The process counts as memory-healthy when the OS reports a resident size for it
        let memory_healthy = stats.memory.is_some_and(|bytes| bytes > 0);
        let uptime_seconds = uptime_seconds(stats.run_time, started_at);

        Self {
            status: "healthy".to_string(),
            uptime_seconds,
            memory_healthy,
            response_time_millis: start.elapsed().as_millis() as u64,
        }
    }
}

impl From<HealthSnapshot> for HealthResponse {
    fn from(snapshot: HealthSnapshot) -> Self {
        Self {
            status: snapshot.status,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            checks: HealthChecks {
                server: "healthy".to_string(),
                database: "not_applicable".to_string(),
                memory: if snapshot.memory_healthy {
                    "healthy".to_string()
                } else {
                    "unknown".to_string()
                },
                uptime: snapshot.uptime_seconds,
                response_time_millis: snapshot.response_time_millis,
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub async fn route(state: AppStateExt) -> Json<HealthResponse> {
    Json(HealthSnapshot::capture(state.started_at).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_capture_inspects_current_process() {
        let snapshot = HealthSnapshot::capture(Instant::now());

        assert_eq!(snapshot.status, "healthy");
        assert!(snapshot.uptime_seconds >= 0.0);

        if sysinfo::IS_SUPPORTED_SYSTEM {
            assert!(snapshot.memory_healthy);
        }
    }

    #[test]
    fn test_uptime_prefers_process_run_time() {
        let started_at = Instant::now();

        assert_eq!(uptime_seconds(Some(90), started_at), 90.0);
    }

    #[test]
    fn test_uptime_falls_back_to_start_instant() {
        let started_at = Instant::now();
        std::thread::sleep(Duration::from_millis(20));

        assert!(uptime_seconds(None, started_at) >= 0.02);
    }

    #[test]
    fn test_response_shape() {
        let response: HealthResponse = HealthSnapshot {
            status: "healthy".to_string(),
            uptime_seconds: 1.5,
            memory_healthy: false,
            response_time_millis: 0,
        }
        .into();

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "healthy");
        assert_eq!(value["checks"]["database"], "not_applicable");
        assert_eq!(value["checks"]["memory"], "unknown");
        assert_eq!(value["checks"]["uptime"], 1.5);
        assert_eq!(value["checks"]["responseTimeMillis"], 0);
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }
}
