use crate::{
    clock::{timezone::format_local_time, ClockReading, ErrorKind, SourceKind},
    server::state::AppStateExt,
};
use axum::Json;
use chrono::SecondsFormat;
use metrics::counter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeResponse {
    /// ISO-8601 in UTC with millisecond precision
    pub time: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub timezone: String,
    pub local_time: String,
    pub time_source: SourceKind,
    /// Absent when no NTP server is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntp: Option<NtpDetails>,
    pub status: String,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NtpDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_valid_metrics: Option<bool>,
}

impl NtpDetails {
    fn from_reading(reading: &ClockReading) -> Option<Self> {
        let server = reading.server.clone()?;

        let details = match &reading.error {
            Some(failure) => Self {
                server: Some(server),
                error: Some(failure.kind),
                error_details: Some(failure.detail.clone()),
                ..Self::default()
            },
            None => Self {
                server: Some(server),
                offset: reading.offset_millis,
                delay: reading.delay_millis,
                has_valid_metrics: Some(reading.metrics_valid),
                ..Self::default()
            },
        };

        Some(details)
    }
}

impl TimeResponse {
    pub fn new(reading: &ClockReading, timezone: &str) -> Self {
        let local = format_local_time(reading.timestamp, timezone);

        Self {
            time: reading
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            timestamp: reading.timestamp.timestamp_millis(),
            timezone: local.zone,
            local_time: local.formatted,
            time_source: reading.source,
            ntp: NtpDetails::from_reading(reading),
            status: "healthy".to_string(),
        }
    }
}

/// Always answers 200: remote failures only change `timeSource` and `ntp`.
pub async fn route(state: AppStateExt) -> Json<TimeResponse> {
    let reading = state
        .resolver
        .resolve(state.config.ntp.server.as_deref())
        .await;

    counter!("time_readings_total", "source" => reading.source.as_str()).increment(1);

    if let Some(failure) = &reading.error {
        counter!("ntp_query_failures_total", "error" => failure.kind.as_str()).increment(1);
    }

    Json(TimeResponse::new(&reading, &state.config.timezone))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NtpFailure;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn noon() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_local_reading_omits_ntp() {
        let response = TimeResponse::new(&ClockReading::local(noon()), "America/New_York");

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "time": "2024-01-15T12:00:00.000Z",
                "timestamp": 1_705_320_000_000_i64,
                "timezone": "America/New_York",
                "localTime": "2024-01-15 07:00:00",
                "timeSource": "local",
                "status": "healthy",
            })
        );
    }

    #[test]
    fn test_ntp_reading_reports_metrics() {
        let reading = ClockReading {
            timestamp: noon(),
            source: SourceKind::Ntp,
            server: Some("pool.ntp.org".to_string()),
            offset_millis: Some(-3),
            delay_millis: Some(18),
            metrics_valid: true,
            error: None,
        };

        let value = serde_json::to_value(TimeResponse::new(&reading, "UTC")).unwrap();

        assert_eq!(value["timeSource"], "ntp");
        assert_eq!(
            value["ntp"],
            json!({
                "server": "pool.ntp.org",
                "offset": -3,
                "delay": 18,
                "hasValidMetrics": true,
            })
        );
    }

    #[test]
    fn test_fallback_reading_reports_error() {
        let reading = ClockReading::fallback(
            noon(),
            "10.0.0.1",
            NtpFailure::new(ErrorKind::ConnectionFailed, "Connection refused"),
        );

        let value = serde_json::to_value(TimeResponse::new(&reading, "UTC")).unwrap();

        assert_eq!(value["timeSource"], "local_fallback");
        assert_eq!(value["status"], "healthy");
        assert_eq!(
            value["ntp"],
            json!({
                "server": "10.0.0.1",
                "error": "connection_failed",
                "errorDetails": "Connection refused",
            })
        );
    }
}
