use super::client::{ClientSlot, NtpClient, QueryError, TimeSample};
use crate::config::{MetricsPolicy, NtpConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where the timestamp of a [`ClockReading`] came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// No server configured.
    Local,
    /// Remote timestamp with valid offset and delay.
    Ntp,
    /// Remote timestamp, metrics missing or unusable.
    NtpPartial,
    /// Remote query failed, local clock used instead.
    LocalFallback,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ntp => "ntp",
            Self::NtpPartial => "ntp_partial",
            Self::LocalFallback => "local_fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    ConnectionFailed,
    InvalidDate,
    InvalidResponse,
    ClientUnavailable,
    UnexpectedResult,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed => "connection_failed",
            Self::InvalidDate => "invalid_date",
            Self::InvalidResponse => "invalid_response",
            Self::ClientUnavailable => "client_unavailable",
            Self::UnexpectedResult => "unexpected_result",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a remote query did not produce a usable timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtpFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl NtpFailure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<QueryError> for NtpFailure {
    fn from(err: QueryError) -> Self {
        Self::new(ErrorKind::ConnectionFailed, err.to_string())
    }
}

/// One clock observation, created per request.
///
/// `Ntp` and `NtpPartial` readings carry the server's timestamp; `Local` and
/// `LocalFallback` readings carry the local clock at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockReading {
    pub timestamp: DateTime<Utc>,
    pub source: SourceKind,
    pub server: Option<String>,
    pub offset_millis: Option<i64>,
    pub delay_millis: Option<i64>,
    pub metrics_valid: bool,
    pub error: Option<NtpFailure>,
}

impl ClockReading {
    pub fn local(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            source: SourceKind::Local,
            server: None,
            offset_millis: None,
            delay_millis: None,
            metrics_valid: false,
            error: None,
        }
    }

    pub fn fallback(timestamp: DateTime<Utc>, server: &str, failure: NtpFailure) -> Self {
        Self {
            timestamp,
            source: SourceKind::LocalFallback,
            server: Some(server.to_string()),
            offset_millis: None,
            delay_millis: None,
            metrics_valid: false,
            error: Some(failure),
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Rounds half away from zero, saturating at the `i64` range.
fn round_millis(value: f64) -> i64 {
    value.round() as i64
}

/// Turns an optional server address into a [`ClockReading`].
///
/// Issues at most one remote query per call and never fails: every error
/// becomes a `LocalFallback` reading that keeps the reason.
#[derive(Clone)]
pub struct ClockResolver {
    client: ClientSlot,
    port: u16,
    timeout: Duration,
    policy: MetricsPolicy,
}

impl ClockResolver {
    pub fn new(client: ClientSlot, config: &NtpConfig) -> Self {
        Self {
            client,
            port: config.port,
            timeout: config.timeout,
            policy: config.metrics_policy,
        }
    }

    pub async fn resolve(&self, server: Option<&str>) -> ClockReading {
        let Some(server) = server.map(str::trim).filter(|s| !s.is_empty()) else {
            return ClockReading::local(Utc::now());
        };

        match self.query_remote(server).await {
            Ok(reading) => {
                debug!(
                    %server,
                    source = reading.source.as_str(),
                    offset = ?reading.offset_millis,
                    delay = ?reading.delay_millis,
                    "NTP query succeeded"
                );
                reading
            },
            Err(failure) => {
                warn!(
                    %server,
                    error = failure.kind.as_str(),
                    detail = %failure.detail,
                    "NTP query failed, falling back to local time"
                );
                ClockReading::fallback(Utc::now(), server, failure)
            },
        }
    }

    async fn query_remote(&self, server: &str) -> Result<ClockReading, NtpFailure> {
        let client: &Arc<dyn NtpClient> = self
            .client
            .as_ref()
            .map_err(|reason| NtpFailure::new(ErrorKind::ClientUnavailable, reason.clone()))?;

        // The query runs on its own task so a timeout can abort it outright;
        // a response arriving after that point has nowhere to go.
        let mut task = tokio::spawn(client.query(server.to_string(), self.port));

        let sample = match tokio::time::timeout(self.timeout, &mut task).await {
            Err(_) => {
                task.abort();
                return Err(NtpFailure::new(
                    ErrorKind::Timeout,
                    format!(
                        "no response from {server} within {}ms",
                        self.timeout.as_millis()
                    ),
                ));
            },
            Ok(Err(join_error)) => {
                return Err(NtpFailure::new(
                    ErrorKind::UnexpectedResult,
                    format!("NTP query task ended abnormally: {join_error}"),
                ));
            },
            Ok(Ok(result)) => result?,
        };

        self.validate(server, sample)
    }

    fn validate(&self, server: &str, sample: TimeSample) -> Result<ClockReading, NtpFailure> {
        let timestamp = sample.date.ok_or_else(|| {
            NtpFailure::new(
                ErrorKind::InvalidDate,
                "server response did not contain a usable timestamp",
            )
        })?;

        let offset = finite(sample.offset_millis);
        let delay = finite(sample.delay_millis);
        let metrics_valid = offset.is_some() && delay.is_some();

        if !metrics_valid && self.policy == MetricsPolicy::Strict {
            return Err(NtpFailure::new(
                ErrorKind::InvalidResponse,
                format!(
                    "offset and delay must be numeric, got offset={:?} delay={:?}",
                    sample.offset_millis, sample.delay_millis
                ),
            ));
        }

        Ok(ClockReading {
            timestamp,
            source: if metrics_valid {
                SourceKind::Ntp
            } else {
                SourceKind::NtpPartial
            },
            server: Some(server.to_string()),
            offset_millis: Some(offset.map_or(0, round_millis)),
            delay_millis: Some(delay.map_or(0, round_millis)),
            metrics_valid,
            error: None,
        })
    }
}
