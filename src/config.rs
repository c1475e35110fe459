use crate::{cli::Args, clock::timezone, errors::AppError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Formatter};
use std::net::IpAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_NTP_PORT: u16 = 123;
pub const DEFAULT_NTP_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: IpAddr,
    pub server_port: u16,
    pub log_level: Level,
    pub timezone: String,
    pub ntp: NtpConfig,
    pub no_metrics: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NtpConfig {
    /// Remote time server. `None` means local clock only.
    pub server: Option<String>,
    pub port: u16,
    pub timeout: Duration,
    pub metrics_policy: MetricsPolicy,
}

impl Default for NtpConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_NTP_PORT,
            timeout: DEFAULT_NTP_TIMEOUT,
            metrics_policy: MetricsPolicy::default(),
        }
    }
}

/// What to do when the server sends a usable timestamp but
/// its offset or delay is missing or not a finite number.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsPolicy {
    /// Keep the remote timestamp, report zeroed metrics as `ntp_partial`.
    #[default]
    Permissive,
    /// Discard the reading and fall back to the local clock.
    Strict,
}

impl fmt::Display for MetricsPolicy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MetricsPolicy::Permissive => write!(f, "permissive"),
            MetricsPolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Blank and whitespace-only values count as unset.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, AppError> {
        if args.ntp_timeout_ms == 0 {
            return Err(AppError::Config(
                "--ntp-timeout-ms must be greater than zero".into(),
            ));
        }

        let timezone = non_blank(args.timezone).unwrap_or_else(timezone::host_timezone);

        Ok(Config {
            server_address: args.server_address,
            server_port: args.server_port,
            log_level: args.log_level.into(),
            timezone,
            ntp: NtpConfig {
                server: non_blank(args.ntp_server),
                port: args.ntp_port,
                timeout: Duration::from_millis(args.ntp_timeout_ms),
                metrics_policy: args.metrics_policy,
            },
            no_metrics: args.no_metrics,
        })
    }
}
