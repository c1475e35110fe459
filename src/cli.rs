use crate::config::{Config, LogLevel, MetricsPolicy, DEFAULT_NTP_PORT};
use crate::errors::AppError;
use clap::Parser;
use std::net::IpAddr;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "SERVER_ADDRESS", default_value = "0.0.0.0")]
    pub server_address: IpAddr,

    #[arg(long, env = "SERVER_PORT", default_value = "3000")]
    pub server_port: u16,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// IANA timezone used for `localTime`, defaults to the host timezone
    #[arg(long, env = "TIMEZONE")]
    pub timezone: Option<String>,

    /// Remote NTP server, local clock is used when unset or blank
    #[arg(long, env = "NTP_SERVER")]
    pub ntp_server: Option<String>,

    #[arg(long, env = "NTP_PORT", default_value_t = DEFAULT_NTP_PORT)]
    pub ntp_port: u16,

    #[arg(long, env = "NTP_TIMEOUT_MS", default_value = "5000")]
    pub ntp_timeout_ms: u64,

    /// How to treat a valid NTP timestamp that arrives with unusable offset or delay
    #[arg(long, env = "NTP_METRICS_POLICY", default_value = "permissive")]
    pub metrics_policy: MetricsPolicy,

    #[arg(long, env = "NO_METRICS")]
    pub no_metrics: bool,
}

impl Args {
    pub fn init() -> Result<Config, AppError> {
        // clap prints usage and exits on its own for --help and bad flags
        Config::from_args(Args::parse())
    }
}
