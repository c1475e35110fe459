use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

/// What a remote time server answered with.
///
/// Every field is optional because servers (and client libraries) do not
/// always fill them in. Offsets and delays are in milliseconds; a value that
/// is not finite is treated the same as a missing one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSample {
    pub date: Option<DateTime<Utc>>,
    pub offset_millis: Option<f64>,
    pub delay_millis: Option<f64>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("failed to resolve {server}: {reason}")]
    Resolve { server: String, reason: String },

    #[error("{0}")]
    Transport(String),
}

/// A single request/response exchange with a remote time server.
///
/// Implementations must not retry and must not cache. The returned future is
/// `'static` so the caller can run it on its own task and abort it.
pub trait NtpClient: Send + Sync {
    fn query(
        &self,
        server: String,
        port: u16,
    ) -> BoxFuture<'static, Result<TimeSample, QueryError>>;
}

/// Either a usable client or the reason one could not be created.
pub type ClientSlot = Result<Arc<dyn NtpClient>, String>;
