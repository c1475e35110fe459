pub mod client;
pub mod resolver;
pub mod sntp;
pub mod timezone;

pub use client::{NtpClient, QueryError, TimeSample};
pub use resolver::{ClockReading, ClockResolver, ErrorKind, NtpFailure, SourceKind};
