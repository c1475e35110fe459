pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod middlewares;
pub mod server;

pub use errors::{ApiError, AppError};
