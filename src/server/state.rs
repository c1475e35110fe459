use crate::{clock::ClockResolver, config::Config};
use axum::extract::State;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: ClockResolver,
    /// When the router was built, uptime fallback when the OS reports no process run time.
    pub started_at: Instant,
}

pub type AppStateExt = State<AppState>;
