pub mod logging;
pub mod metrics;
pub mod routes;
pub mod state;

use crate::{
    clock::{client::ClientSlot, sntp::default_client, ClockResolver},
    config::Config,
    errors::ApiError,
    middlewares::errors::error_middleware,
};
use axum::{middleware::from_fn, Extension, Router};
use self::metrics::{init_metrics, spawn_process_collector_if};
use self::routes::get_api_routes;
use self::state::AppState;
use std::sync::Arc;
use std::time::Instant;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::warn;

/// Builds the Axum `Router` with the production NTP client.
pub async fn build(config: Arc<Config>) -> Router {
    let client = default_client(config.ntp.timeout);

    build_with_client(config, client).await
}

/// Builds the Axum `Router` around the given NTP client slot.
pub async fn build_with_client(config: Arc<Config>, client: ClientSlot) -> Router {
    // Setting up the metrics recorder needs to be the very first step before
    // doing anything that uses metrics, or the initial data will be lost:
    let metrics_handle = init_metrics(!config.no_metrics);
    spawn_process_collector_if(!config.no_metrics);

    if let (Some(server), Err(reason)) = (&config.ntp.server, &client) {
        warn!(%server, "NTP server configured but no client is available: {reason}");
    }

    let app_state = AppState {
        resolver: ClockResolver::new(client, &config.ntp),
        config: config.clone(),
        started_at: Instant::now(),
    };

    let inner = {
        let mut routes = get_api_routes(!config.no_metrics)
            .with_state(app_state)
            .layer(from_fn(error_middleware))
            .fallback(ApiError::not_found());

        if let Some(prom_handler) = metrics_handle {
            routes = routes.layer(Extension(prom_handler));
        }

        routes
    };

    let inner = NormalizePathLayer::trim_trailing_slash().layer(inner);

    Router::new().fallback_service(inner)
}
