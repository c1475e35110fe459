use super::state::AppState;
use crate::{api, middlewares::metrics::track_http_metrics};
use axum::{middleware::from_fn, routing::get, Router};

pub fn get_api_routes(enable_metrics: bool) -> Router<AppState> {
    let mut router = Router::new()
        .route("/api/health", get(api::health::route))
        .route("/api/time", get(api::time::route));

    if enable_metrics {
        router = router
            .route("/metrics", get(api::metrics::route))
            .route_layer(from_fn(track_http_metrics));
    }

    router
}
