use axum::{extract::Request, middleware::Next, response::Response};
use metrics::counter;

/// Counts every routed request by method, path and status.
pub async fn track_http_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    response
}
