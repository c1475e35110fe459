use crate::errors::ApiError;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;

pub async fn error_middleware(request: Request, next: Next) -> Result<Response, Infallible> {
    let request_path = request.uri().path().to_string();
    let request_uri = request.uri().to_string();
    let response = next.run(request).await;
    let status_code = response.status();

    // axum answers unsupported methods with an empty 405, give it a JSON body
    if status_code == StatusCode::METHOD_NOT_ALLOWED {
        tracing::warn!(
            path = %request_path,
            uri = %request_uri,
            "Method not allowed"
        );
        return Ok(ApiError::method_not_allowed().into_response());
    }

    // Hide server error details from the user, keep them in the logs
    if status_code.is_server_error() {
        handle_server_error(response, &request_path, &request_uri, status_code).await
    } else if status_code.is_client_error() {
        log_client_error(response, &request_path, &request_uri, status_code).await
    } else {
        Ok(response)
    }
}

async fn handle_server_error(
    response: Response,
    request_path: &str,
    request_uri: &str,
    status_code: StatusCode,
) -> Result<Response, Infallible> {
    match to_bytes(response.into_body(), usize::MAX).await {
        Ok(bytes) => log_server_error(&bytes, request_path, request_uri, status_code),
        Err(e) => {
            tracing::error!(
                path = %request_path,
                uri = %request_uri,
                status = %status_code,
                "Failed to read body: {e:?}",
            );
        },
    }

    Ok(ApiError::internal_server_error_user().into_response())
}

async fn log_client_error(
    response: Response,
    request_path: &str,
    request_uri: &str,
    status_code: StatusCode,
) -> Result<Response, Infallible> {
    let (parts, body) = response.into_parts();

    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            tracing::warn!(
                path = %request_path,
                uri = %request_uri,
                status = %status_code,
                "Client error: {}",
                error_detail(&bytes),
            );

            // Reconstruct the response with the original body
            Ok(Response::from_parts(parts, Body::from(bytes)))
        },
        Err(_) => Ok(ApiError::internal_server_error_user().into_response()),
    }
}

fn log_server_error(bytes: &Bytes, request_path: &str, request_uri: &str, status_code: StatusCode) {
    tracing::error!(
        path = %request_path,
        uri = %request_uri,
        status = %status_code,
        "Server error: {}",
        error_detail(bytes),
    );
}

fn error_detail(bytes: &Bytes) -> String {
    match serde_json::from_slice::<ApiError>(bytes) {
        Ok(api_error) => format!("{} - {}", api_error.error, api_error.message),
        Err(_) => String::from_utf8_lossy(bytes).to_string(),
    }
}
