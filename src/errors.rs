use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::{fmt, io};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Server startup error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        error!("I/O Error occurred: {}", err);
        AppError::Server(err.to_string())
    }
}

/// JSON error body returned by the HTTP layer.
/// Contains the following fields:
/// - status_code: the HTTP status code to return
/// - error: a short description of the error
/// - message: a longer description of the error
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ApiError {
    pub fn not_found() -> Self {
        Self {
            error: "Not Found".to_string(),
            message: "The requested component has not been found.".to_string(),
            status_code: 404,
        }
    }

    /// Unsupported method on a known path. Only `GET` is served.
    pub fn method_not_allowed() -> Self {
        Self {
            error: "Method Not Allowed".to_string(),
            message: "Only GET requests are supported.".to_string(),
            status_code: 405,
        }
    }

    pub fn internal_server_error(message: String) -> Self {
        Self {
            error: "Internal Server Error".to_string(),
            message,
            status_code: 500,
        }
    }

    /// Generic message for the user, details stay in the logs
    pub fn internal_server_error_user() -> Self {
        Self::internal_server_error("An unexpected error occurred.".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiError: {}", self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // log only server errors
        if status_code.is_server_error() {
            error!("Error occurred: {} - {}", self.error, self.message);
        }

        (status_code, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_not_found_into_response() {
        let response = ApiError::not_found().into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ApiError = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body, ApiError::not_found());
    }

    #[test]
    fn test_unknown_status_code_maps_to_500() {
        let err = ApiError {
            error: "Teapot".to_string(),
            message: "short and stout".to_string(),
            status_code: 1000,
        };

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
