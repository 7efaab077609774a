// Error types for the dashboard service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert DashboardError to HTTP responses for Axum.
// Only the administrative endpoints and the message-detail lookup surface
// errors at all; aggregation handlers flatten upstream failures to empty
// payloads before an error can reach this impl.
impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            DashboardError::NotFound => {
                // Message detail serves an empty object alongside the 404.
                return (StatusCode::NOT_FOUND, axum::Json(json!({}))).into_response();
            }
            DashboardError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", self.to_string())
            }
            DashboardError::InvalidCredentials(_) | DashboardError::TokenRefresh(_) => {
                (StatusCode::UNAUTHORIZED, "authentication_error", self.to_string())
            }
            DashboardError::Config(_) | DashboardError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", self.to_string())
            }
            DashboardError::Upstream(_) | DashboardError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_error", self.to_string())
            }
            _ => {
                (StatusCode::INTERNAL_SERVER_ERROR, "api_error", self.to_string())
            }
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
