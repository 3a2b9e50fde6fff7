//! Error types for the gateway.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The backend could not be reached or the exchange failed in transit.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal gateway error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            GatewayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let message = self.to_string();

        match &self {
            GatewayError::Upstream(_) => {
                tracing::warn!(status = %status, code, error = %message, "Upstream error");
            }
            _ => {
                tracing::error!(status = %status, code, error = %message, "Gateway error");
            }
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_become_500() {
        let error = GatewayError::Internal("response assembly failed".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
