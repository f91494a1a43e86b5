//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use timbre_runtime::RuntimeError;

/// Errors a route handler can surface to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Missing or wrong bearer credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// A runtime stage failed in a way the handler cannot absorb.
    #[error("internal error: {0}")]
    Internal(#[from] RuntimeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
