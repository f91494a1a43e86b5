//! Bearer-token auth middleware.
//!
//! Active only when `server.apiKey` is configured; otherwise every request
//! passes. `/health` and `/metrics` are mounted outside this layer.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject requests whose `Authorization: Bearer <key>` does not match the
/// configured API key.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.settings.server.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(key) if key == expected => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}
