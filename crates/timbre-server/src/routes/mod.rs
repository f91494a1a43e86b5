//! Route handlers and router assembly.

pub mod chat;
pub mod intercept;
pub mod profiles;
pub mod transform;

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::health;
use crate::state::AppState;

/// Build the full application router.
///
/// `/health` and `/metrics` are mounted outside the auth layer so probes
/// and scrapers need no credentials.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/profiles", get(profiles::list))
        .route("/transform", post(transform::transform))
        .route("/intercept", post(intercept::intercept))
        .route("/chat", post(chat::chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .merge(api)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health
async fn health_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<health::HealthResponse> {
    let sessions = state.orchestrator.cancels().len();
    Json(health::health_check(
        state.start_time,
        sessions,
        state.profiles.len(),
    ))
}

/// GET /metrics
async fn metrics_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> String {
    state
        .metrics
        .as_ref()
        .map(crate::metrics::render)
        .unwrap_or_default()
}
