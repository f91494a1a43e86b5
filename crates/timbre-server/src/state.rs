//! Shared state accessible from Axum handlers.

use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;
use timbre_runtime::{MessageStore, ProfileStore, SessionOrchestrator, StyleTransformer};
use timbre_settings::TimbreSettings;

/// Everything a route handler may need, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The session orchestrator (also owns the cancellation registry).
    pub orchestrator: Arc<SessionOrchestrator>,
    /// The style transformation stage, used directly by `/transform` and
    /// `/intercept`.
    pub transformer: Arc<StyleTransformer>,
    /// Message persistence.
    pub store: Arc<dyn MessageStore>,
    /// Read-only profile set.
    pub profiles: Arc<ProfileStore>,
    /// Resolved settings.
    pub settings: Arc<TimbreSettings>,
    /// Prometheus render handle; `None` when the exporter is not installed
    /// (tests).
    pub metrics: Option<PrometheusHandle>,
    /// When the server started.
    pub start_time: Instant,
}
