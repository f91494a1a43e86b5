//! `TimbreServer` — wires settings into collaborators and serves the
//! router.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use timbre_llm::{Generator, OpenAiConfig, OpenAiGenerator};
use timbre_runtime::{
    CancelRegistry, ComposerOptions, ErrorReporter, GenerationBackend, MessageStore, ProfileStore,
    SessionOrchestrator, StyleTransformer, TitleGenerator, TransformOptions,
};
use timbre_settings::TimbreSettings;
use tracing::info;

use crate::backend::GeneratorBackend;
use crate::reporting::{LlmTitleGenerator, TracingErrorReporter};
use crate::routes;
use crate::shutdown::ShutdownCoordinator;
use crate::state::AppState;
use crate::store::InMemoryMessageStore;

/// The assembled server.
pub struct TimbreServer {
    state: AppState,
    shutdown: Arc<ShutdownCoordinator>,
}

impl TimbreServer {
    /// Wire every collaborator from resolved settings.
    pub fn from_settings(
        settings: TimbreSettings,
        metrics: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let settings = Arc::new(settings);

        let profiles = match &settings.profiles.path {
            Some(path) => ProfileStore::load_from_path(Path::new(path))
                .with_context(|| format!("loading profiles from {path}"))?,
            None => ProfileStore::builtin(),
        };
        let profiles = Arc::new(profiles);
        info!(profiles = profiles.len(), "profile store ready");

        let generator: Arc<dyn Generator> = Arc::new(OpenAiGenerator::new(OpenAiConfig {
            base_url: settings.generator.base_url.clone(),
            api_key: settings.generator.api_key.clone(),
            model: settings.generator.model.clone(),
            temperature: settings.transform.temperature,
            max_tokens: Some(settings.transform.max_tokens),
        }));

        let transformer = Arc::new(StyleTransformer::new(
            Arc::clone(&profiles),
            Arc::clone(&generator),
            TransformOptions {
                model: Some(settings.transform.model.clone()),
                temperature: settings.transform.temperature,
                max_tokens: settings.transform.max_tokens,
                composer: ComposerOptions {
                    context_label: settings.transform.context_label.clone(),
                    user_label: settings.transform.user_label.clone(),
                    assistant_label: settings.transform.assistant_label.clone(),
                },
            },
        ));

        let store: Arc<dyn MessageStore> = Arc::new(InMemoryMessageStore::new());
        let backend: Arc<dyn GenerationBackend> = Arc::new(GeneratorBackend::new(
            Arc::clone(&generator),
            settings.transform.assistant_label.clone(),
        ));
        let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingErrorReporter);
        let titles: Arc<dyn TitleGenerator> = Arc::new(LlmTitleGenerator::new(
            Arc::clone(&generator),
            Some(settings.generator.model.clone()),
        ));
        let cancels = Arc::new(CancelRegistry::new());

        let orchestrator = Arc::new(SessionOrchestrator::new(
            backend,
            Arc::clone(&transformer),
            Arc::clone(&store),
            reporter,
            Some(titles),
            cancels,
            settings.transform.history_limit,
        ));

        let state = AppState {
            orchestrator,
            transformer,
            store,
            profiles,
            settings,
            metrics,
            start_time: Instant::now(),
        };

        Ok(Self {
            state,
            shutdown: Arc::new(ShutdownCoordinator::new()),
        })
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Shared handler state (tests).
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The shutdown coordinator.
    #[must_use]
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!(
            "{}:{}",
            self.state.settings.server.host, self.state.settings.server.port
        );
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        info!(addr = %listener.local_addr()?, "listening");

        let shutdown = Arc::clone(&self.shutdown);
        let token = shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    () = token.cancelled() => {}
                    () = shutdown_signal() => shutdown.shutdown(),
                }
            })
            .await
            .context("server error")
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                let _ = sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
