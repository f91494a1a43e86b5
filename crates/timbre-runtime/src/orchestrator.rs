//! Session orchestrator.
//!
//! Owns the lifecycle of one conversational exchange: acquire a generation
//! client, arm cancellation, call the backend, optionally rewrite the
//! reply through the style stage, deliver the envelope, and tear down.
//! Whatever happens — delivery, abort, or failure — the cleanup registry
//! runs exactly once and the cancellation entry is removed.
//!
//! Phases: `Initializing → AwaitingGeneration → Transforming → Delivering
//! → CleaningUp`, ending in one of [`Outcome`]'s three variants.

use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use timbre_core::envelope::{ConversationMeta, ResponseEnvelope};
use timbre_core::ids::{ConversationId, MessageId, RequestKey};
use timbre_core::message::{ChatMessage, HistoryTurn};
use timbre_core::profile::NEUTRAL_PROFILE_ID;

use crate::cancel::{CancelHandle, CancelRegistry};
use crate::cleanup::CleanupRegistry;
use crate::errors::RuntimeError;
use crate::session::{RequestSession, SessionUpdate};
use crate::traits::{
    DeliverySink, ErrorReport, ErrorReporter, GenerationBackend, GenerationClient,
    GenerationRequest, MessageStore, TitleGenerator,
};
use crate::transform::StyleTransformer;

/// One inbound exchange request.
#[derive(Clone, Debug)]
pub struct ExchangeRequest {
    /// The user's message text.
    pub text: String,
    /// Existing conversation, or `None` to open a new one.
    pub conversation_id: Option<ConversationId>,
    /// Parent message of the user message.
    pub parent_message_id: Option<MessageId>,
    /// Style profile to apply; `None` means the neutral sentinel.
    pub profile_id: Option<String>,
    /// Display name of the user; defaults to `"User"`.
    pub sender: Option<String>,
    /// Skip persisting the user message (regeneration flows).
    pub skip_user_message_save: bool,
}

impl ExchangeRequest {
    /// A minimal request carrying only text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conversation_id: None,
            parent_message_id: None,
            profile_id: None,
            sender: None,
            skip_user_message_save: false,
        }
    }
}

/// Terminal state of one session.
#[derive(Debug)]
pub enum Outcome {
    /// The envelope was emitted to the delivery sink.
    Delivered(Box<ResponseEnvelope>),
    /// The cancellation signal fired before delivery; nothing was emitted.
    Aborted,
    /// A fatal error ended the session; reported, nothing delivered.
    Failed(RuntimeError),
}

impl Outcome {
    /// Short label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Aborted => "aborted",
            Self::Failed(_) => "failed",
        }
    }
}

/// Coordinates one exchange per [`run`](Self::run) call; shared across all
/// sessions.
pub struct SessionOrchestrator {
    backend: Arc<dyn GenerationBackend>,
    transformer: Arc<StyleTransformer>,
    store: Arc<dyn MessageStore>,
    reporter: Arc<dyn ErrorReporter>,
    titles: Option<Arc<dyn TitleGenerator>>,
    cancels: Arc<CancelRegistry>,
    history_limit: usize,
}

impl SessionOrchestrator {
    /// Wire an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        transformer: Arc<StyleTransformer>,
        store: Arc<dyn MessageStore>,
        reporter: Arc<dyn ErrorReporter>,
        titles: Option<Arc<dyn TitleGenerator>>,
        cancels: Arc<CancelRegistry>,
        history_limit: usize,
    ) -> Self {
        Self {
            backend,
            transformer,
            store,
            reporter,
            titles,
            cancels,
            history_limit,
        }
    }

    /// The cancellation registry shared with the transport layer.
    #[must_use]
    pub fn cancels(&self) -> &Arc<CancelRegistry> {
        &self.cancels
    }

    /// Run one exchange to its terminal outcome.
    ///
    /// The caller supplies the request key it will use to signal
    /// cancellation (e.g. from a connection-closed observer).
    #[instrument(skip_all, fields(key = %key))]
    pub async fn run(
        &self,
        key: RequestKey,
        request: ExchangeRequest,
        sink: Arc<dyn DeliverySink>,
    ) -> Outcome {
        gauge!("sessions_active").increment(1.0);

        // ── Initializing ────────────────────────────────────────────────
        let session = Arc::new(Mutex::new(RequestSession::new(key.clone())));
        let new_conversation = request.conversation_id.is_none();
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(ConversationId::generate);
        let user_sender = request.sender.clone().unwrap_or_else(|| "User".to_string());

        let mut user_message = ChatMessage::new(
            conversation_id.clone(),
            user_sender,
            request.text.clone(),
            true,
        );
        user_message.parent_message_id = request.parent_message_id.clone();

        {
            let mut s = session.lock();
            s.new_conversation = new_conversation;
            s.parent_message_id = request.parent_message_id.clone();
            s.apply(SessionUpdate::ConversationId(conversation_id.clone()));
            s.apply(SessionUpdate::UserMessage(user_message.clone()));
        }

        let mut cleanup = CleanupRegistry::new();

        let client = match self.backend.acquire().await {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "failed to acquire generation client");
                let outcome = Outcome::Failed(e);
                self.report_failure(&session, &outcome).await;
                return self.finish(&session, None, &mut cleanup, outcome);
            }
        };
        {
            // Release is idempotent by contract, so registering it blindly
            // here is safe even if a later action also touches the client.
            let client = Arc::clone(&client);
            cleanup.push(Box::new(move || {
                client.dispose();
                Ok(())
            }));
        }

        let context_session = Arc::clone(&session);
        let (handle, on_start) = self.cancels.register(
            &key,
            Box::new(move || context_session.lock().snapshot("")),
        );
        {
            let cancels = Arc::clone(&self.cancels);
            let cleanup_key = key.clone();
            cleanup.push(Box::new(move || {
                cancels.clear(&cleanup_key);
                Ok(())
            }));
        }

        let outcome = self
            .drive(&request, &session, &conversation_id, user_message, client, &handle, on_start, &sink)
            .await;

        self.report_failure(&session, &outcome).await;
        self.finish(&session, Some(&handle), &mut cleanup, outcome)
    }

    /// AwaitingGeneration → Transforming → Delivering.
    #[allow(clippy::too_many_arguments)]
    async fn drive(
        &self,
        request: &ExchangeRequest,
        session: &Arc<Mutex<RequestSession>>,
        conversation_id: &ConversationId,
        user_message: ChatMessage,
        client: Arc<dyn GenerationClient>,
        handle: &Arc<CancelHandle>,
        on_start: crate::cancel::OnStart,
        sink: &Arc<dyn DeliverySink>,
    ) -> Outcome {
        // ── AwaitingGeneration ──────────────────────────────────────────
        on_start();
        let generation = GenerationRequest {
            conversation_id: conversation_id.clone(),
            parent_message_id: Some(user_message.message_id.clone()),
            text: request.text.clone(),
        };
        let reply = tokio::select! {
            () = handle.cancelled() => {
                info!("session aborted during generation");
                return Outcome::Aborted;
            }
            result = client.send_message(generation) => match result {
                Ok(reply) => reply,
                Err(e) => {
                    error!(error = %e, "generation failed");
                    return Outcome::Failed(e);
                }
            },
        };

        {
            let mut s = session.lock();
            for update in reply.updates {
                s.apply(update);
            }
            s.apply(SessionUpdate::ResponseMessageId(
                reply.response.message_id.clone(),
            ));
        }
        let mut response = reply.response;

        // ── Transforming ────────────────────────────────────────────────
        // Best-effort: nothing in this block may fail the session.
        if handle.is_signaled() {
            return Outcome::Aborted;
        }
        let profile_id = request
            .profile_id
            .as_deref()
            .unwrap_or(NEUTRAL_PROFILE_ID);
        let mut transformed = false;
        if let Some(text) = response.reply_text().map(str::to_string) {
            let history = self.history_excerpt(conversation_id).await;
            let outcome = self.transformer.transform(&text, profile_id, &history).await;
            if outcome.applied {
                response.set_reply_text(&outcome.text);
                transformed = true;
            }
        } else {
            debug!("reply carries no text; skipping transformation");
        }

        // ── Delivering ──────────────────────────────────────────────────
        // Re-check immediately before the first observable side effect: a
        // signal seen here suppresses delivery entirely.
        if handle.is_signaled() {
            return Outcome::Aborted;
        }
        let title = match self.store.title(conversation_id).await {
            Ok(title) => title,
            Err(e) => {
                warn!(error = %e, "could not fetch conversation title");
                None
            }
        };
        let envelope = ResponseEnvelope::new(
            ConversationMeta {
                conversation_id: conversation_id.clone(),
                title,
            },
            user_message.clone(),
            response.clone(),
            transformed,
        );
        if let Err(e) = sink.deliver(&envelope).await {
            error!(error = %e, "delivery failed");
            return Outcome::Failed(e);
        }
        counter!("deliveries_total").increment(1);

        // Persisting after a successful emission: failures are logged, not
        // fatal — the caller already has the reply.
        let response_record = ChatMessage {
            message_id: response.message_id.clone(),
            conversation_id: conversation_id.clone(),
            parent_message_id: Some(user_message.message_id.clone()),
            is_created_by_user: false,
            sender: response.sender.clone(),
            text: response.reply_text().unwrap_or_default().to_string(),
            created_at: chrono::Utc::now(),
        };
        if let Err(e) = self.store.save(&response_record, "session end - response").await {
            warn!(error = %e, "failed to save response message");
        }
        if request.skip_user_message_save {
            debug!("user message save skipped by request");
        } else if let Err(e) = self.store.save(&user_message, "session end - user message").await {
            warn!(error = %e, "failed to save user message");
        }

        // Detached title task for the first turn of a new conversation;
        // its settling (success or failure) gates cleanup.
        let run_title = { session.lock().new_conversation };
        if run_title {
            if let Some(titles) = &self.titles {
                let titles = Arc::clone(titles);
                let title_conversation = conversation_id.clone();
                let user_text = request.text.clone();
                let response_text = response.reply_text().unwrap_or_default().to_string();
                let task = tokio::spawn(async move {
                    titles
                        .generate_title(&title_conversation, &user_text, &response_text)
                        .await
                });
                match task.await {
                    Ok(Ok(title)) => {
                        debug!(%title, "conversation title generated");
                        if let Err(e) = self.store.set_title(conversation_id, &title).await {
                            warn!(error = %e, "failed to record conversation title");
                        }
                    }
                    Ok(Err(e)) => error!(error = %e, "title generation failed"),
                    Err(e) => error!(error = %e, "title task panicked"),
                }
            }
        }

        Outcome::Delivered(Box::new(envelope))
    }

    /// Bounded chronological history excerpt; silently empty on store
    /// failure.
    async fn history_excerpt(&self, conversation_id: &ConversationId) -> Vec<HistoryTurn> {
        match self.store.recent(conversation_id, self.history_limit).await {
            Ok(messages) => messages.iter().map(HistoryTurn::from).collect(),
            Err(e) => {
                warn!(error = %e, "could not fetch conversation history");
                Vec::new()
            }
        }
    }

    /// Route a failure to the error reporter. No-op for other outcomes.
    async fn report_failure(&self, session: &Arc<Mutex<RequestSession>>, outcome: &Outcome) {
        if let Outcome::Failed(e) = outcome {
            let report = {
                let s = session.lock();
                let snapshot = s.snapshot("");
                ErrorReport {
                    conversation_id: snapshot.conversation_id,
                    sender: snapshot.sender,
                    response_message_id: snapshot.message_id,
                    parent_message_id: snapshot.parent_message_id,
                    error: e.to_string(),
                }
            };
            self.reporter.report(report).await;
        }
    }

    /// CleaningUp: disarm the handle, run every cleanup action exactly
    /// once, drop the session record, count the outcome.
    fn finish(
        &self,
        session: &Arc<Mutex<RequestSession>>,
        handle: Option<&Arc<CancelHandle>>,
        cleanup: &mut CleanupRegistry,
        outcome: Outcome,
    ) -> Outcome {
        if let Some(handle) = handle {
            handle.mark_completed();
        }
        cleanup.run_all();
        {
            // Drop the user message so the context provider (if a stray
            // reference survives) cannot retain large payloads.
            let mut s = session.lock();
            s.user_message = None;
        }
        gauge!("sessions_active").decrement(1.0);
        counter!("sessions_total", "outcome" => outcome.label()).increment(1);
        info!(outcome = outcome.label(), "session finished");
        outcome
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
