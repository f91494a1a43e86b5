//! Collaborator seams.
//!
//! Everything outside the orchestration core — the generation backend, the
//! streaming client channel, persistence, error reporting, title synthesis
//! — is consumed through these narrow traits. The server crate provides
//! the real implementations; tests provide stubs.

use std::sync::Arc;

use async_trait::async_trait;
use timbre_core::envelope::ResponseEnvelope;
use timbre_core::ids::{ConversationId, MessageId};
use timbre_core::message::{ChatMessage, ResponseMessage};

use crate::errors::RuntimeError;
use crate::session::SessionUpdate;

/// What the backend asks for when generating a reply.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Conversation the reply belongs to.
    pub conversation_id: ConversationId,
    /// The user message being answered.
    pub parent_message_id: Option<MessageId>,
    /// User text.
    pub text: String,
}

/// A finished generation: the reply plus session updates the backend
/// learned along the way (response id, sender, token counts).
#[derive(Clone, Debug)]
pub struct GenerationReply {
    /// The assistant's reply.
    pub response: ResponseMessage,
    /// Updates for the session record, applied by the orchestrator.
    pub updates: Vec<SessionUpdate>,
}

/// One acquired generation client, exclusively owned by one session.
///
/// `dispose` must be idempotent; the cleanup registry may call it after an
/// error path already has.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a reply. May suspend for an unbounded duration; the
    /// orchestrator races it against the cancellation signal.
    async fn send_message(&self, request: GenerationRequest)
        -> Result<GenerationReply, RuntimeError>;

    /// Release per-client resources. Idempotent.
    fn dispose(&self);
}

/// Factory for generation clients.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Acquire a client for one session.
    async fn acquire(&self) -> Result<Arc<dyn GenerationClient>, RuntimeError>;
}

/// Streams the final envelope to the caller. At most one delivery per
/// session.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Emit the terminal envelope.
    async fn deliver(&self, envelope: &ResponseEnvelope) -> Result<(), RuntimeError>;
}

/// External message persistence.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Save one message. `context` names the call site for diagnostics.
    async fn save(&self, message: &ChatMessage, context: &str) -> Result<(), RuntimeError>;

    /// The most recent `limit` messages of a conversation, chronological
    /// order.
    async fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RuntimeError>;

    /// Record a conversation title. Stores without title support may keep
    /// the default no-op.
    async fn set_title(
        &self,
        _conversation_id: &ConversationId,
        _title: &str,
    ) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// The stored title of a conversation, if any.
    async fn title(
        &self,
        _conversation_id: &ConversationId,
    ) -> Result<Option<String>, RuntimeError> {
        Ok(None)
    }
}

/// Failure report routed to the caller-visible error path.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    /// Conversation id, if assigned.
    pub conversation_id: Option<ConversationId>,
    /// Responder display name, if known.
    pub sender: Option<String>,
    /// Response message id, if assigned.
    pub response_message_id: Option<MessageId>,
    /// Parent message id, if known.
    pub parent_message_id: Option<MessageId>,
    /// Human-readable failure description.
    pub error: String,
}

/// Error-reporting collaborator for failed sessions.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Report a session failure. Infallible by contract: reporters log
    /// their own troubles.
    async fn report(&self, report: ErrorReport);
}

/// Conversation title synthesis, run as a detached side task after the
/// first delivered turn of a new conversation.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    /// Produce (and persist, if the implementation wants to) a title.
    async fn generate_title(
        &self,
        conversation_id: &ConversationId,
        user_text: &str,
        response_text: &str,
    ) -> anyhow::Result<String>;
}
