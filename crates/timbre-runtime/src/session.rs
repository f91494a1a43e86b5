//! Per-request session record.
//!
//! Created at request start, mutated only through [`SessionUpdate`] (a
//! closed set of tagged operations — unknown fields are unrepresentable),
//! and dropped when the session's cleanup runs. The record is shared as
//! `Arc<Mutex<RequestSession>>` between the orchestrator task and the
//! abort-context provider; nothing else holds it.

use crate::cancel::AbortSnapshot;
use timbre_core::ids::{ConversationId, MessageId, RequestKey};
use timbre_core::message::ChatMessage;

/// Mutable state of one in-flight exchange.
#[derive(Debug)]
pub struct RequestSession {
    /// Key scoping this request in the cancellation registry.
    pub request_key: RequestKey,
    /// Conversation id; assigned lazily for new conversations.
    pub conversation_id: Option<ConversationId>,
    /// Parent of the user message.
    pub parent_message_id: Option<MessageId>,
    /// Id of the reply being generated.
    pub response_message_id: Option<MessageId>,
    /// Responder display name.
    pub sender: Option<String>,
    /// The user message that started this exchange.
    pub user_message: Option<ChatMessage>,
    /// Prompt token count reported by the backend.
    pub prompt_tokens: Option<u32>,
    /// Whether this exchange opens a brand-new conversation.
    pub new_conversation: bool,
}

impl RequestSession {
    /// Create a fresh session for a request key.
    #[must_use]
    pub fn new(request_key: RequestKey) -> Self {
        Self {
            request_key,
            conversation_id: None,
            parent_message_id: None,
            response_message_id: None,
            sender: None,
            user_message: None,
            prompt_tokens: None,
            new_conversation: false,
        }
    }

    /// Apply one tagged update.
    ///
    /// `ConversationId` is first-write-wins: a backend echo never
    /// overwrites an id the request already carried.
    pub fn apply(&mut self, update: SessionUpdate) {
        match update {
            SessionUpdate::UserMessage(msg) => self.user_message = Some(msg),
            SessionUpdate::ResponseMessageId(id) => self.response_message_id = Some(id),
            SessionUpdate::PromptTokens(count) => self.prompt_tokens = Some(count),
            SessionUpdate::Sender(sender) => self.sender = Some(sender),
            SessionUpdate::ConversationId(id) => {
                if self.conversation_id.is_none() {
                    self.conversation_id = Some(id);
                }
            }
        }
    }

    /// Abort-report snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self, accumulated_content: &str) -> AbortSnapshot {
        AbortSnapshot {
            sender: self.sender.clone(),
            content: accumulated_content.to_string(),
            prompt_tokens: self.prompt_tokens,
            conversation_id: self.conversation_id.clone(),
            message_id: self.response_message_id.clone(),
            parent_message_id: self
                .user_message
                .as_ref()
                .map(|m| m.message_id.clone())
                .or_else(|| self.parent_message_id.clone()),
        }
    }
}

/// The closed set of session updates.
#[derive(Clone, Debug)]
pub enum SessionUpdate {
    /// The user message as persisted.
    UserMessage(ChatMessage),
    /// The id assigned to the reply.
    ResponseMessageId(MessageId),
    /// Prompt token count.
    PromptTokens(u32),
    /// Responder display name.
    Sender(String),
    /// Conversation id (first write wins).
    ConversationId(ConversationId),
}
