//! In-memory message persistence.
//!
//! Conversations are vectors in arrival order behind one `RwLock`; good
//! enough for the deployment this server targets, and the trait keeps a
//! real store swappable.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use timbre_core::ids::ConversationId;
use timbre_core::message::ChatMessage;
use timbre_runtime::{MessageStore, RuntimeError};
use tracing::debug;

/// Per-conversation message log held in process memory.
#[derive(Default)]
pub struct InMemoryMessageStore {
    conversations: RwLock<HashMap<ConversationId, Vec<ChatMessage>>>,
    titles: RwLock<HashMap<ConversationId, String>>,
}

impl InMemoryMessageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored message count across all conversations.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.conversations.read().values().map(Vec::len).sum()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn save(&self, message: &ChatMessage, context: &str) -> Result<(), RuntimeError> {
        let mut conversations = self.conversations.write();
        conversations
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());
        debug!(
            conversation_id = %message.conversation_id,
            message_id = %message.message_id,
            context,
            "message saved"
        );
        Ok(())
    }

    async fn recent(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RuntimeError> {
        let conversations = self.conversations.read();
        let messages = conversations
            .get(conversation_id)
            .map(|m| {
                let start = m.len().saturating_sub(limit);
                m[start..].to_vec()
            })
            .unwrap_or_default();
        Ok(messages)
    }

    async fn set_title(
        &self,
        conversation_id: &ConversationId,
        title: &str,
    ) -> Result<(), RuntimeError> {
        let _ = self
            .titles
            .write()
            .insert(conversation_id.clone(), title.to_string());
        debug!(conversation_id = %conversation_id, title, "conversation title recorded");
        Ok(())
    }

    async fn title(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<String>, RuntimeError> {
        Ok(self.titles.read().get(conversation_id).cloned())
    }
}
