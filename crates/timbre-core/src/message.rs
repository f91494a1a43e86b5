//! Conversation message types.
//!
//! [`ChatMessage`] is the persisted shape; [`HistoryTurn`] is the trimmed
//! excerpt the prompt composer consumes. Response text can live either in a
//! flat `text` field or as the first block of a `content` sequence, so
//! [`ResponseMessage`] keeps both and resolves them through one accessor.

use crate::ids::{ConversationId, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored conversation message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message identifier.
    pub message_id: MessageId,
    /// Conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// Parent message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
    /// Whether the end user authored this message.
    pub is_created_by_user: bool,
    /// Display name of the author.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Convenience constructor stamped with the current time.
    #[must_use]
    pub fn new(
        conversation_id: ConversationId,
        sender: impl Into<String>,
        text: impl Into<String>,
        is_created_by_user: bool,
    ) -> Self {
        Self {
            message_id: MessageId::generate(),
            conversation_id,
            parent_message_id: None,
            is_created_by_user,
            sender: sender.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// One turn of a conversation-history excerpt, chronological order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryTurn {
    /// Whether the user spoke this turn (false: the assistant).
    pub from_user: bool,
    /// Turn text, inserted verbatim into the composed prompt.
    pub text: String,
}

impl HistoryTurn {
    /// A user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            from_user: true,
            text: text.into(),
        }
    }

    /// An assistant turn.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            from_user: false,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for HistoryTurn {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            from_user: msg.is_created_by_user,
            text: msg.text.clone(),
        }
    }
}

/// A text content block inside a structured response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block type tag (currently always `"text"`).
    #[serde(rename = "type")]
    pub block_type: String,
    /// Block text.
    pub text: String,
}

impl ContentBlock {
    /// A plain text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            block_type: "text".into(),
            text: text.into(),
        }
    }
}

/// The assistant's reply as produced by the generation backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    /// Message identifier.
    pub message_id: MessageId,
    /// Conversation this reply belongs to.
    pub conversation_id: ConversationId,
    /// The user message this reply answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
    /// Display name of the responder.
    pub sender: String,
    /// Flat reply text, when the backend produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Structured content blocks, when the backend produced them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,
}

impl ResponseMessage {
    /// The reply text: the flat `text` field, or the first content block.
    #[must_use]
    pub fn reply_text(&self) -> Option<&str> {
        if let Some(text) = self.text.as_deref() {
            return Some(text);
        }
        self.content
            .as_deref()
            .and_then(<[ContentBlock]>::first)
            .map(|b| b.text.as_str())
    }

    /// Overwrite the reply text in whichever representations are present.
    pub fn set_reply_text(&mut self, new_text: &str) {
        if self.text.is_some() {
            self.text = Some(new_text.to_string());
        }
        if let Some(first) = self.content.as_mut().and_then(|c| c.first_mut()) {
            first.text = new_text.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: Option<&str>, content: Option<Vec<ContentBlock>>) -> ResponseMessage {
        ResponseMessage {
            message_id: MessageId::new("m1"),
            conversation_id: ConversationId::new("c1"),
            parent_message_id: None,
            sender: "Assistant".into(),
            text: text.map(String::from),
            content,
        }
    }

    #[test]
    fn reply_text_prefers_flat_field() {
        let r = response(Some("flat"), Some(vec![ContentBlock::text("block")]));
        assert_eq!(r.reply_text(), Some("flat"));
    }

    #[test]
    fn reply_text_falls_back_to_first_block() {
        let r = response(None, Some(vec![ContentBlock::text("block")]));
        assert_eq!(r.reply_text(), Some("block"));
    }

    #[test]
    fn reply_text_none_when_empty() {
        assert!(response(None, None).reply_text().is_none());
        assert!(response(None, Some(vec![])).reply_text().is_none());
    }

    #[test]
    fn set_reply_text_updates_both_representations() {
        let mut r = response(Some("old"), Some(vec![ContentBlock::text("old")]));
        r.set_reply_text("new");
        assert_eq!(r.text.as_deref(), Some("new"));
        assert_eq!(r.content.unwrap()[0].text, "new");
    }

    #[test]
    fn history_turn_from_message() {
        let msg = ChatMessage::new(ConversationId::new("c1"), "Student", "hi", true);
        let turn = HistoryTurn::from(&msg);
        assert!(turn.from_user);
        assert_eq!(turn.text, "hi");
    }
}
