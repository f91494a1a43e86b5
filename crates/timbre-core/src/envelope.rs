//! The final delivery envelope.
//!
//! Built once per session after generation (and optional style
//! transformation) and sent to the delivery sink at most once. The wire
//! shape matches the streaming client contract: a `final: true` event
//! carrying the conversation, its title, and both messages.

use crate::ids::ConversationId;
use crate::message::{ChatMessage, ResponseMessage};
use serde::{Deserialize, Serialize};

/// Conversation metadata carried in the envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMeta {
    /// Conversation identifier.
    pub conversation_id: ConversationId,
    /// Title, serialized as `null` until the title task has produced one.
    pub title: Option<String>,
}

/// The terminal payload of a delivered session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Always `true`; marks the closing event of the stream.
    /// (`final` is a Rust keyword, hence the explicit wire name.)
    #[serde(rename = "final")]
    pub final_: bool,
    /// Conversation metadata.
    pub conversation: ConversationMeta,
    /// Title duplicated at the top level for the streaming client,
    /// `null` when the conversation has none yet.
    pub title: Option<String>,
    /// The user message that started the exchange.
    pub request_message: ChatMessage,
    /// The (possibly rewritten) assistant reply.
    pub response_message: ResponseMessage,
    /// Whether the style transformation stage rewrote the reply.
    pub transformed: bool,
}

impl ResponseEnvelope {
    /// Build a delivery envelope.
    #[must_use]
    pub fn new(
        conversation: ConversationMeta,
        request_message: ChatMessage,
        response_message: ResponseMessage,
        transformed: bool,
    ) -> Self {
        let title = conversation.title.clone();
        Self {
            final_: true,
            conversation,
            title,
            request_message,
            response_message,
            transformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MessageId;
    use crate::message::ChatMessage;

    #[test]
    fn envelope_serializes_final_flag() {
        let convo = ConversationMeta {
            conversation_id: ConversationId::new("c1"),
            title: Some("New Chat".into()),
        };
        let request = ChatMessage::new(ConversationId::new("c1"), "Student", "hi", true);
        let response = ResponseMessage {
            message_id: MessageId::new("m2"),
            conversation_id: ConversationId::new("c1"),
            parent_message_id: Some(request.message_id.clone()),
            sender: "Assistant".into(),
            text: Some("hello".into()),
            content: None,
        };
        let envelope = ResponseEnvelope::new(convo, request, response, false);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["final"], true);
        assert_eq!(json["title"], "New Chat");
        assert_eq!(json["responseMessage"]["text"], "hello");
        assert_eq!(json["transformed"], false);
    }

    #[test]
    fn untitled_envelope_carries_explicit_null() {
        let convo = ConversationMeta {
            conversation_id: ConversationId::new("c1"),
            title: None,
        };
        let request = ChatMessage::new(ConversationId::new("c1"), "Student", "hi", true);
        let response = ResponseMessage {
            message_id: MessageId::new("m2"),
            conversation_id: ConversationId::new("c1"),
            parent_message_id: None,
            sender: "Assistant".into(),
            text: Some("hello".into()),
            content: None,
        };
        let envelope = ResponseEnvelope::new(convo, request, response, false);
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.as_object().unwrap().contains_key("title"));
        assert_eq!(json["title"], serde_json::Value::Null);
        assert_eq!(json["conversation"]["title"], serde_json::Value::Null);
    }
}
