//! Branded ID newtypes.
//!
//! Conversation, message, and request-key identifiers are all UUID strings
//! on the wire. Newtypes keep them from being swapped at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Wrap an existing identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

branded_id!(
    /// Identifies one conversation across exchanges.
    ConversationId
);

branded_id!(
    /// Identifies one message within a conversation.
    MessageId
);

branded_id!(
    /// Opaque key scoping one in-flight request; used by the cancellation
    /// registry to look up the session's cancel handle.
    RequestKey
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_unique() {
        assert_ne!(ConversationId::generate(), ConversationId::generate());
    }

    #[test]
    fn round_trips_through_serde() {
        let id = MessageId::new("msg-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"msg-1\"");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_matches_inner() {
        let key = RequestKey::new("abc");
        assert_eq!(key.to_string(), "abc");
        assert_eq!(key.as_str(), "abc");
    }
}
