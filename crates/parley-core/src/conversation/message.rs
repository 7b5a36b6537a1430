//! Conversation message type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One utterance in a conversation.
///
/// Messages are immutable once created. Their position in the owning
/// conversation is their chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier (UUID format)
    pub id: String,
    /// ID of the persona that authored this message
    pub persona_id: String,
    /// Text content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message authored by `persona_id`, stamped now.
    pub fn new(persona_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            persona_id: persona_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this message was authored by the given persona.
    pub fn is_from(&self, persona_id: &str) -> bool {
        self.persona_id == persona_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_messages_get_unique_ids() {
        let a = Message::new("scholar", "First");
        let b = Message::new("scholar", "First");
        assert_ne!(a.id, b.id);
        assert!(a.is_from("scholar"));
        assert!(!a.is_from("wit"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let message = Message::new("wit", "Hello");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["personaId"], "wit");
        assert!(json["timestamp"].is_string());
    }
}
