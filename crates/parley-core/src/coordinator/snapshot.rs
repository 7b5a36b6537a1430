//! Read-only view of coordinator state.

use crate::conversation::{Conversation, ConversationStatus, Message, Slot};
use crate::persona::Persona;
use serde::{Deserialize, Serialize};

/// The single outstanding generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    /// Slot whose turn is being generated
    pub slot: Slot,
    /// Epoch the request was issued in
    pub epoch: u64,
}

/// A cloned copy of the conversation plus coordination state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub conversation: Conversation,
    pub pending: Option<PendingRequest>,
    pub epoch: u64,
}

impl ConversationSnapshot {
    pub fn status(&self) -> ConversationStatus {
        self.conversation.status
    }

    pub fn topic(&self) -> &str {
        &self.conversation.topic
    }

    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    pub fn next_responder(&self) -> Option<Slot> {
        self.conversation.next_responder
    }

    pub fn persona(&self, slot: Slot) -> Option<&Persona> {
        self.conversation.persona(slot)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Display name of the author of `message`, falling back to its persona id.
    pub fn speaker_name<'a>(&'a self, message: &'a Message) -> &'a str {
        self.conversation
            .slot_of(&message.persona_id)
            .and_then(|slot| self.persona(slot))
            .map(|p| p.name.as_str())
            .unwrap_or(message.persona_id.as_str())
    }
}
