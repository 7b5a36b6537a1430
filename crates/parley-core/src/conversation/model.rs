//! Conversation aggregate.
//!
//! The conversation is exclusively owned and mutated by the turn coordinator.
//! Everything else sees it through a cloned snapshot.

use super::message::Message;
use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two participant positions in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Slot 0: opens the conversation, answers refocus and summary requests
    First,
    /// Slot 1: answers clarification requests
    Second,
}

impl Slot {
    /// Both slots in speaking order.
    pub const ALL: [Slot; 2] = [Slot::First, Slot::Second];

    /// Array index of this slot.
    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }

    /// The opposite slot.
    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }

    /// Parses a slot from its index.
    pub fn from_index(index: usize) -> Option<Slot> {
        match index {
            0 => Some(Slot::First),
            1 => Some(Slot::Second),
            _ => None,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Lifecycle status of a conversation.
///
/// `Idle → Active → {Paused ⇄ Active} → Ended`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// No topic submitted yet, or reset by a new conversation.
    #[default]
    Idle,
    /// Turns are being taken.
    Active,
    /// The moderator paused the exchange.
    Paused,
    /// The moderator ended the exchange.
    Ended,
}

impl ConversationStatus {
    /// Whether a topic has been submitted and the conversation not yet ended.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// The aggregate the turn coordinator mutates.
///
/// Invariants:
/// - while running, both persona slots hold distinct personas
/// - `next_responder` is `Some` while active or paused, `None` otherwise
/// - `messages` only grows, except when a new conversation or topic resets it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Current topic (empty while idle)
    pub topic: String,
    /// Messages in chronological order
    pub messages: Vec<Message>,
    /// Participating personas by slot
    pub personas: [Option<Persona>; 2],
    /// Lifecycle status
    pub status: ConversationStatus,
    /// Slot that must produce the next turn
    pub next_responder: Option<Slot>,
}

impl Conversation {
    /// Creates an idle conversation with no persona selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the persona in `slot`, if selected.
    pub fn persona(&self, slot: Slot) -> Option<&Persona> {
        self.personas[slot.index()].as_ref()
    }

    /// Returns the most recent message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Finds the slot whose persona authored `persona_id`.
    pub fn slot_of(&self, persona_id: &str) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| self.persona(*slot).is_some_and(|p| p.id == persona_id))
    }

    /// Clears messages and topic and returns to idle. Persona selection is kept.
    pub(crate) fn reset(&mut self) {
        self.topic.clear();
        self.messages.clear();
        self.status = ConversationStatus::Idle;
        self.next_responder = None;
    }

    /// Starts over on `topic` with the given personas.
    pub(crate) fn begin(&mut self, topic: String, first: Persona, second: Persona) {
        self.topic = topic;
        self.messages.clear();
        self.personas = [Some(first), Some(second)];
        self.status = ConversationStatus::Active;
        self.next_responder = Some(Slot::First);
    }

    /// Appends `message` and hands the turn to `next` while still running.
    pub(crate) fn record_turn(&mut self, message: Message, next: Slot) {
        self.messages.push(message);
        if self.status.is_running() {
            self.next_responder = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::get_default_presets;

    fn two_personas() -> (Persona, Persona) {
        let presets = get_default_presets();
        (presets[0].clone(), presets[4].clone())
    }

    #[test]
    fn slots_alternate() {
        assert_eq!(Slot::First.other(), Slot::Second);
        assert_eq!(Slot::Second.other(), Slot::First);
        assert_eq!(Slot::from_index(1), Some(Slot::Second));
        assert_eq!(Slot::from_index(2), None);
        assert_eq!(Slot::Second.to_string(), "1");
    }

    #[test]
    fn begin_activates_with_first_slot_due() {
        let (a, b) = two_personas();
        let mut conversation = Conversation::new();
        conversation.begin("Tabs or spaces?".into(), a.clone(), b.clone());

        assert_eq!(conversation.status, ConversationStatus::Active);
        assert_eq!(conversation.next_responder, Some(Slot::First));
        assert_eq!(conversation.slot_of(&a.id), Some(Slot::First));
        assert_eq!(conversation.slot_of(&b.id), Some(Slot::Second));
    }

    #[test]
    fn reset_keeps_persona_selection() {
        let (a, b) = two_personas();
        let mut conversation = Conversation::new();
        conversation.begin("Topic".into(), a, b);
        conversation.record_turn(Message::new("scholar", "hi"), Slot::Second);

        conversation.reset();

        assert!(conversation.messages.is_empty());
        assert!(conversation.topic.is_empty());
        assert_eq!(conversation.status, ConversationStatus::Idle);
        assert_eq!(conversation.next_responder, None);
        assert!(conversation.persona(Slot::First).is_some());
    }

    #[test]
    fn record_turn_does_not_schedule_after_end() {
        let (a, b) = two_personas();
        let mut conversation = Conversation::new();
        conversation.begin("Topic".into(), a, b);
        conversation.status = ConversationStatus::Ended;
        conversation.next_responder = None;

        conversation.record_turn(Message::new("scholar", "late"), Slot::Second);

        assert_eq!(conversation.next_responder, None);
    }
}
