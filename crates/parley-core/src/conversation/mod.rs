//! Conversation domain module.
//!
//! This module contains the aggregate the turn coordinator mutates and the
//! message type it appends.
//!
//! # Module Structure
//!
//! - `message`: A single immutable utterance (`Message`)
//! - `model`: The conversation aggregate (`Conversation`, `ConversationStatus`, `Slot`)

mod message;
mod model;

// Re-export public API
pub use message::Message;
pub use model::{Conversation, ConversationStatus, Slot};
