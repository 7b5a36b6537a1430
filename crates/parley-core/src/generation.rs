//! Response generation contract.
//!
//! The coordinator talks to every text-generation capability (live hosted
//! models and the deterministic fallback) through [`ResponseGenerator`].
//! Implementations perform a single logical call: no retries, no fallback.

use crate::error::Result;
use crate::persona::Persona;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who said a history entry, relative to the persona about to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The persona about to speak
    #[serde(rename = "self")]
    Own,
    /// The other participant
    Other,
}

/// One entry of the projected conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// A moderator intervention the request was synthesized for.
///
/// Live providers only see the rendered instruction text; the fallback
/// generator matches on this to pick canned replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Steer the discussion back to the topic
    Refocus,
    /// Produce a structured recap of the history
    Summarize,
    /// Answer a moderator question
    Clarify { question: String },
}

impl Directive {
    /// Whether the directive only makes sense once something has been said.
    pub fn needs_history(&self) -> bool {
        matches!(self, Self::Refocus | Self::Summarize)
    }

    /// Whether the directive may still run on an ended conversation.
    ///
    /// An ended conversation keeps its transcript until a new one starts, so
    /// it can still be recapped.
    pub fn runs_after_end(&self) -> bool {
        matches!(self, Self::Summarize)
    }
}

/// Everything a generator needs to produce one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Current debate topic
    pub topic: String,
    /// Chronological history from the speaker's point of view
    pub history: Vec<HistoryEntry>,
    /// The persona that will speak
    pub persona: Persona,
    /// False only for the opening move
    pub is_response: bool,
    /// What the speaker is replying to: the last message, or a synthesized
    /// moderator instruction
    pub previous_message: Option<String>,
    /// Set when the request carries a moderator intervention
    pub directive: Option<Directive>,
}

impl GenerationRequest {
    /// The persona's behavioral instruction.
    pub fn persona_instruction(&self) -> &str {
        &self.persona.system_prompt
    }

    /// The text the speaker is asked to respond to, when this is a response.
    pub fn reply_target(&self) -> Option<&str> {
        if self.is_response {
            self.previous_message.as_deref()
        } else {
            None
        }
    }
}

/// A text-generation capability.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Short identifier used in logs and errors (e.g. "openai", "fallback").
    fn name(&self) -> &str;

    /// Produces one reply for `request`.
    ///
    /// Fails with [`crate::ParleyError::Generation`] when the capability
    /// cannot answer, including timeouts.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Checks that the capability is configured and reachable.
    async fn probe(&self) -> Result<()> {
        Ok(())
    }
}
