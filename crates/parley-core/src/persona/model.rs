//! Persona domain model.
//!
//! Represents the AI personas that debate each other. Each persona has a
//! behavioral tone, a target generation backend and a natural-language
//! instruction describing how it should respond.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Generation services a persona can target.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonaBackend {
    /// OpenAI Chat Completions API
    #[serde(rename = "openai")]
    #[strum(serialize = "openai", to_string = "openai")]
    OpenAi,
    /// Google Gemini API
    Gemini,
}

/// Tone/style category of a persona.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseStyle {
    /// Factual and balanced
    #[default]
    Informative,
    /// Imaginative, makes unexpected connections
    Creative,
    /// Structured argumentation
    Logical,
    /// Playful and sharp
    Sarcastic,
    /// Focused on feelings and human impact
    Empathetic,
}

/// An immutable profile driving one side of a debate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Unique identifier
    pub id: String,
    /// Display name of the persona
    pub name: String,
    /// Short description shown when choosing debaters
    pub description: String,
    /// Character traits, most prominent first
    #[serde(default)]
    pub traits: Vec<String>,
    /// Behavioral tone
    #[serde(default)]
    pub response_style: ResponseStyle,
    /// Generation service this persona targets
    pub backend: PersonaBackend,
    /// Instruction describing how this persona should respond
    pub system_prompt: String,
}

impl Persona {
    /// Most prominent trait, lowercased, if any.
    pub fn leading_trait(&self) -> Option<String> {
        self.traits.first().map(|t| t.to_lowercase())
    }
}
