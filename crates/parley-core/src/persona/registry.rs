//! Persona registry.
//!
//! Static catalog of persona profiles, built once at process start.

use super::model::Persona;
use super::preset::get_default_presets;
use crate::error::{ParleyError, Result};

/// Lookup table of personas, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in presets.
    pub fn with_presets() -> Self {
        Self {
            personas: get_default_presets(),
        }
    }

    /// Adds personas, replacing any existing entry with the same id.
    pub fn extend(&mut self, personas: impl IntoIterator<Item = Persona>) {
        for persona in personas {
            match self.personas.iter_mut().find(|p| p.id == persona.id) {
                Some(existing) => *existing = persona,
                None => self.personas.push(persona),
            }
        }
    }

    /// Looks up a persona by id.
    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Looks up a persona by id, failing with `NotFound`.
    pub fn require(&self, id: &str) -> Result<Persona> {
        self.get(id)
            .cloned()
            .ok_or_else(|| ParleyError::not_found("persona", id))
    }

    /// All personas in catalog order.
    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
