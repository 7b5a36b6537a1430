//! Persona domain module.
//!
//! This module contains the persona profiles that drive each side of a debate,
//! the built-in presets and the lookup registry.
//!
//! # Module Structure
//!
//! - `model`: Core persona domain models (`Persona`, `ResponseStyle`, `PersonaBackend`)
//! - `preset`: Default system personas
//! - `registry`: Lookup by id (`PersonaRegistry`)
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::persona::{Persona, PersonaRegistry, get_default_presets};
//! ```

mod model;
mod preset;
mod registry;

// Re-export public API
pub use model::{Persona, PersonaBackend, ResponseStyle};
pub use preset::get_default_presets;
pub use registry::PersonaRegistry;
