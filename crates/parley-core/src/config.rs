//! Application configuration loaded from `~/.config/parley/config.toml`.
//!
//! ```toml
//! [autoplay]
//! response_delay_secs = 2
//!
//! [generation]
//! max_tokens = 200
//!
//! [[persona]]
//! id = "skeptic"
//! name = "Skeptic"
//! description = "Doubts everything"
//! backend = "openai"
//! system_prompt = "Question every claim."
//! ```

use crate::error::{ParleyError, Result};
use crate::persona::Persona;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ConfigRoot {
    /// Extra or overriding personas, merged into the preset registry by id
    #[serde(rename = "persona", default)]
    pub personas: Vec<Persona>,
    /// Timed continuation settings for external drivers
    #[serde(default)]
    pub autoplay: AutoPlayConfig,
    /// Settings passed to live generation providers
    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Settings for an external driver that advances turns on a timer.
///
/// The coordinator itself has no timers; only drivers read this.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AutoPlayConfig {
    pub enabled: bool,
    /// Seconds to wait before each automatic turn
    pub response_delay_secs: u64,
    /// Stop after this many automatic turns (unbounded when absent)
    pub max_turns: Option<usize>,
    /// Stop after this many generation failures in a row
    pub max_consecutive_failures: usize,
}

impl Default for AutoPlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            response_delay_secs: 3,
            max_turns: None,
            max_consecutive_failures: 3,
        }
    }
}

impl AutoPlayConfig {
    pub fn response_delay(&self) -> Duration {
        Duration::from_secs(self.response_delay_secs)
    }
}

/// Request parameters shared by the live providers.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request timeout; a timeout is reported as a generation failure
    pub timeout_secs: u64,
    /// Probe each configured provider once when selecting the adapter
    pub probe_on_start: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 150,
            temperature: 0.8,
            timeout_secs: 30,
            probe_on_start: true,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigRoot {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Loads `~/.config/parley/config.toml`.
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path()?)
    }
}

/// Returns `~/.config/parley`.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ParleyError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("parley"))
}

/// Returns `~/.config/parley/config.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{PersonaBackend, ResponseStyle};
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigRoot::load_from(&temp_dir.path().join("config.toml")).unwrap();

        assert!(config.personas.is_empty());
        assert_eq!(config.autoplay, AutoPlayConfig::default());
        assert_eq!(config.generation.max_tokens, 150);
    }

    #[test]
    fn parses_personas_and_partial_sections() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[autoplay]
response_delay_secs = 1
max_turns = 10

[generation]
temperature = 0.2

[[persona]]
id = "skeptic"
name = "Skeptic"
description = "Doubts everything"
traits = ["Doubtful"]
response_style = "logical"
backend = "openai"
system_prompt = "Question every claim."
"#,
        )
        .unwrap();

        let config = ConfigRoot::load_from(&path).unwrap();

        assert_eq!(config.autoplay.response_delay_secs, 1);
        assert_eq!(config.autoplay.max_turns, Some(10));
        assert!(config.autoplay.enabled);
        assert_eq!(config.generation.temperature, 0.2);
        assert_eq!(config.generation.max_tokens, 150);

        let skeptic = &config.personas[0];
        assert_eq!(skeptic.backend, PersonaBackend::OpenAi);
        assert_eq!(skeptic.response_style, ResponseStyle::Logical);
    }

    #[test]
    fn invalid_toml_is_a_serialization_error() {
        let err = ConfigRoot::from_toml_str("[autoplay\nenabled = true").unwrap_err();
        assert!(matches!(err, ParleyError::Serialization { .. }));
    }
}
