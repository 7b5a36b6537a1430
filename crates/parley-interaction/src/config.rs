//! Provider credentials.
//!
//! Secrets are read from `~/.config/parley/secret.json`:
//!
//! ```json
//! {
//!   "openai": { "api_key": "sk-...", "model_name": "gpt-4o-mini" },
//!   "gemini": { "api_key": "AIza..." }
//! }
//! ```
//!
//! Any provider missing from the file is taken from the environment
//! (`OPENAI_API_KEY`/`OPENAI_MODEL_NAME`, `GEMINI_API_KEY`/`GEMINI_MODEL_NAME`).

use parley_core::config::config_dir;
use parley_core::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Root structure of `secret.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<ProviderSecret>,
    #[serde(default)]
    pub gemini: Option<ProviderSecret>,
}

/// Credentials for one hosted provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl ProviderSecret {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: None,
        }
    }

    /// The configured model, or `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model_name.as_deref().unwrap_or(default)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>, key: &str, model: &str) -> Option<Self> {
        let api_key = lookup(key).filter(|value| !value.trim().is_empty())?;
        Some(Self {
            api_key,
            model_name: lookup(model).filter(|value| !value.trim().is_empty()),
        })
    }
}

impl SecretConfig {
    /// Loads `~/.config/parley/secret.json`, then fills gaps from the environment.
    pub fn load() -> Result<Self> {
        let from_file = Self::load_from(&secret_path()?)?;
        Ok(from_file.or_else_from(|key| env::var(key).ok()))
    }

    /// Loads secrets from `path`. A missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ParleyError::config(format!(
                "Failed to read secret file at {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ParleyError::config(format!(
                "Failed to parse secret file at {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config.without_blank_keys())
    }

    /// Fills providers missing from `self` using `lookup` (an environment reader).
    pub fn or_else_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.openai.is_none() {
            self.openai = ProviderSecret::from_lookup(&lookup, "OPENAI_API_KEY", "OPENAI_MODEL_NAME");
        }
        if self.gemini.is_none() {
            self.gemini = ProviderSecret::from_lookup(&lookup, "GEMINI_API_KEY", "GEMINI_MODEL_NAME");
        }
        self
    }

    /// Whether no provider is configured.
    pub fn is_empty(&self) -> bool {
        self.openai.is_none() && self.gemini.is_none()
    }

    fn without_blank_keys(mut self) -> Self {
        let blank = |secret: &Option<ProviderSecret>| {
            secret
                .as_ref()
                .is_some_and(|s| s.api_key.trim().is_empty())
        };
        if blank(&self.openai) {
            self.openai = None;
        }
        if blank(&self.gemini) {
            self.gemini = None;
        }
        self
    }
}

/// Returns `~/.config/parley/secret.json`.
pub fn secret_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("secret.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let config = SecretConfig::load_from(&temp_dir.path().join("secret.json")).unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn file_wins_over_environment() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(
            &path,
            r#"{"openai": {"api_key": "sk-file", "model_name": "gpt-4o"}}"#,
        )
        .unwrap();

        let config = SecretConfig::load_from(&path)
            .unwrap()
            .or_else_from(lookup(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("GEMINI_API_KEY", "gm-env"),
            ]));

        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-file");
        assert_eq!(openai.model_or(DEFAULT_OPENAI_MODEL), "gpt-4o");

        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.api_key, "gm-env");
        assert_eq!(gemini.model_or(DEFAULT_GEMINI_MODEL), DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn blank_keys_count_as_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, r#"{"gemini": {"api_key": "  "}}"#).unwrap();

        let config = SecretConfig::load_from(&path)
            .unwrap()
            .or_else_from(lookup(&[("OPENAI_API_KEY", "")]));

        assert!(config.is_empty());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        fs::write(&path, "{not json").unwrap();

        let err = SecretConfig::load_from(&path).unwrap_err();
        assert!(err.is_config());
    }
}
