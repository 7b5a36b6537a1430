//! Error types for the Parley application.

use crate::conversation::Slot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a coordinator operation declined to run.
///
/// These never reach the caller as errors: the coordinator folds them into
/// [`crate::coordinator::TurnOutcome::Skipped`] so the UI can treat them as no-ops.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "slot")]
pub enum SkipReason {
    /// No conversation has been started.
    #[error("no conversation is running")]
    NotStarted,
    /// The conversation is paused.
    #[error("conversation is paused")]
    Paused,
    /// The conversation has ended.
    #[error("conversation has ended")]
    Ended,
    /// A generation request is already in flight.
    #[error("a generation request is already pending")]
    RequestPending,
    /// The operation needs at least one message.
    #[error("conversation has no messages yet")]
    NoMessages,
    /// No slot is due to speak.
    #[error("no responder is scheduled")]
    NoResponder,
    /// The persona slot the operation targets is empty.
    #[error("persona slot {0} is not selected")]
    MissingPersona(Slot),
    /// The command payload was empty.
    #[error("command payload is empty")]
    EmptyPayload,
}

/// A shared error type for the entire Parley application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ParleyError {
    /// Persona selection or topic is unusable for starting a conversation
    #[error("Invalid setup: {reason}")]
    InvalidSetup { reason: String },

    /// The generation capability failed or timed out
    #[error("Generation failed ({provider}): {message}")]
    Generation {
        provider: String,
        message: String,
        status_code: Option<u16>,
        is_retryable: bool,
    },

    /// A command was issued against state that does not satisfy its precondition
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(SkipReason),

    /// A completion arrived for a conversation that has since been reset
    #[error("Stale response discarded (issued in epoch {issued_epoch}, current epoch {current_epoch})")]
    StaleResponse {
        issued_epoch: u64,
        current_epoch: u64,
    },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidSetup error
    pub fn invalid_setup(reason: impl Into<String>) -> Self {
        Self::InvalidSetup {
            reason: reason.into(),
        }
    }

    /// Creates a non-retryable Generation error
    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
            is_retryable: false,
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidSetup error
    pub fn is_invalid_setup(&self) -> bool {
        matches!(self, Self::InvalidSetup { .. })
    }

    /// Check if this is a Generation error
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether the caller may reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Generation {
                is_retryable: true,
                ..
            }
        )
    }

    /// Errors that the coordinator swallows instead of surfacing.
    ///
    /// Returns true for `PreconditionNotMet` and `StaleResponse`.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::PreconditionNotMet(_) | Self::StaleResponse { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<SkipReason> for ParleyError {
    fn from(reason: SkipReason) -> Self {
        Self::PreconditionNotMet(reason)
    }
}

impl From<std::io::Error> for ParleyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ParleyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ParleyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at binary edges)
impl From<anyhow::Error> for ParleyError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ParleyError>`.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_errors_are_preconditions_and_stale_responses() {
        assert!(ParleyError::from(SkipReason::RequestPending).is_silent());
        assert!(
            ParleyError::StaleResponse {
                issued_epoch: 1,
                current_epoch: 2
            }
            .is_silent()
        );
        assert!(!ParleyError::generation("openai", "boom").is_silent());
        assert!(!ParleyError::invalid_setup("same persona twice").is_silent());
    }

    #[test]
    fn retryable_only_for_flagged_generation_failures() {
        let transient = ParleyError::Generation {
            provider: "gemini".into(),
            message: "rate limited".into(),
            status_code: Some(429),
            is_retryable: true,
        };
        assert!(transient.is_retryable());
        assert!(!ParleyError::generation("gemini", "bad key").is_retryable());
        assert!(!ParleyError::config("missing").is_retryable());
    }

    #[test]
    fn display_includes_skip_reason() {
        let err = ParleyError::from(SkipReason::MissingPersona(Slot::Second));
        assert_eq!(
            err.to_string(),
            "Precondition not met: persona slot 1 is not selected"
        );
    }

    #[test]
    fn toml_errors_convert_to_serialization() {
        let err: ParleyError = toml::from_str::<toml::Value>("= nope").unwrap_err().into();
        assert!(matches!(err, ParleyError::Serialization { ref format, .. } if format == "TOML"));
    }
}
