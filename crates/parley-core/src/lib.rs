pub mod config;
pub mod context;
pub mod conversation;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod generation;
pub mod moderation;
pub mod persona;
pub mod topic;

// Re-export common types
pub use coordinator::{CommandOutcome, ConversationSnapshot, TurnCoordinator, TurnOutcome};
pub use error::{ParleyError, Result, SkipReason};
pub use generation::{GenerationRequest, ResponseGenerator};
