//! Execution support for parley sessions.
//!
//! # Module Structure
//!
//! - `autoplay`: Timed continuation driver (`AutoPlayDriver`)
//! - `telemetry`: Global tracing subscriber setup
//! - `tracing_layer`: Forwards conversation events to a channel

pub mod autoplay;
pub mod telemetry;
pub mod tracing_layer;

// Re-export public API
pub use autoplay::{AutoPlayDriver, AutoPlayReport, StopReason};
pub use telemetry::{init_tracing, init_tracing_with};
pub use tracing_layer::{ConversationEvent, ConversationEventLayer};
