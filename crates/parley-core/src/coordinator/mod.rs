//! Turn coordination.
//!
//! # Module Structure
//!
//! - `turn`: The state machine (`TurnCoordinator`)
//! - `dispatch`: Moderator command dispatch onto coordinator operations
//! - `outcome`: Results of coordinator operations (`TurnOutcome`, `CommandOutcome`)
//! - `snapshot`: Read-only view for presentation layers (`ConversationSnapshot`)

mod dispatch;
mod outcome;
mod snapshot;
mod turn;

// Re-export public API
pub use outcome::{CommandOutcome, TurnOutcome};
pub use snapshot::{ConversationSnapshot, PendingRequest};
pub use turn::TurnCoordinator;
