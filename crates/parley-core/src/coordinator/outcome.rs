//! Results of coordinator operations.

use crate::conversation::{ConversationStatus, Message};
use crate::error::{ParleyError, Result, SkipReason};
use crate::export::ConversationExport;

/// What a turn-producing operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A message was appended.
    Spoke(Message),
    /// Preconditions were not met; nothing changed.
    Skipped(SkipReason),
    /// The reply arrived after the conversation was reset and was dropped.
    Discarded { issued_epoch: u64, current_epoch: u64 },
}

impl TurnOutcome {
    /// The appended message, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Spoke(message) => Some(message),
            _ => None,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Spoke(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_spoke(&self) -> bool {
        matches!(self, Self::Spoke(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Folds silent errors into outcomes; everything else stays an error.
    pub(crate) fn settle(result: Result<Message>) -> Result<Self> {
        match result {
            Ok(message) => Ok(Self::Spoke(message)),
            Err(ParleyError::PreconditionNotMet(reason)) => Ok(Self::Skipped(reason)),
            Err(ParleyError::StaleResponse {
                issued_epoch,
                current_epoch,
            }) => Ok(Self::Discarded {
                issued_epoch,
                current_epoch,
            }),
            Err(err) => Err(err),
        }
    }
}

/// What a dispatched moderator command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// A lifecycle command ran; `changed` is false when it was a no-op.
    Status {
        status: ConversationStatus,
        changed: bool,
    },
    /// A turn-producing command ran.
    Turn(TurnOutcome),
    /// The conversation was exported.
    Exported(ConversationExport),
    /// The command's preconditions were not met.
    Skipped(SkipReason),
    /// The command kind is not understood by the coordinator.
    Ignored,
}
