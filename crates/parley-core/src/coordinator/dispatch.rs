//! Moderator command dispatch.

use super::outcome::{CommandOutcome, TurnOutcome};
use super::turn::TurnCoordinator;
use crate::error::{Result, SkipReason};
use crate::export::ConversationExport;
use crate::moderation::{ModeratorAction, ModeratorCommand};
use chrono::Utc;
use tracing::debug;

impl TurnCoordinator {
    /// Runs a moderator command against the conversation.
    ///
    /// Unmet preconditions come back as [`CommandOutcome::Skipped`] or a
    /// skipped [`TurnOutcome`]; only generation failures are errors.
    pub async fn dispatch(&self, command: ModeratorCommand) -> Result<CommandOutcome> {
        debug!(target: "parley::coordinator", kind = %command.kind(), "dispatching command");
        let outcome = match command {
            ModeratorCommand::Pause => {
                let changed = self.pause().await;
                self.status_outcome(changed).await
            }
            ModeratorCommand::Resume => {
                let changed = self.resume().await;
                self.status_outcome(changed).await
            }
            ModeratorCommand::End => {
                let changed = self.end_conversation().await;
                self.status_outcome(changed).await
            }
            ModeratorCommand::New => {
                self.start_new_conversation().await;
                self.status_outcome(true).await
            }
            ModeratorCommand::Continue => Self::turn_outcome(self.advance_turn().await?),
            ModeratorCommand::Refocus => Self::turn_outcome(self.refocus().await?),
            ModeratorCommand::Summarize => Self::turn_outcome(self.summarize().await?),
            ModeratorCommand::ChangeTopic(topic) => {
                Self::turn_outcome(self.change_topic(&topic).await?)
            }
            ModeratorCommand::Clarify(question) => {
                Self::turn_outcome(self.clarify(&question).await?)
            }
            ModeratorCommand::Export => match self.export().await {
                Some(export) => CommandOutcome::Exported(export),
                None => CommandOutcome::Skipped(SkipReason::NoMessages),
            },
        };
        Ok(outcome)
    }

    /// Parses and dispatches a wire action; unknown kinds are ignored.
    pub async fn dispatch_action(&self, action: &ModeratorAction) -> Result<CommandOutcome> {
        match action.parse() {
            Some(command) => self.dispatch(command).await,
            None => {
                debug!(target: "parley::coordinator", kind = %action.kind, "ignoring unknown command");
                Ok(CommandOutcome::Ignored)
            }
        }
    }

    /// Exports the transcript, or `None` when there are no messages.
    pub async fn export(&self) -> Option<ConversationExport> {
        let snapshot = self.snapshot().await;
        ConversationExport::from_snapshot(&snapshot, Utc::now())
    }

    async fn status_outcome(&self, changed: bool) -> CommandOutcome {
        CommandOutcome::Status {
            status: self.snapshot().await.status(),
            changed,
        }
    }

    fn turn_outcome(outcome: TurnOutcome) -> CommandOutcome {
        match outcome {
            TurnOutcome::Skipped(reason) => CommandOutcome::Skipped(reason),
            other => CommandOutcome::Turn(other),
        }
    }
}
