//! Moderator commands.
//!
//! A moderator issues a closed set of commands against the running
//! conversation. On the wire they arrive as [`ModeratorAction`]
//! (`{"type": "changeTopic", "payload": "..."}`) and are parsed into a typed
//! [`ModeratorCommand`]. Kinds the core does not know parse to `None` so
//! newer front ends can send them without breaking older cores.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;
use strum::{Display, EnumString};

/// Command kinds understood by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    Pause,
    Resume,
    #[strum(serialize = "continue", serialize = "advance", to_string = "continue")]
    Continue,
    Refocus,
    ChangeTopic,
    Summarize,
    Clarify,
    Export,
    #[strum(serialize = "end", serialize = "endConversation", to_string = "end")]
    End,
    #[strum(
        serialize = "new",
        serialize = "startNewConversation",
        to_string = "new"
    )]
    New,
}

impl CommandKind {
    /// Whether the command needs a non-empty payload.
    pub fn takes_payload(self) -> bool {
        matches!(self, Self::ChangeTopic | Self::Clarify)
    }
}

/// A typed moderator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorCommand {
    Pause,
    Resume,
    Continue,
    Refocus,
    ChangeTopic(String),
    Summarize,
    Clarify(String),
    Export,
    End,
    New,
}

impl ModeratorCommand {
    /// Builds a command from its kind and optional payload.
    ///
    /// Payload-less kinds ignore `payload`; payload kinds keep it as given
    /// (an empty payload is rejected later, at dispatch).
    pub fn from_kind(kind: CommandKind, payload: Option<&str>) -> Self {
        let payload = payload.unwrap_or_default().to_string();
        match kind {
            CommandKind::Pause => Self::Pause,
            CommandKind::Resume => Self::Resume,
            CommandKind::Continue => Self::Continue,
            CommandKind::Refocus => Self::Refocus,
            CommandKind::ChangeTopic => Self::ChangeTopic(payload),
            CommandKind::Summarize => Self::Summarize,
            CommandKind::Clarify => Self::Clarify(payload),
            CommandKind::Export => Self::Export,
            CommandKind::End => Self::End,
            CommandKind::New => Self::New,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Pause => CommandKind::Pause,
            Self::Resume => CommandKind::Resume,
            Self::Continue => CommandKind::Continue,
            Self::Refocus => CommandKind::Refocus,
            Self::ChangeTopic(_) => CommandKind::ChangeTopic,
            Self::Summarize => CommandKind::Summarize,
            Self::Clarify(_) => CommandKind::Clarify,
            Self::Export => CommandKind::Export,
            Self::End => CommandKind::End,
            Self::New => CommandKind::New,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::ChangeTopic(payload) | Self::Clarify(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Wire form of a moderator command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl ModeratorAction {
    pub fn new(kind: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Parses into a typed command, or `None` for an unknown kind.
    pub fn parse(&self) -> Option<ModeratorCommand> {
        let kind = CommandKind::from_str(self.kind.trim()).ok()?;
        Some(ModeratorCommand::from_kind(kind, self.payload.as_deref()))
    }
}

impl From<&ModeratorCommand> for ModeratorAction {
    fn from(command: &ModeratorCommand) -> Self {
        Self::new(
            command.kind().to_string(),
            command.payload().map(str::to_string),
        )
    }
}

/// Help entry for a moderator command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandHelp {
    pub kind: CommandKind,
    /// Usage format (e.g., "changeTopic <topic>")
    pub usage: &'static str,
    pub description: &'static str,
}

impl CommandHelp {
    const fn new(kind: CommandKind, usage: &'static str, description: &'static str) -> Self {
        Self {
            kind,
            usage,
            description,
        }
    }
}

static COMMAND_HELP: OnceLock<Vec<CommandHelp>> = OnceLock::new();

/// Help for every command kind, in display order.
pub fn command_help() -> &'static [CommandHelp] {
    COMMAND_HELP.get_or_init(|| {
        vec![
            CommandHelp::new(CommandKind::Pause, "pause", "Pause an active conversation"),
            CommandHelp::new(CommandKind::Resume, "resume", "Resume a paused conversation"),
            CommandHelp::new(
                CommandKind::Continue,
                "continue",
                "Let the next persona respond",
            ),
            CommandHelp::new(
                CommandKind::Refocus,
                "refocus",
                "Ask the first persona to steer back to the topic",
            ),
            CommandHelp::new(
                CommandKind::ChangeTopic,
                "changeTopic <topic>",
                "Restart the debate on a new topic with the same personas",
            ),
            CommandHelp::new(
                CommandKind::Summarize,
                "summarize",
                "Ask the first persona for a structured recap",
            ),
            CommandHelp::new(
                CommandKind::Clarify,
                "clarify <question>",
                "Ask the second persona to answer a question",
            ),
            CommandHelp::new(CommandKind::Export, "export", "Export the transcript as JSON"),
            CommandHelp::new(
                CommandKind::End,
                "end",
                "End the conversation and keep the transcript",
            ),
            CommandHelp::new(
                CommandKind::New,
                "new",
                "Clear the conversation and keep the persona selection",
            ),
        ]
    })
}
