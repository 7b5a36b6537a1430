//! REPL input parsing.

use parley_core::conversation::Slot;
use parley_core::moderation::{CommandKind, ModeratorCommand};
use std::str::FromStr;

/// Slash commands shown by completion and hints, in help order.
pub const REPL_COMMANDS: &[&str] = &[
    "/help",
    "/personas",
    "/select",
    "/start",
    "/topics",
    "/next",
    "/pause",
    "/resume",
    "/refocus",
    "/summarize",
    "/clarify",
    "/topic",
    "/export",
    "/end",
    "/new",
    "/auto",
    "/status",
    "/quit",
];

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Personas,
    /// `/select <1|2> <persona-id>`
    Select { slot: Slot, persona_id: String },
    /// `/start [topic]`; plain text is also a topic
    Start(Option<String>),
    Topics,
    /// `/auto [on|off]`; a bare `/auto` turns it on
    Auto(bool),
    Status,
    Moderator(ModeratorCommand),
    Quit,
    /// Anything else, with a hint for the user
    Invalid(String),
}

impl ReplCommand {
    /// Parses a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return match line {
                "quit" | "exit" => Self::Quit,
                topic => Self::Start(Some(topic.to_string())),
            };
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        match name {
            "help" | "?" => Self::Help,
            "personas" => Self::Personas,
            "select" => parse_select(arg),
            "start" => Self::Start(arg.map(str::to_string)),
            "topics" => Self::Topics,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            "auto" => match arg {
                None | Some("on") => Self::Auto(true),
                Some("off") => Self::Auto(false),
                Some(other) => Self::Invalid(format!("expected on|off, got '{other}'")),
            },
            "next" => Self::Moderator(ModeratorCommand::Continue),
            "topic" => Self::Moderator(ModeratorCommand::from_kind(CommandKind::ChangeTopic, arg)),
            other => match CommandKind::from_str(other) {
                Ok(kind) => Self::Moderator(ModeratorCommand::from_kind(kind, arg)),
                Err(_) => Self::Invalid(format!("unknown command '/{other}' (try /help)")),
            },
        }
    }
}

fn parse_select(arg: Option<&str>) -> ReplCommand {
    let usage = || ReplCommand::Invalid("usage: /select <1|2> <persona-id>".to_string());
    let Some((slot, persona_id)) = arg.and_then(|a| a.split_once(char::is_whitespace)) else {
        return usage();
    };
    let slot = slot
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(Slot::from_index);
    match slot {
        Some(slot) => ReplCommand::Select {
            slot,
            persona_id: persona_id.trim().to_string(),
        },
        None => usage(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_starts_a_topic() {
        assert_eq!(
            ReplCommand::parse("Is remote work here to stay?"),
            ReplCommand::Start(Some("Is remote work here to stay?".to_string()))
        );
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Quit);
    }

    #[test]
    fn moderator_commands_keep_their_payload() {
        assert_eq!(
            ReplCommand::parse("/clarify  What about cost? "),
            ReplCommand::Moderator(ModeratorCommand::Clarify("What about cost?".to_string()))
        );
        assert_eq!(
            ReplCommand::parse("/topic Space travel"),
            ReplCommand::Moderator(ModeratorCommand::ChangeTopic("Space travel".to_string()))
        );
        assert_eq!(
            ReplCommand::parse("/next"),
            ReplCommand::Moderator(ModeratorCommand::Continue)
        );
        assert_eq!(
            ReplCommand::parse("/summarize"),
            ReplCommand::Moderator(ModeratorCommand::Summarize)
        );
    }

    #[test]
    fn clarify_without_question_has_empty_payload() {
        assert_eq!(
            ReplCommand::parse("/clarify"),
            ReplCommand::Moderator(ModeratorCommand::Clarify(String::new()))
        );
    }

    #[test]
    fn select_parses_one_based_slots() {
        assert_eq!(
            ReplCommand::parse("/select 2 wit"),
            ReplCommand::Select {
                slot: Slot::Second,
                persona_id: "wit".to_string()
            }
        );
        assert!(matches!(ReplCommand::parse("/select 3 wit"), ReplCommand::Invalid(_)));
        assert!(matches!(ReplCommand::parse("/select wit"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn auto_toggles() {
        assert_eq!(ReplCommand::parse("/auto"), ReplCommand::Auto(true));
        assert_eq!(ReplCommand::parse("/auto off"), ReplCommand::Auto(false));
        assert!(matches!(ReplCommand::parse("/auto maybe"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn unknown_commands_are_invalid() {
        assert!(matches!(ReplCommand::parse("/plan"), ReplCommand::Invalid(_)));
    }
}
