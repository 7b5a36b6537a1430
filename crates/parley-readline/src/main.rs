mod command;
mod session;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use command::{REPL_COMMANDS, ReplCommand};
use parley_core::TurnCoordinator;
use parley_core::config::ConfigRoot;
use parley_core::persona::PersonaRegistry;
use parley_execution::telemetry::{DEFAULT_FILTER, init_tracing};
use parley_interaction::{AdapterMode, GenerationAdapter, SecretConfig, TopicService};
use session::{Output, Session};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: REPL_COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Prints session output until every sender is dropped.
async fn print_outputs(coordinator: Arc<TurnCoordinator>, mut rx: mpsc::Receiver<Output>) {
    while let Some(output) = rx.recv().await {
        match output {
            Output::Turn(message) => {
                let snapshot = coordinator.snapshot().await;
                let speaker = snapshot.speaker_name(&message).to_string();
                println!("{}", format!("[{speaker}]").bright_magenta());
                for line in message.content.lines() {
                    println!("{}", line.bright_blue());
                }
                println!();
            }
            Output::Info(line) => println!("{}", line.bright_black()),
            Output::Block(block) => println!("{block}"),
            Output::Error(line) => eprintln!("{}", format!("Error: {line}").red()),
        }
    }
}

/// Interactive moderator console for a two-persona debate.
///
/// Loads `config.toml` and `secret.json`, selects live or fallback
/// generation once, then reads commands until `quit` or EOF. Generation runs
/// on background tasks; output is printed by a dedicated task.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_FILTER, false)?;

    // ===== Backend Initialization =====
    let config = ConfigRoot::load()?;
    let mut registry = PersonaRegistry::with_presets();
    registry.extend(config.personas.clone());

    let secrets = SecretConfig::load()?;
    let adapter = GenerationAdapter::select(&secrets, &config.generation).await?;
    let mode = adapter.mode();
    let topics = TopicService::from_secrets(&secrets, &config.generation)?;
    let coordinator = Arc::new(TurnCoordinator::new(Arc::new(adapter)));

    let (output_tx, output_rx) = mpsc::channel::<Output>(64);
    let printer = tokio::spawn(print_outputs(coordinator.clone(), output_rx));

    let session = Arc::new(Session::new(
        coordinator,
        registry,
        topics,
        config.autoplay.clone(),
        output_tx,
    ));
    session.select_defaults().await;

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Parley ===".bright_magenta().bold());
    match mode {
        AdapterMode::Live => println!("{}", "Live generation enabled.".bright_green()),
        AdapterMode::Fallback => println!(
            "{}",
            "No provider reachable; using canned replies.".yellow()
        ),
    }
    println!(
        "{}",
        "Type a topic to start, '/help' for commands, or 'quit' to exit.".bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = ReplCommand::parse(trimmed);
                if command == ReplCommand::Quit {
                    session.handle(command).await;
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                let session = Arc::clone(&session);
                tokio::spawn(async move { session.handle(command).await });
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                session.handle(ReplCommand::Quit).await;
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    // Dropping the session closes the output channel once in-flight commands finish
    drop(session);
    let _ = printer.await;

    Ok(())
}
