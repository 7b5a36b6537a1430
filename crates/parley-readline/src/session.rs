//! Executes REPL commands against the coordinator.
//!
//! Results are sent as [`Output`] over a channel so long-running generation
//! never blocks the prompt.

use crate::command::ReplCommand;
use parley_core::config::AutoPlayConfig;
use parley_core::conversation::{Message, Slot};
use parley_core::moderation::{ModeratorCommand, command_help};
use parley_core::persona::PersonaRegistry;
use parley_core::{CommandOutcome, ParleyError, TurnCoordinator, TurnOutcome};
use parley_execution::AutoPlayDriver;
use parley_interaction::TopicService;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Something to print.
#[derive(Debug)]
pub enum Output {
    /// A persona spoke
    Turn(Message),
    /// Neutral status line
    Info(String),
    /// Multi-line block printed verbatim
    Block(String),
    Error(String),
}

/// Everything a REPL command needs.
pub struct Session {
    coordinator: Arc<TurnCoordinator>,
    registry: PersonaRegistry,
    topics: TopicService,
    autoplay: AutoPlayConfig,
    auto: Mutex<Option<CancellationToken>>,
    output: mpsc::Sender<Output>,
}

impl Session {
    pub fn new(
        coordinator: Arc<TurnCoordinator>,
        registry: PersonaRegistry,
        topics: TopicService,
        autoplay: AutoPlayConfig,
        output: mpsc::Sender<Output>,
    ) -> Self {
        Self {
            coordinator,
            registry,
            topics,
            autoplay,
            auto: Mutex::new(None),
            output,
        }
    }

    pub fn coordinator(&self) -> &Arc<TurnCoordinator> {
        &self.coordinator
    }

    /// Fills empty persona slots with the first two registry entries.
    pub async fn select_defaults(&self) {
        let snapshot = self.coordinator.snapshot().await;
        for (slot, persona) in Slot::ALL.into_iter().zip(self.registry.all()) {
            if snapshot.persona(slot).is_none() {
                self.coordinator.select_persona(slot, persona.clone()).await;
            }
        }
    }

    pub async fn handle(&self, command: ReplCommand) {
        match command {
            ReplCommand::Help => self.help().await,
            ReplCommand::Personas => self.personas().await,
            ReplCommand::Select { slot, persona_id } => self.select(slot, &persona_id).await,
            ReplCommand::Start(topic) => self.start(topic).await,
            ReplCommand::Topics => {
                let topics = self.topics.suggest(5).await;
                let listing: Vec<_> = topics.iter().map(|t| format!("  - {t}")).collect();
                self.emit(Output::Block(listing.join("\n"))).await;
            }
            ReplCommand::Auto(on) => self.toggle_auto(on).await,
            ReplCommand::Status => self.status().await,
            ReplCommand::Moderator(command) => self.moderate(command).await,
            ReplCommand::Invalid(hint) => self.emit(Output::Info(hint)).await,
            ReplCommand::Quit => {
                self.stop_auto().await;
            }
        }
    }

    async fn help(&self) {
        let mut lines = vec![
            "  /personas               List available personas".to_string(),
            "  /select <1|2> <id>      Choose a persona for a slot".to_string(),
            "  /start [topic]          Start a debate (random topic when omitted)".to_string(),
            "  /topics                 Suggest a few topics".to_string(),
            "  /next                   Let the next persona respond".to_string(),
            "  /auto [on|off]          Advance turns automatically".to_string(),
            "  /status                 Show the conversation state".to_string(),
        ];
        lines.extend(
            command_help()
                .iter()
                .map(|h| format!("  /{:<22} {}", h.usage.replace("changeTopic", "topic"), h.description)),
        );
        lines.push("  /quit                   Exit".to_string());
        self.emit(Output::Block(lines.join("\n"))).await;
    }

    async fn personas(&self) {
        let snapshot = self.coordinator.snapshot().await;
        let lines: Vec<_> = self
            .registry
            .all()
            .iter()
            .map(|p| {
                let marker = Slot::ALL
                    .into_iter()
                    .find(|slot| snapshot.persona(*slot).is_some_and(|s| s.id == p.id))
                    .map(|slot| format!("[{}]", slot.index() + 1))
                    .unwrap_or_else(|| "   ".to_string());
                format!("{marker} {:<10} {:<16} {} ({})", p.id, p.name, p.description, p.backend)
            })
            .collect();
        self.emit(Output::Block(lines.join("\n"))).await;
    }

    async fn select(&self, slot: Slot, persona_id: &str) {
        let persona = match self.registry.require(persona_id) {
            Ok(persona) => persona,
            Err(err) => return self.report(err).await,
        };
        let name = persona.name.clone();
        if self.coordinator.select_persona(slot, persona).await {
            self.emit(Output::Info(format!("Slot {} is now {name}", slot.index() + 1)))
                .await;
        } else {
            self.emit(Output::Info(
                "Personas are locked while a conversation runs (/end or /new first)".to_string(),
            ))
            .await;
        }
    }

    async fn start(&self, topic: Option<String>) {
        let topic = match topic {
            Some(topic) => topic,
            None => self.topics.random_topic().await,
        };
        let snapshot = self.coordinator.snapshot().await;
        let (Some(first), Some(second)) = (
            snapshot.persona(Slot::First).cloned(),
            snapshot.persona(Slot::Second).cloned(),
        ) else {
            return self
                .emit(Output::Info("Select two personas first (/select)".to_string()))
                .await;
        };

        self.stop_auto().await;
        self.emit(Output::Info(format!(
            "Topic: {topic} ({} vs {})",
            first.name, second.name
        )))
        .await;
        match self.coordinator.start_conversation(&topic, first, second).await {
            Ok(outcome) => self.turn(outcome).await,
            Err(err) => self.report(err).await,
        }
    }

    async fn moderate(&self, command: ModeratorCommand) {
        if matches!(command, ModeratorCommand::End | ModeratorCommand::New) {
            self.stop_auto().await;
        }
        match self.coordinator.dispatch(command).await {
            Ok(CommandOutcome::Status { status, changed }) => {
                let line = if changed {
                    format!("Conversation is now {status:?}")
                } else {
                    format!("Nothing to do (conversation is {status:?})")
                };
                self.emit(Output::Info(line)).await;
            }
            Ok(CommandOutcome::Turn(outcome)) => self.turn(outcome).await,
            Ok(CommandOutcome::Exported(export)) => match export.to_json() {
                Ok(json) => self.emit(Output::Block(json)).await,
                Err(err) => self.report(err).await,
            },
            Ok(CommandOutcome::Skipped(reason)) => {
                self.emit(Output::Info(format!("Skipped: {reason}"))).await;
            }
            Ok(CommandOutcome::Ignored) => {
                self.emit(Output::Info("Command ignored".to_string())).await;
            }
            Err(err) => self.report(err).await,
        }
    }

    async fn status(&self) {
        let snapshot = self.coordinator.snapshot().await;
        let names: Vec<_> = Slot::ALL
            .into_iter()
            .map(|slot| snapshot.persona(slot).map_or("-", |p| p.name.as_str()))
            .collect();
        let auto = if self.auto.lock().await.is_some() { "on" } else { "off" };
        let line = format!(
            "{:?} | topic: {} | {} vs {} | messages: {} | next: {} | pending: {} | auto: {auto} | generator: {}",
            snapshot.status(),
            if snapshot.topic().is_empty() { "-" } else { snapshot.topic() },
            names[0],
            names[1],
            snapshot.messages().len(),
            snapshot
                .next_responder()
                .and_then(|slot| snapshot.persona(slot))
                .map_or("-", |p| p.name.as_str()),
            snapshot.is_pending(),
            self.coordinator.generator_name(),
        );
        self.emit(Output::Info(line)).await;
    }

    async fn toggle_auto(&self, on: bool) {
        if !on {
            let stopped = self.stop_auto().await;
            let line = if stopped { "Auto-play off" } else { "Auto-play was not running" };
            return self.emit(Output::Info(line.to_string())).await;
        }

        let mut auto = self.auto.lock().await;
        if auto.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return self
                .emit(Output::Info("Auto-play is already running".to_string()))
                .await;
        }

        let (messages_tx, mut messages_rx) = mpsc::channel(16);
        let config = AutoPlayConfig {
            enabled: true,
            ..self.autoplay.clone()
        };
        let driver = AutoPlayDriver::new(self.coordinator.clone(), config)
            .with_message_sink(messages_tx);
        let token = driver.cancellation_token();
        *auto = Some(token.clone());
        drop(auto);

        let output = self.output.clone();
        tokio::spawn(async move {
            while let Some(message) = messages_rx.recv().await {
                let _ = output.send(Output::Turn(message)).await;
            }
        });

        let output = self.output.clone();
        let handle = driver.spawn();
        tokio::spawn(async move {
            let line = match handle.await {
                Ok(report) => format!(
                    "Auto-play stopped after {} turn(s): {:?}",
                    report.turns, report.stop_reason
                ),
                Err(err) => format!("Auto-play task failed: {err}"),
            };
            token.cancel();
            let _ = output.send(Output::Info(line)).await;
        });

        self.emit(Output::Info(format!(
            "Auto-play on (every {}s)",
            self.autoplay.response_delay_secs
        )))
        .await;
    }

    /// Cancels a running driver. Returns whether one was running.
    async fn stop_auto(&self) -> bool {
        match self.auto.lock().await.take() {
            Some(token) => {
                let running = !token.is_cancelled();
                token.cancel();
                running
            }
            None => false,
        }
    }

    async fn turn(&self, outcome: TurnOutcome) {
        match outcome {
            TurnOutcome::Spoke(message) => self.emit(Output::Turn(message)).await,
            TurnOutcome::Skipped(reason) => {
                self.emit(Output::Info(format!("Skipped: {reason}"))).await;
            }
            TurnOutcome::Discarded { .. } => {
                self.emit(Output::Info("Reply discarded (conversation was reset)".to_string()))
                    .await;
            }
        }
    }

    async fn report(&self, err: ParleyError) {
        let line = if err.is_retryable() {
            format!("{err} (run the command again to retry)")
        } else {
            err.to_string()
        };
        self.emit(Output::Error(line)).await;
    }

    async fn emit(&self, output: Output) {
        // The printer only goes away at shutdown
        let _ = self.output.send(output).await;
    }
}
