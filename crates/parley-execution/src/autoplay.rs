//! Timed automatic continuation.
//!
//! The coordinator has no timers of its own. [`AutoPlayDriver`] is the
//! external scheduler that waits between turns and calls
//! [`TurnCoordinator::advance_turn`] only when the conversation is active and
//! no request is in flight.

use parley_core::config::AutoPlayConfig;
use parley_core::conversation::{ConversationStatus, Message};
use parley_core::{SkipReason, TurnCoordinator, TurnOutcome};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TARGET: &str = "parley::autoplay";

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// `enabled = false` in the configuration
    Disabled,
    /// The cancellation token fired
    Cancelled,
    /// `max_turns` automatic turns were produced
    MaxTurns,
    /// `max_consecutive_failures` generation failures in a row
    TooManyFailures,
    /// The conversation is idle or ended
    NotRunning(ConversationStatus),
    /// The opening message never arrived; only a restart can recover
    NoOpening,
}

/// Summary of one driver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoPlayReport {
    /// Messages produced by the driver
    pub turns: usize,
    /// Generation failures seen, in total
    pub failures: usize,
    pub stop_reason: StopReason,
}

/// Advances a conversation on a timer until told to stop.
pub struct AutoPlayDriver {
    coordinator: Arc<TurnCoordinator>,
    config: AutoPlayConfig,
    cancel: CancellationToken,
    messages: Option<mpsc::Sender<Message>>,
}

impl AutoPlayDriver {
    pub fn new(coordinator: Arc<TurnCoordinator>, config: AutoPlayConfig) -> Self {
        Self {
            coordinator,
            config,
            cancel: CancellationToken::new(),
            messages: None,
        }
    }

    /// Uses an existing token instead of a fresh one.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Forwards each produced message to `sender`.
    pub fn with_message_sink(mut self, sender: mpsc::Sender<Message>) -> Self {
        self.messages = Some(sender);
        self
    }

    /// A handle that stops the driver when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the driver on its own task.
    pub fn spawn(self) -> JoinHandle<AutoPlayReport> {
        tokio::spawn(self.run())
    }

    /// Runs until a stop condition is met.
    ///
    /// Cancellation is observed between turns; an in-flight request always
    /// completes so the coordinator's pending flag is cleared.
    pub async fn run(self) -> AutoPlayReport {
        let mut turns = 0;
        let mut failures = 0;
        let mut consecutive_failures: usize = 0;
        let failure_limit = self.config.max_consecutive_failures.max(1);

        let stop = |turns: usize, failures: usize, stop_reason: StopReason| {
            info!(target: TARGET, turns, failures, ?stop_reason, "auto-play stopped");
            AutoPlayReport {
                turns,
                failures,
                stop_reason,
            }
        };

        if !self.config.enabled {
            return stop(0, 0, StopReason::Disabled);
        }
        info!(
            target: TARGET,
            delay_secs = self.config.response_delay_secs,
            max_turns = ?self.config.max_turns,
            "auto-play started"
        );

        loop {
            if self.config.max_turns.is_some_and(|max| turns >= max) {
                return stop(turns, failures, StopReason::MaxTurns);
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return stop(turns, failures, StopReason::Cancelled);
                }
                _ = tokio::time::sleep(self.config.response_delay()) => {}
            }

            let snapshot = self.coordinator.snapshot().await;
            match snapshot.status() {
                ConversationStatus::Active => {}
                ConversationStatus::Paused => {
                    debug!(target: TARGET, "conversation paused; waiting");
                    continue;
                }
                status @ (ConversationStatus::Idle | ConversationStatus::Ended) => {
                    return stop(turns, failures, StopReason::NotRunning(status));
                }
            }
            if snapshot.is_pending() {
                debug!(target: TARGET, "request in flight; waiting");
                continue;
            }

            match self.coordinator.advance_turn().await {
                Ok(TurnOutcome::Spoke(message)) => {
                    turns += 1;
                    consecutive_failures = 0;
                    if let Some(sender) = &self.messages {
                        if sender.send(message).await.is_err() {
                            debug!(target: TARGET, "message sink closed");
                        }
                    }
                }
                Ok(TurnOutcome::Skipped(SkipReason::NoMessages)) => {
                    warn!(target: TARGET, "conversation has no opening message");
                    return stop(turns, failures, StopReason::NoOpening);
                }
                Ok(outcome) => {
                    debug!(target: TARGET, ?outcome, "turn not produced");
                }
                Err(err) => {
                    failures += 1;
                    consecutive_failures += 1;
                    warn!(
                        target: TARGET,
                        error = %err,
                        consecutive_failures,
                        "automatic turn failed"
                    );
                    if consecutive_failures >= failure_limit {
                        return stop(turns, failures, StopReason::TooManyFailures);
                    }
                }
            }
        }
    }
}
