//! The turn coordinator state machine.
//!
//! Every turn-producing operation follows the same three steps:
//!
//! 1. Under the lock, check preconditions, mark the request pending and
//!    capture the current epoch together with the assembled request.
//! 2. Release the lock and await the generator.
//! 3. Re-acquire the lock; if the epoch moved on, drop the reply, otherwise
//!    clear the pending flag and apply the reply (or surface the failure).
//!
//! At most one request is pending at a time. Resets bump the epoch, which is
//! how an in-flight request is "cancelled".

use super::outcome::TurnOutcome;
use super::snapshot::{ConversationSnapshot, PendingRequest};
use crate::context;
use crate::conversation::{Conversation, ConversationStatus, Message, Slot};
use crate::error::{ParleyError, Result, SkipReason};
use crate::generation::{Directive, GenerationRequest, ResponseGenerator};
use crate::persona::Persona;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const TARGET: &str = "parley::coordinator";

#[derive(Debug, Default)]
struct CoordinatorState {
    conversation: Conversation,
    epoch: u64,
    pending: Option<PendingRequest>,
}

/// A request that has been issued and is waiting for its reply.
struct Ticket {
    epoch: u64,
    speaker: Slot,
    persona_id: String,
    next: Slot,
    request: GenerationRequest,
}

impl CoordinatorState {
    fn ensure_not_pending(&self) -> std::result::Result<(), SkipReason> {
        match self.pending {
            Some(_) => Err(SkipReason::RequestPending),
            None => Ok(()),
        }
    }

    fn ensure_running(&self) -> std::result::Result<(), SkipReason> {
        match self.conversation.status {
            ConversationStatus::Idle => Err(SkipReason::NotStarted),
            ConversationStatus::Ended => Err(SkipReason::Ended),
            ConversationStatus::Active | ConversationStatus::Paused => Ok(()),
        }
    }

    fn ensure_active(&self) -> std::result::Result<(), SkipReason> {
        self.ensure_running()?;
        if self.conversation.status == ConversationStatus::Paused {
            return Err(SkipReason::Paused);
        }
        Ok(())
    }

    fn persona(&self, slot: Slot) -> std::result::Result<&Persona, SkipReason> {
        self.conversation
            .persona(slot)
            .ok_or(SkipReason::MissingPersona(slot))
    }

    fn issue(&mut self, speaker: Slot, next: Slot, request: GenerationRequest) -> Ticket {
        self.pending = Some(PendingRequest {
            slot: speaker,
            epoch: self.epoch,
        });
        Ticket {
            epoch: self.epoch,
            speaker,
            persona_id: request.persona.id.clone(),
            next,
            request,
        }
    }

    fn prepare_advance(&mut self) -> std::result::Result<Ticket, SkipReason> {
        self.ensure_active()?;
        self.ensure_not_pending()?;
        let speaker = self.conversation.next_responder.ok_or(SkipReason::NoResponder)?;
        if self.conversation.messages.is_empty() {
            return Err(SkipReason::NoMessages);
        }
        let persona = self.persona(speaker)?;
        let request = context::response_request(
            &self.conversation.topic,
            &self.conversation.messages,
            persona,
        );
        Ok(self.issue(speaker, speaker.other(), request))
    }

    fn prepare_directive(
        &mut self,
        speaker: Slot,
        directive: Directive,
    ) -> std::result::Result<Ticket, SkipReason> {
        let ended = self.conversation.status == ConversationStatus::Ended;
        if !(ended && directive.runs_after_end()) {
            self.ensure_running()?;
        }
        self.ensure_not_pending()?;
        if directive.needs_history() && self.conversation.messages.is_empty() {
            return Err(SkipReason::NoMessages);
        }
        let persona = self.persona(speaker)?;
        let request = context::directive_request(
            &self.conversation.topic,
            &self.conversation.messages,
            persona,
            directive,
        );
        Ok(self.issue(speaker, speaker.other(), request))
    }

    /// Starts over, invalidating anything in flight.
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.pending = None;
    }
}

/// Owns the conversation and decides who speaks next.
///
/// The coordinator has no timers. Drivers that want timed continuation call
/// [`TurnCoordinator::advance_turn`] themselves; the single-flight check makes
/// that safe to do at any time.
pub struct TurnCoordinator {
    state: Mutex<CoordinatorState>,
    generator: Arc<dyn ResponseGenerator>,
}

impl TurnCoordinator {
    /// Creates an idle coordinator that generates replies with `generator`.
    pub fn new(generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::default()),
            generator,
        }
    }

    /// Name of the generator this coordinator was built with.
    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Returns a cloned view of the current state.
    pub async fn snapshot(&self) -> ConversationSnapshot {
        let state = self.state.lock().await;
        ConversationSnapshot {
            conversation: state.conversation.clone(),
            pending: state.pending,
            epoch: state.epoch,
        }
    }

    /// Puts `persona` into `slot` ahead of the next conversation.
    ///
    /// Returns false (and changes nothing) while a conversation is running.
    pub async fn select_persona(&self, slot: Slot, persona: Persona) -> bool {
        let mut state = self.state.lock().await;
        if state.conversation.status.is_running() {
            debug!(target: TARGET, %slot, "persona selection locked while running");
            return false;
        }
        state.conversation.personas[slot.index()] = Some(persona);
        true
    }

    /// Starts a conversation on `topic` and generates the opening message.
    ///
    /// Fails with `InvalidSetup` when the topic is blank or both personas are
    /// the same; prior state is left untouched in that case. A generation
    /// failure leaves the conversation active with no messages and slot 0 due.
    pub async fn start_conversation(
        &self,
        topic: &str,
        first: Persona,
        second: Persona,
    ) -> Result<TurnOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ParleyError::invalid_setup("topic must not be empty"));
        }
        if first.id == second.id {
            return Err(ParleyError::invalid_setup(format!(
                "both slots hold persona '{}'; choose two different personas",
                first.id
            )));
        }

        let ticket = {
            let mut state = self.state.lock().await;
            state.bump_epoch();
            let request = context::opening_request(topic, &first);
            state.conversation.begin(topic.to_string(), first, second);
            info!(
                target: TARGET,
                epoch = state.epoch,
                topic,
                "conversation started"
            );
            state.issue(Slot::First, Slot::Second, request)
        };

        self.complete(ticket).await
    }

    /// Generates the next regular turn.
    ///
    /// A no-op unless the conversation is active, nothing is pending and at
    /// least one message exists. On failure the same slot stays due.
    pub async fn advance_turn(&self) -> Result<TurnOutcome> {
        let prepared = self.state.lock().await.prepare_advance();
        match prepared {
            Ok(ticket) => self.complete(ticket).await,
            Err(reason) => Self::skip(reason, "advance"),
        }
    }

    /// Asks slot 0 to steer the discussion back to the topic.
    pub async fn refocus(&self) -> Result<TurnOutcome> {
        self.run_directive(Slot::First, Directive::Refocus, "refocus")
            .await
    }

    /// Asks slot 0 for a structured recap of the whole discussion.
    ///
    /// Unlike the other directives this also runs after the conversation
    /// ended; the status and the empty responder slot are left as they are.
    pub async fn summarize(&self) -> Result<TurnOutcome> {
        self.run_directive(Slot::First, Directive::Summarize, "summarize")
            .await
    }

    /// Asks slot 1 to answer a moderator question.
    pub async fn clarify(&self, question: &str) -> Result<TurnOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Self::skip(SkipReason::EmptyPayload, "clarify");
        }
        let directive = Directive::Clarify {
            question: question.to_string(),
        };
        self.run_directive(Slot::Second, directive, "clarify")
            .await
    }

    /// Restarts the conversation on `new_topic` with the current personas.
    pub async fn change_topic(&self, new_topic: &str) -> Result<TurnOutcome> {
        if new_topic.trim().is_empty() {
            return Self::skip(SkipReason::EmptyPayload, "change_topic");
        }
        let selection = {
            let state = self.state.lock().await;
            match (state.persona(Slot::First), state.persona(Slot::Second)) {
                (Ok(first), Ok(second)) => Ok((first.clone(), second.clone())),
                (Err(reason), _) | (_, Err(reason)) => Err(reason),
            }
        };
        match selection {
            Ok((first, second)) => self.start_conversation(new_topic, first, second).await,
            Err(reason) => Self::skip(reason, "change_topic"),
        }
    }

    /// Pauses an active conversation. In-flight replies still land.
    ///
    /// Returns whether the status changed.
    pub async fn pause(&self) -> bool {
        self.transition(ConversationStatus::Active, ConversationStatus::Paused)
            .await
    }

    /// Resumes a paused conversation. Returns whether the status changed.
    pub async fn resume(&self) -> bool {
        self.transition(ConversationStatus::Paused, ConversationStatus::Active)
            .await
    }

    /// Ends the conversation, keeping its messages and topic for export.
    ///
    /// Idempotent. A reply still in flight is discarded when it arrives.
    /// Returns whether the status changed.
    pub async fn end_conversation(&self) -> bool {
        let mut state = self.state.lock().await;
        let changed = state.conversation.status != ConversationStatus::Ended;
        state.bump_epoch();
        state.conversation.status = ConversationStatus::Ended;
        state.conversation.next_responder = None;
        info!(
            target: TARGET,
            epoch = state.epoch,
            messages = state.conversation.messages.len(),
            "conversation ended"
        );
        changed
    }

    /// Clears everything except the persona selection and returns to idle.
    pub async fn start_new_conversation(&self) {
        let mut state = self.state.lock().await;
        state.bump_epoch();
        state.conversation.reset();
        info!(target: TARGET, epoch = state.epoch, "conversation reset");
    }

    async fn transition(&self, from: ConversationStatus, to: ConversationStatus) -> bool {
        let mut state = self.state.lock().await;
        if state.conversation.status != from {
            return false;
        }
        state.conversation.status = to;
        info!(target: TARGET, ?from, ?to, "status changed");
        true
    }

    async fn run_directive(
        &self,
        speaker: Slot,
        directive: Directive,
        operation: &'static str,
    ) -> Result<TurnOutcome> {
        let prepared = self
            .state
            .lock()
            .await
            .prepare_directive(speaker, directive);
        match prepared {
            Ok(ticket) => self.complete(ticket).await,
            Err(reason) => Self::skip(reason, operation),
        }
    }

    fn skip(reason: SkipReason, operation: &'static str) -> Result<TurnOutcome> {
        debug!(target: TARGET, operation, %reason, "skipped");
        TurnOutcome::settle(Err(reason.into()))
    }

    async fn complete(&self, ticket: Ticket) -> Result<TurnOutcome> {
        let reply = self.generator.generate(&ticket.request).await;

        let mut state = self.state.lock().await;
        if state.epoch != ticket.epoch {
            debug!(
                target: TARGET,
                issued_epoch = ticket.epoch,
                current_epoch = state.epoch,
                "discarding reply for an abandoned conversation"
            );
            return TurnOutcome::settle(Err(ParleyError::StaleResponse {
                issued_epoch: ticket.epoch,
                current_epoch: state.epoch,
            }));
        }
        state.pending = None;

        let text = match reply {
            Ok(text) if text.trim().is_empty() => {
                return Err(self.failed(
                    &ticket,
                    ParleyError::generation(self.generator.name(), "returned an empty reply"),
                ));
            }
            Ok(text) => text,
            Err(err) => return Err(self.failed(&ticket, err)),
        };

        let message = Message::new(ticket.persona_id, text.trim());
        state.conversation.record_turn(message.clone(), ticket.next);
        info!(
            target: TARGET,
            slot = %ticket.speaker,
            persona = %message.persona_id,
            messages = state.conversation.messages.len(),
            "turn recorded"
        );
        Ok(TurnOutcome::Spoke(message))
    }

    fn failed(&self, ticket: &Ticket, err: ParleyError) -> ParleyError {
        warn!(
            target: TARGET,
            slot = %ticket.speaker,
            persona = %ticket.persona_id,
            generator = self.generator.name(),
            error = %err,
            "generation failed"
        );
        err
    }
}
