use async_trait::async_trait;
use parley_core::config::AutoPlayConfig;
use parley_core::conversation::ConversationStatus;
use parley_core::persona::PersonaRegistry;
use parley_core::{GenerationRequest, ParleyError, ResponseGenerator, Result, TurnCoordinator};
use parley_execution::{AutoPlayDriver, StopReason};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Replies "<persona> #<n>" until told to fail.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
    failing: AtomicBool,
}

#[async_trait]
impl ResponseGenerator for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ParleyError::generation("counting", "unavailable"));
        }
        Ok(format!("{} #{n}", request.persona.id))
    }
}

fn config(max_turns: Option<usize>) -> AutoPlayConfig {
    AutoPlayConfig {
        max_turns,
        ..AutoPlayConfig::default()
    }
}

async fn started(generator: Arc<CountingGenerator>) -> Arc<TurnCoordinator> {
    let registry = PersonaRegistry::with_presets();
    let coordinator = Arc::new(TurnCoordinator::new(generator));
    coordinator
        .start_conversation(
            "Is pineapple on pizza acceptable?",
            registry.require("scholar").unwrap(),
            registry.require("wit").unwrap(),
        )
        .await
        .unwrap();
    coordinator
}

#[tokio::test(start_paused = true)]
async fn advances_until_max_turns() {
    let coordinator = started(Arc::default()).await;

    let report = AutoPlayDriver::new(coordinator.clone(), config(Some(3)))
        .run()
        .await;

    assert_eq!(report.turns, 3);
    assert_eq!(report.failures, 0);
    assert_eq!(report.stop_reason, StopReason::MaxTurns);
    let authors: Vec<_> = coordinator
        .snapshot()
        .await
        .messages()
        .iter()
        .map(|m| m.persona_id.clone())
        .collect();
    assert_eq!(authors, vec!["scholar", "wit", "scholar", "wit"]);
}

#[tokio::test(start_paused = true)]
async fn waits_for_the_configured_delay() {
    let coordinator = started(Arc::default()).await;
    let start = tokio::time::Instant::now();

    AutoPlayDriver::new(coordinator, config(Some(2))).run().await;

    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn idle_conversation_stops_the_driver() {
    let coordinator = Arc::new(TurnCoordinator::new(Arc::new(CountingGenerator::default())));

    let report = AutoPlayDriver::new(coordinator, config(None)).run().await;

    assert_eq!(report.turns, 0);
    assert_eq!(
        report.stop_reason,
        StopReason::NotRunning(ConversationStatus::Idle)
    );
}

#[tokio::test(start_paused = true)]
async fn ended_conversation_stops_the_driver() {
    let coordinator = started(Arc::default()).await;
    coordinator.end_conversation().await;

    let report = AutoPlayDriver::new(coordinator, config(None)).run().await;

    assert_eq!(
        report.stop_reason,
        StopReason::NotRunning(ConversationStatus::Ended)
    );
}

#[tokio::test(start_paused = true)]
async fn consecutive_failures_stop_the_driver() {
    let generator = Arc::new(CountingGenerator::default());
    let coordinator = started(generator.clone()).await;
    generator.failing.store(true, Ordering::SeqCst);

    let report = AutoPlayDriver::new(coordinator.clone(), config(None)).run().await;

    assert_eq!(report.turns, 0);
    assert_eq!(report.failures, 3);
    assert_eq!(report.stop_reason, StopReason::TooManyFailures);
    let snapshot = coordinator.snapshot().await;
    assert_eq!(snapshot.messages().len(), 1);
    assert!(!snapshot.is_pending());
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_before_the_next_turn() {
    let coordinator = started(Arc::default()).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = AutoPlayDriver::new(coordinator.clone(), config(None))
        .with_cancellation(cancel)
        .run()
        .await;

    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(coordinator.snapshot().await.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn paused_conversation_is_waited_on() {
    let coordinator = started(Arc::default()).await;
    coordinator.pause().await;

    let handle = AutoPlayDriver::new(coordinator.clone(), config(Some(1))).spawn();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(coordinator.snapshot().await.messages().len(), 1);
    assert!(!handle.is_finished());

    coordinator.resume().await;
    let report = handle.await.unwrap();

    assert_eq!(report.turns, 1);
    assert_eq!(report.stop_reason, StopReason::MaxTurns);
    assert_eq!(coordinator.snapshot().await.messages().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn produced_messages_reach_the_sink() {
    let coordinator = started(Arc::default()).await;
    let (tx, mut rx) = mpsc::channel(8);

    AutoPlayDriver::new(coordinator, config(Some(2)))
        .with_message_sink(tx)
        .run()
        .await;

    assert_eq!(rx.recv().await.unwrap().content, "wit #2");
    assert_eq!(rx.recv().await.unwrap().content, "scholar #3");
}

#[tokio::test(start_paused = true)]
async fn disabled_driver_does_nothing() {
    let coordinator = started(Arc::default()).await;
    let disabled = AutoPlayConfig {
        enabled: false,
        ..AutoPlayConfig::default()
    };

    let report = AutoPlayDriver::new(coordinator.clone(), disabled).run().await;

    assert_eq!(report.stop_reason, StopReason::Disabled);
    assert_eq!(coordinator.snapshot().await.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_opening_stops_the_driver() {
    let generator = Arc::new(CountingGenerator::default());
    generator.failing.store(true, Ordering::SeqCst);
    let registry = PersonaRegistry::with_presets();
    let coordinator = Arc::new(TurnCoordinator::new(generator.clone()));
    assert!(
        coordinator
            .start_conversation(
                "AI rights",
                registry.require("scholar").unwrap(),
                registry.require("wit").unwrap(),
            )
            .await
            .is_err()
    );
    generator.failing.store(false, Ordering::SeqCst);

    let report = AutoPlayDriver::new(coordinator.clone(), config(None)).run().await;

    assert_eq!(report.stop_reason, StopReason::NoOpening);
    assert_eq!(report.turns, 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert!(coordinator.snapshot().await.messages().is_empty());
}
