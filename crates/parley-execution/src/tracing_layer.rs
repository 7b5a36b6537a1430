//! Tracing layer that streams conversation events to a presentation layer.
//!
//! Coordinator, adapter and auto-play events are captured as
//! [`ConversationEvent`]s and forwarded over an unbounded tokio channel.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Target prefix shared by every parley event.
pub const PARLEY_TARGET_PREFIX: &str = "parley::";

/// Event data sent to the presentation layer
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationEvent {
    /// Event target (e.g., "parley::coordinator")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    /// Human-readable message
    pub message: String,
    /// Structured fields from the event (epoch, slot, persona, ...)
    pub fields: HashMap<String, Value>,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// A tracing layer that sends parley events to a channel.
pub struct ConversationEventLayer {
    sender: mpsc::UnboundedSender<ConversationEvent>,
    prefix: &'static str,
}

impl ConversationEventLayer {
    /// Forwards every event whose target starts with `parley::`.
    pub fn new(sender: mpsc::UnboundedSender<ConversationEvent>) -> Self {
        Self {
            sender,
            prefix: PARLEY_TARGET_PREFIX,
        }
    }

    /// Forwards only events whose target starts with `prefix`.
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConversationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl<S> Layer<S> for ConversationEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with(self.prefix) {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let conversation_event = ConversationEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // A dropped receiver just means nobody is listening anymore
        let _ = self.sender.send(conversation_event);
    }
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn forwards_parley_events_with_fields() {
        let (layer, mut rx) = ConversationEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "parley::coordinator", epoch = 2u64, persona = "scholar", "turn recorded");
            tracing::info!(target: "hyper::client", "unrelated");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.target, "parley::coordinator");
        assert_eq!(event.level, "INFO");
        assert_eq!(event.message, "turn recorded");
        assert_eq!(event.fields["epoch"], 2);
        assert_eq!(event.fields["persona"], "scholar");
        assert!(!event.fields.contains_key("message"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn prefix_narrows_forwarded_events() {
        let (layer, mut rx) = ConversationEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer.with_prefix("parley::autoplay"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "parley::coordinator", "generation failed");
            tracing::warn!(target: "parley::autoplay", failures = 1u64, "turn failed");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.target, "parley::autoplay");
        assert_eq!(event.level, "WARN");
        assert!(rx.try_recv().is_err());
    }
}
