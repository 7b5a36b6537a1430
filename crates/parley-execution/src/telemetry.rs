//! Global tracing subscriber setup.

use crate::tracing_layer::ConversationEventLayer;
use parley_core::error::{ParleyError, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Builds the filter, preferring `RUST_LOG` over `default_filter`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Installs the global subscriber: an env filter plus a plain or JSON
/// formatter writing to stderr.
pub fn init_tracing(default_filter: &str, json: bool) -> Result<()> {
    init_tracing_with(default_filter, json, None)
}

/// Like [`init_tracing`], additionally forwarding events to `events`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing_with(
    default_filter: &str,
    json: bool,
    events: Option<ConversationEventLayer>,
) -> Result<()> {
    let plain = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let structured = json.then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(plain)
        .with(structured)
        .with(events)
        .try_init()
        .map_err(|err| ParleyError::internal(format!("Failed to install tracing subscriber: {err}")))
}
