//! Transcript export.

use crate::conversation::Slot;
use crate::coordinator::ConversationSnapshot;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One exported message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    /// Display name of the persona that spoke
    pub speaker: String,
    pub text: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// A self-contained transcript of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExport {
    pub topic: String,
    /// Display names of the two personas, in slot order
    pub personas: [String; 2],
    pub exported_at: String,
    pub messages: Vec<ExportedMessage>,
}

impl ConversationExport {
    /// Builds an export from `snapshot`, or `None` when there is nothing to export.
    pub fn from_snapshot(snapshot: &ConversationSnapshot, exported_at: DateTime<Utc>) -> Option<Self> {
        if snapshot.messages().is_empty() {
            return None;
        }

        let personas = Slot::ALL.map(|slot| {
            snapshot
                .persona(slot)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        });

        let messages = snapshot
            .messages()
            .iter()
            .map(|message| ExportedMessage {
                speaker: snapshot.speaker_name(message).to_string(),
                text: message.content.clone(),
                timestamp: message.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            })
            .collect();

        Some(Self {
            topic: snapshot.topic().to_string(),
            personas,
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            messages,
        })
    }

    /// Pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
