//! Context assembly for generation requests.
//!
//! Every turn-producing operation builds its request here so the speaker's
//! view of the history is projected the same way: its own earlier words are
//! tagged [`Speaker::Own`], everything else [`Speaker::Other`]. Persona ids
//! never reach the generator through the history.

use crate::conversation::Message;
use crate::generation::{Directive, GenerationRequest, HistoryEntry, Speaker};
use crate::persona::Persona;

/// Upper bound on bullets per group in a structured summary.
pub const MAX_SUMMARY_POINTS: usize = 4;

/// Headings of the structured summary, in order.
pub const SUMMARY_SECTIONS: [&str; 4] = [
    "Key Points Discussed",
    "Different Perspectives",
    "Main Arguments",
    "Conclusions/Insights",
];

/// Projects `messages` from the point of view of `speaker_id`.
pub fn project_history(messages: &[Message], speaker_id: &str) -> Vec<HistoryEntry> {
    messages
        .iter()
        .map(|message| {
            let speaker = if message.is_from(speaker_id) {
                Speaker::Own
            } else {
                Speaker::Other
            };
            HistoryEntry::new(speaker, message.content.clone())
        })
        .collect()
}

/// Request for the opening move: no history framing.
pub fn opening_request(topic: &str, persona: &Persona) -> GenerationRequest {
    GenerationRequest {
        topic: topic.to_string(),
        history: Vec::new(),
        persona: persona.clone(),
        is_response: false,
        previous_message: None,
        directive: None,
    }
}

/// Request for a regular turn replying to the last message.
pub fn response_request(topic: &str, messages: &[Message], persona: &Persona) -> GenerationRequest {
    GenerationRequest {
        topic: topic.to_string(),
        history: project_history(messages, &persona.id),
        persona: persona.clone(),
        is_response: true,
        previous_message: messages.last().map(|m| m.content.clone()),
        directive: None,
    }
}

/// Request carrying a moderator intervention for `persona`.
pub fn directive_request(
    topic: &str,
    messages: &[Message],
    persona: &Persona,
    directive: Directive,
) -> GenerationRequest {
    GenerationRequest {
        topic: topic.to_string(),
        history: project_history(messages, &persona.id),
        persona: persona.clone(),
        is_response: true,
        previous_message: Some(directive_instruction(&directive, topic)),
        directive: Some(directive),
    }
}

/// Renders the moderator instruction sent in place of a previous message.
pub fn directive_instruction(directive: &Directive, topic: &str) -> String {
    match directive {
        Directive::Refocus => format!(
            "Please refocus our discussion on the main topic: \"{topic}\". \
             We may have wandered; bring the conversation back to its central question \
             and restate what matters most."
        ),
        Directive::Summarize => format!(
            "Please provide a comprehensive point-wise summary of our entire discussion about \"{topic}\". \
             Organize it under these headings: {}. \
             Use at most {MAX_SUMMARY_POINTS} bullet points per heading.",
            SUMMARY_SECTIONS.join(", ")
        ),
        Directive::Clarify { question } => format!(
            "Clarification needed: {question}\n\n\
             Please answer this clarification in the context of our discussion about \"{topic}\"."
        ),
    }
}
