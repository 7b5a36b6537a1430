//! Prompt rendering for the hosted providers.

use minijinja::{Environment, context};
use once_cell::sync::Lazy;
use parley_core::error::{ParleyError, Result};
use parley_core::generation::GenerationRequest;

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
});

const SYSTEM_TEMPLATE: &str = r#"{{ instruction }}

You are discussing the topic: "{{ topic }}"

This is a conversation between two AI assistants. The user is moderating the discussion."#;

const SINGLE_PROMPT_TEMPLATE: &str = r#"{{ system }}

{% if history %}
Previous conversation:
{% for entry in history %}
{{ "You" if entry.speaker == "self" else "Other participant" }}: {{ entry.text }}
{% endfor %}

{% endif %}
{{ closing }}"#;

const TOPIC_TEMPLATE: &str = r#"Generate {{ count }} interesting and thought-provoking debate topics that would make for engaging AI discussions.

Requirements:
- Topics should be current, relevant, and intellectually stimulating
- Mix of technology, society, ethics, philosophy, and contemporary issues
- Each topic should be phrased as a clear statement or question
- Avoid overly controversial or sensitive topics
- Make them suitable for AI personas to have meaningful discussions

Format: Return only the topics, one per line, without numbering or bullet points.

Generate {{ count }} topics:"#;

const LENGTH_HINT: &str = "Keep your response conversational and around 2-3 sentences.";

fn render(source: &str, ctx: minijinja::Value) -> Result<String> {
    ENV.render_str(source, ctx)
        .map_err(|err| ParleyError::internal(format!("Failed to render prompt: {err}")))
}

/// Persona instruction, topic and moderator framing.
pub fn system_prompt(request: &GenerationRequest) -> Result<String> {
    render(
        SYSTEM_TEMPLATE,
        context! {
            instruction => request.persona_instruction(),
            topic => &request.topic,
        },
    )
}

/// The final instruction: open the discussion, reply, or follow a directive.
///
/// `length_hint` appends the short-reply guidance used by single-prompt providers.
pub fn closing_instruction(request: &GenerationRequest, length_hint: bool) -> String {
    let topic = &request.topic;
    let mut text = match (&request.directive, request.reply_target()) {
        (Some(_), Some(instruction)) => instruction.to_string(),
        (None, Some(previous)) => format!(
            "The other participant just said: \"{previous}\"\n\n\
             Please respond to this in the context of our discussion about \"{topic}\"."
        ),
        _ => format!(
            "Please start the discussion about \"{topic}\". Give your opening thoughts on this topic."
        ),
    };
    if length_hint {
        text.push(' ');
        text.push_str(LENGTH_HINT);
    }
    text
}

/// A single self-contained prompt carrying the whole history.
pub fn single_prompt(request: &GenerationRequest) -> Result<String> {
    render(
        SINGLE_PROMPT_TEMPLATE,
        context! {
            system => system_prompt(request)?,
            history => &request.history,
            closing => closing_instruction(request, true),
        },
    )
}

/// Prompt asking for `count` debate topics, one per line.
pub fn topic_prompt(count: usize) -> Result<String> {
    render(TOPIC_TEMPLATE, context! { count => count })
}
