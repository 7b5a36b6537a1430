//! Deterministic fallback generator.
//!
//! Used for the whole session when no hosted provider is reachable. Replies
//! are canned variants keyed by the persona's response style; the variant is
//! picked with a `StdRng` seeded from the generator seed and the request, so
//! the same request always yields the same reply.

use async_trait::async_trait;
use parley_core::context::{MAX_SUMMARY_POINTS, SUMMARY_SECTIONS};
use parley_core::error::Result;
use parley_core::generation::{Directive, GenerationRequest, HistoryEntry, ResponseGenerator, Speaker};
use parley_core::persona::{Persona, ResponseStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const DEFAULT_SEED: u64 = 0x5eed_ba11;

/// Longest excerpt quoted in a summary bullet.
const EXCERPT_CHARS: usize = 120;

/// Offline generator with canned, style-specific replies.
#[derive(Debug, Clone)]
pub struct FallbackGenerator {
    seed: u64,
    latency: Option<Duration>,
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl FallbackGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            latency: None,
        }
    }

    /// Waits `latency` before every reply.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Produces the reply for `request` without any delay.
    pub fn respond(&self, request: &GenerationRequest) -> String {
        let mut rng = StdRng::seed_from_u64(self.request_seed(request));
        let topic = request.topic.as_str();

        match &request.directive {
            Some(Directive::Refocus) => pick(&mut rng, refocus_variants(topic)),
            Some(Directive::Clarify { question }) => {
                pick(&mut rng, clarify_variants(question, topic))
            }
            Some(Directive::Summarize) => summary(&request.persona, topic, &request.history),
            None if request.reply_target().is_some() => {
                pick(&mut rng, reply_variants(request.persona.response_style, topic))
            }
            None => pick(&mut rng, opening_variants(request.persona.response_style, topic)),
        }
    }

    fn request_seed(&self, request: &GenerationRequest) -> u64 {
        let directive = match &request.directive {
            None => 0,
            Some(Directive::Refocus) => 1,
            Some(Directive::Summarize) => 2,
            Some(Directive::Clarify { .. }) => 3,
        };
        let mut hash = fnv1a(self.seed ^ FNV_OFFSET, request.topic.as_bytes());
        hash = fnv1a(hash, request.persona.id.as_bytes());
        hash = fnv1a(hash, &(request.history.len() as u64).to_le_bytes());
        fnv1a(hash, &[directive])
    }
}

#[async_trait]
impl ResponseGenerator for FallbackGenerator {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.respond(request))
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn pick(rng: &mut StdRng, mut variants: Vec<String>) -> String {
    let index = rng.gen_range(0..variants.len());
    variants.swap_remove(index)
}

fn opening_variants(style: ResponseStyle, topic: &str) -> Vec<String> {
    match style {
        ResponseStyle::Informative => vec![
            format!("Let me provide some context about {topic}. From a factual standpoint, there are several key aspects to consider..."),
            format!("To approach {topic} objectively, we should examine the available data and research..."),
            format!("I think it's important to establish a foundation of facts when discussing {topic}..."),
        ],
        ResponseStyle::Creative => vec![
            format!("Oh, {topic}! This reminds me of a kaleidoscope of possibilities. What if we looked at this from a completely different angle?"),
            format!("You know, {topic} is like a canvas waiting for bold strokes. Let me paint you a picture of what I'm thinking..."),
            format!("{topic} sparks so many creative connections in my mind. It's fascinating how this relates to art, music, and human expression..."),
        ],
        ResponseStyle::Logical => vec![
            format!("Regarding {topic}, let me present my argument with clear logical structure. First, we must define our terms..."),
            format!("I challenge the premise of {topic}. Here's why this position is flawed and what evidence supports my counterargument..."),
            format!("To debate {topic} effectively, we need to establish clear criteria for evaluation. I propose we examine this through three lenses..."),
        ],
        ResponseStyle::Sarcastic => vec![
            format!("Oh, {topic}? Really? Well, this should be interesting. Let me guess what everyone's going to say..."),
            format!("Ah yes, {topic}. Because clearly this is the most pressing issue of our time. *rolls digital eyes*"),
            format!("{topic}? How delightfully controversial. I'm sure this will be a perfectly civilized discussion..."),
        ],
        ResponseStyle::Empathetic => vec![
            format!("{topic} really touches my heart because it affects so many people in meaningful ways. I feel like we should approach this with compassion..."),
            format!("When I think about {topic}, I can't help but consider the human emotions and experiences involved..."),
            format!("This topic about {topic} brings up such important feelings. I think we need to be gentle and understanding as we discuss this..."),
        ],
    }
}

fn reply_variants(style: ResponseStyle, topic: &str) -> Vec<String> {
    match style {
        ResponseStyle::Informative => vec![
            "That's an interesting point. Let me add some additional context and data to support that perspective...".to_string(),
            "I appreciate that viewpoint. However, the research also shows some nuances worth considering...".to_string(),
            "Building on what you said, there are actually several studies that both support and challenge that position...".to_string(),
        ],
        ResponseStyle::Creative => vec![
            format!("Wow, that's like seeing {topic} through a prism! Your perspective adds such vibrant colors to this discussion..."),
            format!("That reminds me of a beautiful metaphor - it's like {topic} is a symphony, and you just added a new instrument..."),
            format!("Oh, I love how you're thinking about this! It's making me imagine {topic} as a living, breathing organism..."),
        ],
        ResponseStyle::Logical => vec![
            "I must respectfully disagree with that reasoning. Here's where the logical fallacy occurs...".to_string(),
            "That argument has merit, but it's incomplete. Let me provide the missing logical links...".to_string(),
            "While you make valid points, the conclusion doesn't follow from the premises. Consider this counterexample...".to_string(),
        ],
        ResponseStyle::Sarcastic => vec![
            format!("Oh, absolutely! Because that's totally how {topic} works in the real world. *chef's kiss*"),
            format!("Right, right. And I suppose next you'll tell me that {topic} is actually simple and straightforward?"),
            format!("That's... certainly one way to look at it. Bold of you to assume such optimism about {topic}..."),
        ],
        ResponseStyle::Empathetic => vec![
            format!("I can really feel the emotion behind your words. It's clear that {topic} means a lot to you, and I want to honor that..."),
            format!("Your perspective on {topic} is so moving. I think many people would feel the same way if they truly understood..."),
            format!("Thank you for sharing that. It's brave to be vulnerable about {topic}, and I think your feelings are completely valid..."),
        ],
    }
}

fn refocus_variants(topic: &str) -> Vec<String> {
    vec![
        format!("You're absolutely right, let me bring us back to the core of our discussion about {topic}. I think we may have wandered a bit, so let me refocus on the main issue at hand."),
        format!("Good point about refocusing. Let's get back to the heart of {topic} and what we were originally discussing. The main question we should be addressing is..."),
        format!("Thanks for that reminder. Let me steer us back to the central theme of {topic}. I believe the key aspect we should focus on is..."),
    ]
}

fn clarify_variants(question: &str, topic: &str) -> Vec<String> {
    vec![
        format!("Great question! Let me clarify that point about {topic}. When I mentioned that earlier, I was specifically referring to..."),
        format!("I'm glad you asked for clarification on \"{question}\". In the context of our {topic} discussion, what I meant was..."),
        format!("That's an important clarification to make. Regarding \"{question}\" in relation to {topic}, let me explain more clearly..."),
    ]
}

/// First sentence of `text`, cut to [`EXCERPT_CHARS`].
fn excerpt(text: &str) -> String {
    let sentence = text
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(text)
        .trim();
    if sentence.chars().count() <= EXCERPT_CHARS {
        sentence.to_string()
    } else {
        let cut: String = sentence.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

fn summary(persona: &Persona, topic: &str, history: &[HistoryEntry]) -> String {
    let own = history.iter().filter(|e| e.speaker == Speaker::Own).count();
    let other = history.len() - own;
    let approach = persona
        .leading_trait()
        .unwrap_or_else(|| "measured".to_string());

    let mut key_points: Vec<String> = history
        .iter()
        .map(|entry| excerpt(&entry.text))
        .filter(|point| !point.is_empty())
        .take(MAX_SUMMARY_POINTS)
        .collect();
    if key_points.is_empty() {
        key_points.push(format!("We explored the fundamental aspects of {topic}"));
    }

    let perspectives = vec![
        format!("One viewpoint emphasized the {approach} approach to understanding {topic} ({own} contributions)"),
        format!("Alternative perspectives highlighted different aspects and considerations ({other} contributions)"),
        "We examined both positive and negative implications".to_string(),
    ];

    let arguments = vec![
        "Strong evidence was presented supporting different positions".to_string(),
        "Logical reasoning was applied to evaluate various claims".to_string(),
        "Real-world examples were used to illustrate key points".to_string(),
        "Counter-arguments were addressed and discussed".to_string(),
    ];

    let mut conclusions = vec![
        "The topic requires nuanced understanding and careful consideration".to_string(),
        "Multiple valid perspectives exist and should be acknowledged".to_string(),
    ];
    if let Some(last) = history.last() {
        conclusions.push(format!("The latest word: {}", excerpt(&last.text)));
    }
    conclusions.push(format!(
        "The conversation revealed the complexity inherent in {topic}"
    ));

    let groups = [key_points, perspectives, arguments, conclusions];
    let mut out = format!("## Discussion Summary: {topic}");
    for (heading, bullets) in SUMMARY_SECTIONS.iter().zip(groups) {
        out.push_str(&format!("\n\n### {heading}:"));
        for bullet in bullets.iter().take(MAX_SUMMARY_POINTS) {
            out.push_str(&format!("\n• {bullet}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::context::{directive_request, opening_request, response_request};
    use parley_core::conversation::Message;
    use parley_core::persona::get_default_presets;

    fn bullets_per_section(text: &str) -> Vec<usize> {
        text.split("\n### ")
            .skip(1)
            .map(|section| section.lines().filter(|l| l.starts_with('•')).count())
            .collect()
    }

    #[test]
    fn identical_requests_yield_identical_replies() {
        let scholar = get_default_presets()[0].clone();
        let request = opening_request("AI rights", &scholar);

        let a = FallbackGenerator::new(7).respond(&request);
        let b = FallbackGenerator::new(7).respond(&request);

        assert_eq!(a, b);
        assert!(a.contains("AI rights"));
    }

    #[test]
    fn replies_follow_response_style() {
        let presets = get_default_presets();
        let wit = presets.iter().find(|p| p.id == "wit").unwrap();
        let messages = vec![Message::new("scholar", "Facts matter.")];
        let request = response_request("Pizza", &messages, wit);

        let reply = FallbackGenerator::default().respond(&request);

        assert!(reply_variants(ResponseStyle::Sarcastic, "Pizza").contains(&reply));
    }

    #[test]
    fn clarify_replies_come_from_clarify_variants() {
        let wit = get_default_presets()[4].clone();
        let request = directive_request(
            "Pizza",
            &[],
            &wit,
            Directive::Clarify {
                question: "What do you mean by X?".into(),
            },
        );

        let reply = FallbackGenerator::default().respond(&request);

        assert!(clarify_variants("What do you mean by X?", "Pizza").contains(&reply));
    }

    #[test]
    fn summary_has_four_bounded_sections() {
        let scholar = get_default_presets()[0].clone();
        let messages: Vec<Message> = (0..7)
            .map(|i| {
                let speaker = if i % 2 == 0 { "scholar" } else { "wit" };
                Message::new(speaker, format!("Point number {i}. With more detail after it."))
            })
            .collect();
        let request = directive_request("Pizza", &messages, &scholar, Directive::Summarize);

        let text = FallbackGenerator::default().respond(&request);

        for section in SUMMARY_SECTIONS {
            assert!(text.contains(&format!("### {section}:")), "missing {section}");
        }
        let counts = bullets_per_section(&text);
        assert_eq!(counts.len(), 4);
        assert!(counts.iter().all(|&n| (1..=MAX_SUMMARY_POINTS).contains(&n)));
        assert!(text.contains("• Point number 0."));
        assert!(!text.contains("With more detail"));
        assert!(text.contains("(4 contributions)"));
    }

    #[test]
    fn excerpt_truncates_long_sentences() {
        let long = "word ".repeat(60);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= EXCERPT_CHARS + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_simulated() {
        let generator = FallbackGenerator::default().with_latency(Duration::from_secs(2));
        let request = opening_request("Pizza", &get_default_presets()[1]);

        let started = tokio::time::Instant::now();
        let reply = generator.generate(&request).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(!reply.is_empty());
    }
}
