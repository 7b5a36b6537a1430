//! Debate topic suggestions.

use crate::error::Result;
use async_trait::async_trait;

/// Topic used when no suggestion is available at all.
pub const DEFAULT_TOPIC: &str = "What does the future hold for human-AI collaboration?";

/// Fixed list served whenever a suggester fails or comes back empty.
pub const FALLBACK_TOPICS: [&str; 8] = [
    "Should AI have rights and legal protections?",
    "Is remote work better than traditional office work?",
    "Will cryptocurrency replace traditional banking?",
    "Should social media platforms be regulated by government?",
    "Is artificial intelligence a threat to human creativity?",
    "Are electric cars really better for the environment?",
    "Should college education be free for everyone?",
    "Will virtual reality change how we experience entertainment?",
];

/// A source of debate topics.
#[async_trait]
pub trait TopicSuggester: Send + Sync {
    fn name(&self) -> &str;

    /// Returns at most `count` topics.
    async fn suggest(&self, count: usize) -> Result<Vec<String>>;
}

/// Serves [`FALLBACK_TOPICS`]. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTopics;

impl FallbackTopics {
    /// The first `count` fallback topics.
    pub fn take(count: usize) -> Vec<String> {
        FALLBACK_TOPICS
            .iter()
            .take(count)
            .map(|topic| topic.to_string())
            .collect()
    }
}

#[async_trait]
impl TopicSuggester for FallbackTopics {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn suggest(&self, count: usize) -> Result<Vec<String>> {
        Ok(Self::take(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fallback_truncates_to_count() {
        let topics = FallbackTopics.suggest(3).await.unwrap();
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0], "Should AI have rights and legal protections?");

        let all = FallbackTopics.suggest(20).await.unwrap();
        assert_eq!(all.len(), FALLBACK_TOPICS.len());
    }
}
