//! Topic suggestions backed by Gemini, with a fixed fallback list.

use crate::config::SecretConfig;
use crate::gemini_api_agent::GeminiApiAgent;
use crate::prompt;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parley_core::config::GenerationSettings;
use parley_core::error::Result;
use parley_core::topic::{DEFAULT_TOPIC, FallbackTopics, TopicSuggester};
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*•]+|\d+[.)]|#+)\s*").expect("list marker pattern is valid"));

/// Splits a model reply into topics: one per line, list markers and
/// surrounding quotes removed, blanks dropped, at most `count` kept.
pub fn parse_topic_lines(text: &str, count: usize) -> Vec<String> {
    text.lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .map(|line| line.trim_matches('"').trim().to_string())
        .filter(|line| !line.is_empty())
        .take(count)
        .collect()
}

/// Asks Gemini for debate topics.
pub struct GeminiTopicSuggester {
    agent: GeminiApiAgent,
}

impl GeminiTopicSuggester {
    pub fn new(agent: GeminiApiAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl TopicSuggester for GeminiTopicSuggester {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn suggest(&self, count: usize) -> Result<Vec<String>> {
        let reply = self.agent.complete(prompt::topic_prompt(count)?).await?;
        Ok(parse_topic_lines(&reply, count))
    }
}

/// Topic suggestions that never fail.
#[derive(Clone, Default)]
pub struct TopicService {
    suggester: Option<Arc<dyn TopicSuggester>>,
}

impl TopicService {
    pub fn new(suggester: Arc<dyn TopicSuggester>) -> Self {
        Self {
            suggester: Some(suggester),
        }
    }

    /// Uses Gemini when a key is configured, the fallback list otherwise.
    pub fn from_secrets(secrets: &SecretConfig, settings: &GenerationSettings) -> Result<Self> {
        match &secrets.gemini {
            Some(secret) => {
                let agent = GeminiApiAgent::from_secret(secret, settings)?;
                Ok(Self::new(Arc::new(GeminiTopicSuggester::new(agent))))
            }
            None => Ok(Self::offline()),
        }
    }

    /// A service that only serves the fallback list.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Up to `count` topics (at least one is always asked for).
    ///
    /// Errors and empty replies yield the fallback list.
    pub async fn suggest(&self, count: usize) -> Vec<String> {
        let count = count.max(1);
        let Some(suggester) = &self.suggester else {
            return FallbackTopics::take(count);
        };

        match suggester.suggest(count).await {
            Ok(topics) if !topics.is_empty() => topics.into_iter().take(count).collect(),
            Ok(_) => {
                warn!(target: "parley::adapter", suggester = suggester.name(), "no topics returned; using fallback list");
                FallbackTopics::take(count)
            }
            Err(err) => {
                warn!(target: "parley::adapter", suggester = suggester.name(), error = %err, "topic suggestion failed; using fallback list");
                FallbackTopics::take(count)
            }
        }
    }

    /// A single topic to start with.
    pub async fn random_topic(&self) -> String {
        self.suggest(1)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::error::ParleyError;
    use parley_core::topic::FALLBACK_TOPICS;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FailingSuggester;

    #[async_trait]
    impl TopicSuggester for FailingSuggester {
        fn name(&self) -> &str {
            "failing"
        }

        async fn suggest(&self, _count: usize) -> Result<Vec<String>> {
            Err(ParleyError::generation("failing", "offline"))
        }
    }

    #[test]
    fn parsing_strips_markers_and_blanks() {
        let text = "1. Should AI vote?\n\n- \"Is remote work here to stay?\"\n* Are cities obsolete?\n• Is math discovered?";
        let topics = parse_topic_lines(text, 3);
        assert_eq!(
            topics,
            vec![
                "Should AI vote?",
                "Is remote work here to stay?",
                "Are cities obsolete?"
            ]
        );
    }

    #[tokio::test]
    async fn failures_yield_fallback_list() {
        let service = TopicService::new(Arc::new(FailingSuggester));

        let topics = service.suggest(0).await;
        assert_eq!(topics, vec![FALLBACK_TOPICS[0].to_string()]);

        assert_eq!(service.random_topic().await, FALLBACK_TOPICS[0]);
    }

    #[tokio::test]
    async fn offline_service_serves_fallback() {
        let topics = TopicService::offline().suggest(8).await;
        assert_eq!(topics.len(), 8);
    }

    #[tokio::test]
    async fn gemini_topics_are_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Should AI vote?\nAre cities obsolete?\nIs math discovered?"}]}}]
            })))
            .mount(&server)
            .await;
        let agent = GeminiApiAgent::new("gm-test", "gemini-2.0-flash", &GenerationSettings::default())
            .unwrap()
            .with_base_url(server.uri());
        let service = TopicService::new(Arc::new(GeminiTopicSuggester::new(agent)));

        let topics = service.suggest(2).await;

        assert_eq!(topics, vec!["Should AI vote?", "Are cities obsolete?"]);
    }
}
