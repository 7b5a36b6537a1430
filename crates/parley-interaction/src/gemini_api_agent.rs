//! GeminiApiAgent - `generateContent` provider.
//!
//! Gemini receives one rendered prompt per turn (see [`prompt::single_prompt`]).
//! The raw [`GeminiApiAgent::complete`] call is also used for topic suggestions.

use crate::config::{DEFAULT_GEMINI_MODEL, ProviderSecret};
use crate::http::{build_client, error_from_response, map_send_error};
use crate::prompt;
use async_trait::async_trait;
use parley_core::config::GenerationSettings;
use parley_core::error::{ParleyError, Result};
use parley_core::generation::{GenerationRequest, ResponseGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Generator that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl GeminiApiAgent {
    /// Creates an agent with the provided API key, model and request settings.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        settings: &GenerationSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout())?,
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    /// Creates an agent from a `secret.json` entry.
    pub fn from_secret(secret: &ProviderSecret, settings: &GenerationSettings) -> Result<Self> {
        Self::new(
            secret.api_key.clone(),
            secret.model_or(DEFAULT_GEMINI_MODEL),
            settings,
        )
    }

    /// Points the agent at another models root (e.g. a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `text` as a single user turn and returns the reply text.
    pub async fn complete(&self, text: impl Into<String>) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: text.into() }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            }),
        };
        self.send_request(&body).await
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| map_send_error(PROVIDER, err))?;

        if !response.status().is_success() {
            return Err(error_from_response(PROVIDER, response).await);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| ParleyError::generation(PROVIDER, format!("Failed to parse response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ResponseGenerator for GeminiApiAgent {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let text = prompt::single_prompt(request)?;
        debug!(
            target: "parley::adapter",
            provider = PROVIDER,
            model = %self.model,
            persona = %request.persona.id,
            history = request.history.len(),
            "sending generateContent"
        );
        self.complete(text).await
    }

    async fn probe(&self) -> Result<()> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: "Hello".to_string(),
                }],
            }],
            generation_config: None,
        };
        self.send_request(&body).await.map(|_| ())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ParleyError::generation(PROVIDER, "API returned no text in the response candidates")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::context::opening_request;
    use parley_core::persona::get_default_presets;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn agent(server: &MockServer) -> GeminiApiAgent {
        GeminiApiAgent::new("gm-test", DEFAULT_GEMINI_MODEL, &GenerationSettings::default())
            .unwrap()
            .with_base_url(server.uri())
    }

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    #[tokio::test]
    async fn sends_rendered_prompt_to_model_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "gm-test"))
            .respond_with(reply("Pineapple is sweet chaos."))
            .expect(1)
            .mount(&server)
            .await;

        let wit = get_default_presets()[4].clone();
        let request = opening_request("Is pineapple on pizza acceptable?", &wit);

        let text = agent(&server).generate(&request).await.unwrap();
        assert_eq!(text, "Pineapple is sweet chaos.");

        let received = &server.received_requests().await.unwrap()[0];
        let body: serde_json::Value = received.body_json().unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.starts_with(&wit.system_prompt));
        assert!(prompt.contains("Please start the discussion"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 150);
    }

    #[tokio::test]
    async fn missing_candidates_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = agent(&server).complete("Hello").await.unwrap_err();
        assert!(err.is_generation());
    }

    #[tokio::test]
    async fn server_errors_are_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let err = agent(&server).complete("Hello").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("The model is overloaded."));
    }
}
