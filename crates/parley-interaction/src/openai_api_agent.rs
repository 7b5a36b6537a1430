//! OpenAIApiAgent - Chat Completions provider.
//!
//! History entries become `assistant` turns (the speaker's own words) or
//! `user` turns prefixed with "Other participant:"; the closing instruction
//! is the final `user` message.

use crate::config::{DEFAULT_OPENAI_MODEL, ProviderSecret};
use crate::http::{build_client, error_from_response, map_send_error};
use crate::prompt;
use async_trait::async_trait;
use parley_core::config::GenerationSettings;
use parley_core::error::{ParleyError, Result};
use parley_core::generation::{GenerationRequest, ResponseGenerator, Speaker};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER: &str = "openai";
const BASE_URL: &str = "https://api.openai.com/v1";

/// Generator that talks to the OpenAI HTTP API.
#[derive(Clone)]
pub struct OpenAIApiAgent {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIApiAgent {
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
            secret.model_or(DEFAULT_OPENAI_MODEL),
            settings,
        )
    }

    /// Points the agent at another API root (e.g. a proxy or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages(request: &GenerationRequest) -> Result<Vec<ChatMessage>> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage::new("system", prompt::system_prompt(request)?));

        for entry in &request.history {
            let message = match entry.speaker {
                Speaker::Own => ChatMessage::new("assistant", entry.text.clone()),
                Speaker::Other => {
                    ChatMessage::new("user", format!("Other participant: {}", entry.text))
                }
            };
            messages.push(message);
        }

        messages.push(ChatMessage::new(
            "user",
            prompt::closing_instruction(request, false),
        ));
        Ok(messages)
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| map_send_error(PROVIDER, err))?;

        if !response.status().is_success() {
            return Err(error_from_response(PROVIDER, response).await);
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| ParleyError::generation(PROVIDER, format!("Failed to parse response: {err}")))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ResponseGenerator for OpenAIApiAgent {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request)?,
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };
        debug!(
            target: "parley::adapter",
            provider = PROVIDER,
            model = %self.model,
            persona = %request.persona.id,
            messages = body.messages.len(),
            "sending chat completion"
        );
        self.send_request(&body).await
    }

    async fn probe(&self) -> Result<()> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::new("user", "Hello".to_string())],
            max_tokens: 5,
            temperature: None,
        };
        self.send_request(&body).await.map(|_| ())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn new(role: &'static str, content: String) -> Self {
        Self { role, content }
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ParleyError::generation(PROVIDER, "API returned no content in the response"))
}
