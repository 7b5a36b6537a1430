//! Generation capabilities behind the coordinator's `ResponseGenerator` seam:
//! the hosted OpenAI and Gemini providers, the deterministic fallback, the
//! adapter that picks between them, and topic suggestions.

pub mod adapter;
pub mod config;
pub mod fallback;
pub mod gemini_api_agent;
mod http;
pub mod openai_api_agent;
pub mod prompt;
pub mod topic_service;

pub use adapter::{AdapterMode, GenerationAdapter};
pub use config::{ProviderSecret, SecretConfig};
pub use fallback::FallbackGenerator;
pub use gemini_api_agent::GeminiApiAgent;
pub use openai_api_agent::OpenAIApiAgent;
pub use topic_service::{GeminiTopicSuggester, TopicService};
