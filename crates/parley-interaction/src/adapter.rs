//! Response generation adapter.
//!
//! Routes each request to the provider bound to the speaking persona's
//! backend. Whether the session runs live or on the deterministic fallback
//! is decided once, when the adapter is selected, and never changes.

use crate::config::SecretConfig;
use crate::fallback::FallbackGenerator;
use crate::gemini_api_agent::GeminiApiAgent;
use crate::openai_api_agent::OpenAIApiAgent;
use async_trait::async_trait;
use parley_core::config::GenerationSettings;
use parley_core::error::{ParleyError, Result};
use parley_core::generation::{GenerationRequest, ResponseGenerator};
use parley_core::persona::PersonaBackend;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const TARGET: &str = "parley::adapter";

/// Which capability serves the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterMode {
    /// At least one hosted provider is reachable
    Live,
    /// No hosted provider is reachable; canned replies only
    Fallback,
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterMode::Live => write!(f, "live"),
            AdapterMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// The generator handed to the turn coordinator.
pub struct GenerationAdapter {
    mode: AdapterMode,
    providers: HashMap<PersonaBackend, Arc<dyn ResponseGenerator>>,
    fallback: FallbackGenerator,
}

impl GenerationAdapter {
    /// Builds providers for the configured keys and fixes the session mode.
    ///
    /// With `probe_on_start`, each provider is probed once and dropped if the
    /// probe fails.
    pub async fn select(secrets: &SecretConfig, settings: &GenerationSettings) -> Result<Self> {
        let mut candidates: Vec<(PersonaBackend, Arc<dyn ResponseGenerator>)> = Vec::new();
        if let Some(secret) = &secrets.openai {
            let agent: Arc<dyn ResponseGenerator> =
                Arc::new(OpenAIApiAgent::from_secret(secret, settings)?);
            candidates.push((PersonaBackend::OpenAi, agent));
        }
        if let Some(secret) = &secrets.gemini {
            let agent: Arc<dyn ResponseGenerator> =
                Arc::new(GeminiApiAgent::from_secret(secret, settings)?);
            candidates.push((PersonaBackend::Gemini, agent));
        }
        let fallback = FallbackGenerator::default();
        Ok(Self::select_from(candidates, settings.probe_on_start, fallback).await)
    }

    /// Like [`GenerationAdapter::select`], over already-built providers.
    pub async fn select_from(
        candidates: Vec<(PersonaBackend, Arc<dyn ResponseGenerator>)>,
        probe: bool,
        fallback: FallbackGenerator,
    ) -> Self {
        let mut providers = HashMap::new();
        for (backend, provider) in candidates {
            if probe {
                if let Err(err) = provider.probe().await {
                    warn!(target: TARGET, %backend, error = %err, "provider probe failed");
                    continue;
                }
            }
            providers.insert(backend, provider);
        }

        if providers.is_empty() {
            info!(target: TARGET, "no hosted provider reachable; using fallback replies");
            Self::fallback(fallback)
        } else {
            let adapter = Self {
                mode: AdapterMode::Live,
                providers,
                fallback,
            };
            info!(target: TARGET, backends = ?adapter.backends(), "live generation selected");
            adapter
        }
    }

    /// An adapter that only serves fallback replies.
    pub fn fallback(fallback: FallbackGenerator) -> Self {
        Self {
            mode: AdapterMode::Fallback,
            providers: HashMap::new(),
            fallback,
        }
    }

    pub fn mode(&self) -> AdapterMode {
        self.mode
    }

    /// Backends with a live provider, sorted by name.
    pub fn backends(&self) -> Vec<PersonaBackend> {
        let mut backends: Vec<_> = self.providers.keys().copied().collect();
        backends.sort_by_key(|b| b.to_string());
        backends
    }
}

#[async_trait]
impl ResponseGenerator for GenerationAdapter {
    fn name(&self) -> &str {
        match self.mode {
            AdapterMode::Live => "live",
            AdapterMode::Fallback => "fallback",
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self.mode {
            AdapterMode::Fallback => self.fallback.generate(request).await,
            AdapterMode::Live => {
                let backend = request.persona.backend;
                let provider = self.providers.get(&backend).ok_or_else(|| {
                    ParleyError::generation(
                        backend.to_string(),
                        format!(
                            "no reachable provider for persona '{}'",
                            request.persona.id
                        ),
                    )
                })?;
                provider.generate(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::context::opening_request;
    use parley_core::persona::get_default_presets;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        reachable: bool,
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(reachable: bool, reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reachable,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ResponseGenerator for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reachable {
                Ok(self.reply.to_string())
            } else {
                Err(ParleyError::generation("stub", "offline"))
            }
        }

        async fn probe(&self) -> Result<()> {
            if self.reachable {
                Ok(())
            } else {
                Err(ParleyError::generation("stub", "offline"))
            }
        }
    }

    fn dyn_provider(provider: &Arc<StubProvider>) -> Arc<dyn ResponseGenerator> {
        provider.clone()
    }

    fn persona(id: &str) -> parley_core::persona::Persona {
        get_default_presets()
            .into_iter()
            .find(|p| p.id == id)
            .unwrap()
    }

    #[tokio::test]
    async fn routes_by_persona_backend() {
        let openai = StubProvider::new(true, "from openai");
        let gemini = StubProvider::new(true, "from gemini");
        let adapter = GenerationAdapter::select_from(
            vec![
                (PersonaBackend::OpenAi, dyn_provider(&openai)),
                (PersonaBackend::Gemini, dyn_provider(&gemini)),
            ],
            true,
            FallbackGenerator::default(),
        )
        .await;

        assert_eq!(adapter.mode(), AdapterMode::Live);
        let scholar = opening_request("Pizza", &persona("scholar"));
        let wit = opening_request("Pizza", &persona("wit"));
        assert_eq!(adapter.generate(&scholar).await.unwrap(), "from openai");
        assert_eq!(adapter.generate(&wit).await.unwrap(), "from gemini");
    }

    #[tokio::test]
    async fn unreachable_providers_fall_back_for_the_session() {
        let adapter = GenerationAdapter::select_from(
            vec![(PersonaBackend::OpenAi, dyn_provider(&StubProvider::new(false, "")))],
            true,
            FallbackGenerator::default(),
        )
        .await;

        assert_eq!(adapter.mode(), AdapterMode::Fallback);
        assert_eq!(adapter.name(), "fallback");
        let request = opening_request("Pizza", &persona("scholar"));
        assert!(adapter.generate(&request).await.unwrap().contains("Pizza"));
    }

    #[tokio::test]
    async fn live_mode_does_not_fall_back_mid_session() {
        let openai = StubProvider::new(true, "from openai");
        let adapter = GenerationAdapter::select_from(
            vec![(PersonaBackend::OpenAi, dyn_provider(&openai))],
            true,
            FallbackGenerator::default(),
        )
        .await;

        let wit = opening_request("Pizza", &persona("wit"));
        let err = adapter.generate(&wit).await.unwrap_err();
        assert!(err.is_generation());
        assert!(err.to_string().contains("wit"));
        assert_eq!(adapter.backends(), vec![PersonaBackend::OpenAi]);
    }

    #[tokio::test]
    async fn no_secrets_select_fallback_without_network() {
        let adapter = GenerationAdapter::select(&SecretConfig::default(), &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(adapter.mode(), AdapterMode::Fallback);
    }

    #[tokio::test]
    async fn probing_can_be_skipped() {
        let provider = StubProvider::new(false, "");
        let adapter = GenerationAdapter::select_from(
            vec![(PersonaBackend::Gemini, dyn_provider(&provider))],
            false,
            FallbackGenerator::default(),
        )
        .await;

        assert_eq!(adapter.mode(), AdapterMode::Live);
        let err = adapter
            .generate(&opening_request("Pizza", &persona("wit")))
            .await
            .unwrap_err();
        assert!(err.is_generation());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
