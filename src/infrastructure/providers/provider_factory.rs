use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::TranscriptionProvider;
use crate::application::services::{BackoffPolicy, ProviderPool, ProviderRegistry};
use crate::domain::ProviderChoice;

use super::assemblyai::AssemblyAiProvider;
use super::gemini::GeminiProvider;
use super::openai_gpt4o::OpenAiGpt4oProvider;
use super::openai_whisper::OpenAiWhisperProvider;

/// Runtime configuration for one backend: credentials, request shaping
/// overrides, and its pool/retry policy.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub request_timeout_secs: u64,
    pub max_context_len: usize,
}

pub struct ProviderFactory;

impl ProviderFactory {
    /// Builds the closed adapter set with one shared pool per provider.
    pub fn build(configs: &[(ProviderChoice, ProviderConfig)]) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (choice, config) in configs {
            let provider: Arc<dyn TranscriptionProvider> = match choice {
                ProviderChoice::AssemblyAi => Arc::new(AssemblyAiProvider::new(
                    config.api_key.clone(),
                    config.base_url.clone(),
                )),
                ProviderChoice::Whisper => Arc::new(OpenAiWhisperProvider::new(
                    config.api_key.clone(),
                    config.base_url.clone(),
                    config.model.clone(),
                    config.max_context_len,
                )),
                ProviderChoice::Gpt4o => Arc::new(OpenAiGpt4oProvider::new(
                    config.api_key.clone(),
                    config.base_url.clone(),
                    config.model.clone(),
                    config.max_context_len,
                )),
                ProviderChoice::Gemini => Arc::new(GeminiProvider::new(
                    config.api_key.clone(),
                    config.base_url.clone(),
                    config.model.clone(),
                    config.max_context_len,
                )),
            };
            let pool = Arc::new(ProviderPool::new(
                config.concurrency,
                config.max_attempts,
                BackoffPolicy::new(
                    Duration::from_millis(config.backoff_base_ms),
                    Duration::from_millis(config.backoff_cap_ms),
                ),
                Duration::from_secs(config.request_timeout_secs),
            ));
            registry.register(*choice, provider, pool);
        }
        registry
    }
}
