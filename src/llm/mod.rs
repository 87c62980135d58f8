//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency;
//! adding a backend = new module + new variant + new `complete` arm.

pub mod providers;

use thiserror::Error;

use crate::config::LlmConfig;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Build the provider named in config. `api_key` comes from the
    /// `LLM_API_KEY` env var — `None` is fine for keyless local endpoints
    /// and for the dummy provider.
    pub fn from_config(config: &LlmConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        match config.provider.as_str() {
            "dummy" => Ok(LlmProvider::Dummy(providers::dummy::DummyProvider)),
            "openai" => Ok(LlmProvider::OpenAiCompatible(
                providers::openai_compatible::OpenAiCompatibleProvider::new(
                    config.openai.api_base_url.clone(),
                    config.openai.model.clone(),
                    config.openai.temperature,
                    config.openai.timeout_seconds,
                    api_key,
                )?,
            )),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    /// Send `prompt` to the provider and return its text reply.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(prompt).await,
        }
    }

    /// Probe provider reachability. Cheap; used by startup diagnostics.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) => Ok(()),
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }
}
