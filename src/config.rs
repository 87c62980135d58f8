//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or a path given via `-f/--config`), then
//! applies the `EDUCONNECT_LOG_LEVEL` env override. The LLM API key comes
//! from the `LLM_API_KEY` env var only — never from TOML.

use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::AppError;

// ── Resolved types ────────────────────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the axum listener binds to.
    pub bind: String,
}

/// Hybrid chain tuning.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Response cache capacity (entries).
    pub cache_capacity: usize,
    /// Passages requested from the semantic backend per query.
    pub top_k: usize,
    /// Whether the process-wide default mode is graph-only.
    pub default_graph_only: bool,
}

/// One backend HTTP endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Full URL of the backend service endpoint.
    pub endpoint: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Retrieval backend configuration.
#[derive(Debug, Clone)]
pub struct BackendsConfig {
    /// `"http"` for live services, `"fixture"` for the in-process scripted
    /// backends (offline demos, tests).
    pub kind: String,
    pub graph: EndpointConfig,
    pub vector: EndpointConfig,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM provider selection + per-provider settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server: ServerConfig,
    pub chain: ChainConfig,
    pub backends: BackendsConfig,
    pub llm: LlmConfig,
    /// From `LLM_API_KEY` env — never TOML.
    pub llm_api_key: Option<String>,
}

// ── Raw TOML shapes ───────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    chain: RawChain,
    #[serde(default)]
    backends: RawBackends,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Deserialize)]
struct RawChain {
    #[serde(default = "default_cache_capacity")]
    cache_capacity: usize,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_true")]
    default_graph_only: bool,
}

impl Default for RawChain {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            top_k: default_top_k(),
            default_graph_only: true,
        }
    }
}

#[derive(Deserialize)]
struct RawBackends {
    #[serde(default = "default_backends_kind")]
    kind: String,
    #[serde(default = "RawEndpoint::graph_default")]
    graph: RawEndpoint,
    #[serde(default = "RawEndpoint::vector_default")]
    vector: RawEndpoint,
}

impl Default for RawBackends {
    fn default() -> Self {
        Self {
            kind: default_backends_kind(),
            graph: RawEndpoint::graph_default(),
            vector: RawEndpoint::vector_default(),
        }
    }
}

#[derive(Deserialize)]
struct RawEndpoint {
    endpoint: String,
    #[serde(default = "default_backend_timeout_seconds")]
    timeout_seconds: u64,
}

impl RawEndpoint {
    fn graph_default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7474/qa".to_string(),
            timeout_seconds: default_backend_timeout_seconds(),
        }
    }

    fn vector_default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:7474/search".to_string(),
            timeout_seconds: default_backend_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

fn default_bind() -> String { "0.0.0.0:8000".to_string() }
fn default_cache_capacity() -> usize { 128 }
fn default_top_k() -> usize { 6 }
fn default_backends_kind() -> String { "http".to_string() }
fn default_backend_timeout_seconds() -> u64 { 30 }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_true() -> bool { true }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. If no path is given and `config/default.toml` does not
/// exist, returns the hardcoded minimal default.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("EDUCONNECT_LOG_LEVEL").ok();
    let api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty());

    if let Some(path) = config_path {
        return load_from(Path::new(path), log_level_override.as_deref(), api_key);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, log_level_override.as_deref(), api_key)
    } else {
        Ok(resolve(RawConfig::default(), log_level_override.as_deref(), api_key))
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    llm_api_key: Option<String>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if parsed.chain.cache_capacity == 0 {
        return Err(AppError::Config(
            "chain.cache_capacity must be at least 1".to_string(),
        ));
    }

    Ok(resolve(parsed, log_level_override, llm_api_key))
}

fn resolve(
    raw: RawConfig,
    log_level_override: Option<&str>,
    llm_api_key: Option<String>,
) -> Config {
    let log_level = log_level_override
        .map(ToString::to_string)
        .or(raw.log_level)
        .unwrap_or_else(|| "info".to_string());

    Config {
        log_level,
        server: ServerConfig { bind: raw.server.bind },
        chain: ChainConfig {
            cache_capacity: raw.chain.cache_capacity,
            top_k: raw.chain.top_k,
            default_graph_only: raw.chain.default_graph_only,
        },
        backends: BackendsConfig {
            kind: raw.backends.kind,
            graph: EndpointConfig {
                endpoint: raw.backends.graph.endpoint,
                timeout_seconds: raw.backends.graph.timeout_seconds,
            },
            vector: EndpointConfig {
                endpoint: raw.backends.vector.endpoint,
                timeout_seconds: raw.backends.vector.timeout_seconds,
            },
        },
        llm: LlmConfig {
            provider: raw.llm.provider,
            openai: OpenAiConfig {
                api_base_url: raw.llm.openai.api_base_url,
                model: raw.llm.openai.model,
                temperature: raw.llm.openai.temperature,
                timeout_seconds: raw.llm.openai.timeout_seconds,
            },
        },
        llm_api_key,
    }
}
