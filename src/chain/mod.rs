//! Hybrid query chain — the orchestrator tying cache, mode control, the two
//! retrieval backends and the synthesizer into one `answer` operation.
//!
//! Per request: resolve the effective mode, check the cache, fan out to the
//! backends (both run concurrently in hybrid mode), synthesize one final
//! answer, cache it, return it with timing. A structured-backend outage is
//! fatal; a semantic-backend failure degrades to zero passages and the
//! request proceeds. Only fully-formed results are cached — a failing
//! question is recomputed fresh on every call until it succeeds.

pub mod cache;
pub mod mode;
pub mod synth;

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, SemanticBackend, StructuredBackend};
use crate::config::ChainConfig;
use crate::llm::LlmProvider;

pub use cache::{CacheKey, ResponseCache, SharedCache};
pub use mode::{Mode, ModeController};
pub use synth::Synthesizer;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChainError {
    /// Blank question — rejected at the boundary, never cached.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Structured backend unreachable — fatal, nothing cached. No retry
    /// here; retries belong to the backend adapter or the caller.
    #[error(transparent)]
    GraphBackend(#[from] BackendError),

    /// Model call failed — fatal, nothing cached.
    #[error("answer synthesis failed: {0}")]
    Synthesis(String),
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// The cached answer payload. Immutable once stored; destroyed only by LRU
/// eviction or a full cache clear.
#[derive(Debug, Clone, Serialize)]
pub struct ChainResult {
    pub final_answer: String,
    pub mode: Mode,
    /// Structured answer text (with any degradation note appended), absent
    /// when the graph produced nothing and retrieval did not degrade.
    pub structured_answer: Option<String>,
    /// Passages actually fed into synthesis (post-truncation).
    pub semantic_passage_count: usize,
    /// Whether the graph backend produced a non-empty answer.
    pub used_structured: bool,
    /// Whether any semantic passages made it into synthesis.
    pub used_semantic: bool,
}

/// One `answer` call's outcome: the result plus request metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ChainResponse {
    #[serde(flatten)]
    pub result: ChainResult,
    pub cached: bool,
    /// Wall-clock time for the backend + synthesis work; zero on cache hits.
    pub elapsed_ms: f64,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct HybridChain {
    structured: StructuredBackend,
    semantic: SemanticBackend,
    synth: Synthesizer,
    cache: SharedCache,
    mode: ModeController,
    top_k: usize,
}

impl HybridChain {
    pub fn new(
        structured: StructuredBackend,
        semantic: SemanticBackend,
        llm: LlmProvider,
        config: &ChainConfig,
    ) -> Self {
        let default_mode = if config.default_graph_only {
            Mode::GraphOnly
        } else {
            Mode::Hybrid
        };
        Self {
            structured,
            semantic,
            synth: Synthesizer::new(llm),
            cache: SharedCache::new(config.cache_capacity),
            mode: ModeController::new(default_mode),
            top_k: config.top_k,
        }
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    /// Replace the cache with a fresh empty instance.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("response cache cleared");
    }

    /// Health probe against the structured backend.
    pub async fn ping_structured(&self) -> Result<(), BackendError> {
        self.structured.ping().await
    }

    /// Answer one question. `override_mode` wins over the process default
    /// for this call only.
    pub async fn answer(
        &self,
        question: &str,
        override_mode: Option<Mode>,
    ) -> Result<ChainResponse, ChainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChainError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let mode = self.mode.effective(override_mode);
        let key = CacheKey::new(question, mode);
        let cache = self.cache.current();

        if let Some(result) = cache.get(&key) {
            debug!(%mode, "cache hit");
            return Ok(ChainResponse {
                result,
                cached: true,
                elapsed_ms: 0.0,
            });
        }

        let started = Instant::now();

        // Fan out. The structured backend is always consulted; in hybrid
        // mode the semantic retrieval runs concurrently with it.
        let (graph_result, semantic_result) = match mode {
            Mode::GraphOnly => (self.structured.answer(question).await, None),
            Mode::Hybrid => {
                let (g, s) = tokio::join!(
                    self.structured.answer(question),
                    self.semantic.retrieve(question, self.top_k),
                );
                (g, Some(s))
            }
        };

        // Fatal: the graph backend itself was unreachable. An *empty* graph
        // answer is not an error — it flows into synthesis as-is.
        let graph = graph_result?;
        let used_structured = !graph.answer.trim().is_empty();
        let mut structured_answer = graph.answer;

        // Semantic failure is non-fatal: note it inline and continue with
        // zero passages.
        let mut passages = match semantic_result {
            None => Vec::new(),
            Some(Ok(passages)) => passages,
            Some(Err(e)) => {
                warn!(error = %e, "semantic retrieval failed — continuing without passages");
                if !structured_answer.is_empty() {
                    structured_answer.push('\n');
                }
                structured_answer.push_str(&format!("(note: semantic retrieval failed: {e})"));
                Vec::new()
            }
        };
        passages.truncate(synth::MAX_PASSAGES);

        let final_answer = self
            .synth
            .synthesize(question, &structured_answer, &passages, &graph.trace)
            .await?;

        let result = ChainResult {
            final_answer,
            mode,
            structured_answer: (!structured_answer.is_empty()).then_some(structured_answer),
            semantic_passage_count: passages.len(),
            used_structured,
            used_semantic: !passages.is_empty(),
        };

        cache.set(key, result.clone());

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            %mode,
            elapsed_ms,
            used_structured = result.used_structured,
            passages = result.semantic_passage_count,
            "answer synthesized"
        );

        Ok(ChainResponse {
            result,
            cached: false,
            elapsed_ms,
        })
    }
}
