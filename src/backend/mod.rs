//! Retrieval backend contracts.
//!
//! The chain depends on two capabilities: a structured answerer (graph QA
//! over the admissions graph) and a semantic retriever (vector similarity
//! over passage embeddings). Both are enums over concrete adapters —
//! the same enum-dispatch pattern as [`crate::llm::LlmProvider`] — so the
//! chain needs no trait objects. `Http` variants talk to external services;
//! `Fixture` variants are scripted in-process backends for offline runs and
//! tests.
//!
//! Query translation and embedding computation live behind the HTTP
//! services; this crate only ships the question (plus the fixed graph schema
//! description) and consumes the results.

pub mod fixture;
pub mod graph;
pub mod semantic;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendsConfig;

// ── Result types ──────────────────────────────────────────────────────────────

/// Best-effort answer from the structured graph backend.
///
/// "No result" is an empty `answer`, never an error — errors mean the
/// backend itself was unreachable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphAnswer {
    pub answer: String,
    /// Ordered, opaque records of the intermediate query/reasoning steps,
    /// kept for transparency. May be empty.
    #[serde(default)]
    pub trace: Vec<serde_json::Value>,
}

/// One passage returned by the semantic backend, most relevant first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    /// Source metadata (document title, section, …) when the index has it.
    #[serde(default)]
    pub source: Option<String>,
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Structured backend failure — always fatal for the request.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("graph backend unreachable: {0}")]
    Unreachable(String),
    #[error("graph backend returned malformed response: {0}")]
    BadResponse(String),
}

/// Semantic backend failure — degradable: the chain converts any variant
/// into the empty-passages fallback and keeps going.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("semantic backend unreachable: {0}")]
    Unavailable(String),
    #[error("semantic backend returned malformed response: {0}")]
    BadResponse(String),
}

// ── Graph schema ──────────────────────────────────────────────────────────────

/// Fixed description of the admissions graph, sent to the structured backend
/// with every question so its query generation has the schema in hand.
pub const GRAPH_SCHEMA: &str = "\
NODES:
- University: name, location, rank, tuition_fee, acceptance_rate, website
- Location: name, city, state, country
- Program: name
- Requirements: university_name, minimum_gpa
- Test: name (SAT, TOEFL, ...)
- Scholarship: type (Need-based, Merit-based, Athletic, ...)
- Tier: name (Top 10, Top 25, Top 50, Other)
- FeeRange: range (High, Medium, Low)
- AcceptanceCategory: category (Highly Selective, Selective, Moderately Selective)

RELATIONSHIPS:
- (University)-[:LOCATED_IN]->(Location)
- (University)-[:OFFERS]->(Program)
- (University)-[:HAS_REQUIREMENTS]->(Requirements)
- (University)-[:REQUIRES_TEST]->(Test)
- (University)-[:OFFERS_SCHOLARSHIP]->(Scholarship)
- (University)-[:BELONGS_TO_TIER]->(Tier)
- (University)-[:HAS_FEE_RANGE]->(FeeRange)
- (University)-[:HAS_ACCEPTANCE_RATE]->(AcceptanceCategory)
- (Requirements)-[:INCLUDES_TEST]->(Test)

EXAMPLE MAPPINGS:
- \"universities in California\" -> (u:University)-[:LOCATED_IN]->(l:Location) WHERE toLower(l.state) CONTAINS 'california'
- \"top 10 universities\" -> (u:University)-[:BELONGS_TO_TIER]->(t:Tier {name: 'Top 10'})
- \"universities offering computer science\" -> (u:University)-[:OFFERS]->(p:Program) WHERE toLower(p.name) CONTAINS 'computer science'";

// ── Backend enums ─────────────────────────────────────────────────────────────

/// Structured (graph QA) backend.
#[derive(Debug, Clone)]
pub enum StructuredBackend {
    Http(graph::GraphQaClient),
    Fixture(fixture::FixtureGraph),
}

impl StructuredBackend {
    /// Ask the graph backend for a best-effort answer plus its trace.
    pub async fn answer(&self, question: &str) -> Result<GraphAnswer, BackendError> {
        match self {
            StructuredBackend::Http(c) => c.answer(question).await,
            StructuredBackend::Fixture(f) => f.answer(question),
        }
    }

    /// Reachability probe for the health endpoint.
    pub async fn ping(&self) -> Result<(), BackendError> {
        match self {
            StructuredBackend::Http(c) => c.ping().await,
            StructuredBackend::Fixture(_) => Ok(()),
        }
    }
}

/// Semantic (vector similarity) backend.
#[derive(Debug, Clone)]
pub enum SemanticBackend {
    Http(semantic::VectorSearchClient),
    Fixture(fixture::FixtureSemantic),
}

impl SemanticBackend {
    /// Retrieve up to `top_k` passages ranked by relevance.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<Passage>, RetrievalError> {
        match self {
            SemanticBackend::Http(c) => c.retrieve(question, top_k).await,
            SemanticBackend::Fixture(f) => f.retrieve(top_k),
        }
    }
}

/// Build both backends from config. `kind = "fixture"` wires the scripted
/// in-process pair (offline demos); anything else gets the HTTP adapters.
pub fn build(config: &BackendsConfig) -> Result<(StructuredBackend, SemanticBackend), BackendError> {
    if config.kind == "fixture" {
        return Ok((
            StructuredBackend::Fixture(fixture::FixtureGraph::default()),
            SemanticBackend::Fixture(fixture::FixtureSemantic::default()),
        ));
    }

    let graph = graph::GraphQaClient::new(
        config.graph.endpoint.clone(),
        config.graph.timeout_seconds,
    )?;
    let vector = semantic::VectorSearchClient::new(
        config.vector.endpoint.clone(),
        config.vector.timeout_seconds,
    )
    .map_err(|e| BackendError::Unreachable(e.to_string()))?;

    Ok((StructuredBackend::Http(graph), SemanticBackend::Http(vector)))
}
