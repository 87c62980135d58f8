//! HTTP adapter for the vector similarity search service.
//!
//! The service owns embedding computation and the vector index; this client
//! ships `{question, top_k}` and gets back ranked passages.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{Passage, RetrievalError};

#[derive(Debug, Clone)]
pub struct VectorSearchClient {
    client: Client,
    endpoint: String,
}

impl VectorSearchClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| RetrievalError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Retrieve up to `top_k` passages, most relevant first. May return
    /// fewer, or none.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<Passage>, RetrievalError> {
        let payload = SearchRequest { question, top_k };

        debug!(endpoint = %self.endpoint, top_k, "sending semantic search request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "semantic search failed (transport)");
                RetrievalError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            error!(%status, %body, "semantic search returned HTTP error");
            return Err(RetrievalError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| RetrievalError::BadResponse(e.to_string()))?;

        debug!(passages = parsed.passages.len(), "received semantic search response");

        Ok(parsed.passages)
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    question: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    passages: Vec<Passage>,
}
