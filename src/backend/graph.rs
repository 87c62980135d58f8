//! HTTP adapter for the structured graph QA service.
//!
//! The service owns query translation and execution against the admissions
//! graph; this client ships `{question, schema}` and gets back a best-effort
//! answer plus an ordered trace of intermediate steps. Wire types are private
//! to this module.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{BackendError, GraphAnswer, GRAPH_SCHEMA};

#[derive(Debug, Clone)]
pub struct GraphQaClient {
    client: Client,
    endpoint: String,
}

impl GraphQaClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| BackendError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Reachability probe — HEAD with a hard 5-second timeout. Any HTTP
    /// response (including 4xx) means the service is up; only transport
    /// failures count as unreachable.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| BackendError::Unreachable(format!("failed to build ping client: {e}")))?;
        client
            .head(&self.endpoint)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Unreachable(format!("unreachable: {e}")))
    }

    /// One question → one answer + trace. A service-side "no result" comes
    /// back as an empty answer, not an error.
    pub async fn answer(&self, question: &str) -> Result<GraphAnswer, BackendError> {
        let payload = QaRequest { question, schema: GRAPH_SCHEMA };

        debug!(endpoint = %self.endpoint, question_len = question.len(), "sending graph QA request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "graph QA request failed (transport)");
                BackendError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            error!(%status, %body, "graph QA request returned HTTP error");
            return Err(BackendError::Unreachable(format!("HTTP {status}: {body}")));
        }

        let parsed = response
            .json::<QaResponse>()
            .await
            .map_err(|e| BackendError::BadResponse(e.to_string()))?;

        debug!(
            answer_len = parsed.answer.len(),
            trace_steps = parsed.steps.len(),
            "received graph QA response"
        );

        Ok(GraphAnswer {
            answer: parsed.answer,
            trace: parsed.steps,
        })
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    question: &'a str,
    schema: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaResponse {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    steps: Vec<serde_json::Value>,
}
