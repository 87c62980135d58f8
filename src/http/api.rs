//! Axum handlers for the chat API.
//!
//! Each handler receives [`ApiState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Status mapping: blank question → 400,
//! backend or synthesis failure → 500.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::chain::{ChainError, Mode};

use super::ApiState;

/// Upper bound on one chat round-trip (two backends + one model call).
const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(super) struct ChatRequest {
    question: String,
    /// Per-request mode override; absent = process default.
    graph_only: Option<bool>,
    #[serde(default)]
    include_context: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ModeRequest {
    graph_only: bool,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn mode_body(mode: Mode) -> Json<serde_json::Value> {
    Json(json!({ "graph_only": mode.is_graph_only(), "mode": mode }))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /health — probes the structured backend.
pub(super) async fn health(State(state): State<ApiState>) -> Response {
    match tokio::time::timeout(Duration::from_secs(5), state.chain.ping_structured()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "health probe failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "health probe timed out".to_string(),
        )
            .into_response(),
    }
}

/// POST /chat
pub(super) async fn chat(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let override_mode = req.graph_only.map(|graph_only| {
        if graph_only { Mode::GraphOnly } else { Mode::Hybrid }
    });

    let outcome = match tokio::time::timeout(
        CHAT_TIMEOUT,
        state.chain.answer(&req.question, override_mode),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            return (
                StatusCode::GATEWAY_TIMEOUT,
                json_error("timeout", "chat request timed out"),
            )
                .into_response();
        }
    };

    match outcome {
        Ok(response) => {
            let mut body = json!({
                "answer": response.result.final_answer,
                "cached": response.cached,
                "elapsed_ms": response.elapsed_ms,
                "mode": response.result.mode,
                "graph_used": response.result.used_structured,
                "semantic_used": response.result.used_semantic,
            });
            if req.include_context {
                body["graph_answer"] = json!(response.result.structured_answer);
                body["semantic_chunks"] = json!(response.result.semantic_passage_count);
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(ChainError::InvalidInput(msg)) => {
            (StatusCode::BAD_REQUEST, json_error("invalid_input", msg)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json_error("inference_failed", e),
            )
                .into_response()
        }
    }
}

/// POST /clear-cache
pub(super) async fn clear_cache(State(state): State<ApiState>) -> Response {
    state.chain.clear_cache();
    (StatusCode::OK, Json(json!({ "cleared": true }))).into_response()
}

/// GET /mode
pub(super) async fn mode_get(State(state): State<ApiState>) -> Response {
    (StatusCode::OK, mode_body(state.chain.mode().default_mode())).into_response()
}

/// POST /mode — sets the process-wide default; requests already in flight
/// keep the mode they resolved at dispatch.
pub(super) async fn mode_set(
    State(state): State<ApiState>,
    Json(req): Json<ModeRequest>,
) -> Response {
    let mode = if req.graph_only { Mode::GraphOnly } else { Mode::Hybrid };
    state.chain.mode().set_default(mode);
    (StatusCode::OK, mode_body(mode)).into_response()
}
