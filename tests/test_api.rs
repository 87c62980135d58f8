//! Router-level tests: request/response shapes and status mapping.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use educonnect::backend::fixture::{FixtureGraph, FixtureSemantic};
use educonnect::backend::{SemanticBackend, StructuredBackend};
use educonnect::chain::HybridChain;
use educonnect::config::ChainConfig;
use educonnect::http::{build_router, ApiState};
use educonnect::llm::providers::dummy::DummyProvider;
use educonnect::llm::LlmProvider;

// ── helpers ──────────────────────────────────────────────────────────────────

fn test_router(default_graph_only: bool) -> Router {
    let config = ChainConfig {
        cache_capacity: 8,
        top_k: 6,
        default_graph_only,
    };
    let chain = Arc::new(HybridChain::new(
        StructuredBackend::Fixture(FixtureGraph::default()),
        SemanticBackend::Fixture(FixtureSemantic::default()),
        LlmProvider::Dummy(DummyProvider),
        &config,
    ));
    build_router(ApiState { chain })
}

async fn send_json(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ── health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let router = test_router(true);
    let (status, body) = send_json(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ── chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_answers_and_caches() {
    let router = test_router(true);

    let (status, body) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({ "question": "top 10 universities" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(body["mode"], "graph_only");
    assert_eq!(body["graph_used"], true);
    assert_eq!(body["semantic_used"], false);
    assert!(body["answer"].as_str().is_some_and(|a| !a.is_empty()));
    // Context fields are omitted unless requested.
    assert!(body.get("graph_answer").is_none());
    assert!(body.get("semantic_chunks").is_none());

    let (_, second) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({ "question": "top 10 universities" })),
    )
    .await;
    assert_eq!(second["cached"], true);
    assert_eq!(second["elapsed_ms"], 0.0);
}

#[tokio::test]
async fn chat_includes_context_when_requested() {
    let router = test_router(true);
    let (status, body) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({
            "question": "tuition at MIT",
            "graph_only": false,
            "include_context": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "hybrid");
    assert!(body["graph_answer"].as_str().is_some_and(|a| !a.is_empty()));
    assert_eq!(body["semantic_chunks"], 3);
}

#[tokio::test]
async fn chat_rejects_blank_question() {
    let router = test_router(true);
    for question in ["", "   "] {
        let (status, body) = send_json(
            &router,
            "POST",
            "/chat",
            Some(json!({ "question": question })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_input");
    }
}

#[tokio::test]
async fn chat_surfaces_backend_failure_as_500() {
    let config = ChainConfig {
        cache_capacity: 8,
        top_k: 6,
        default_graph_only: true,
    };
    let chain = Arc::new(HybridChain::new(
        StructuredBackend::Fixture(FixtureGraph::default().with_failures(1)),
        SemanticBackend::Fixture(FixtureSemantic::default()),
        LlmProvider::Dummy(DummyProvider),
        &config,
    ));
    let router = build_router(ApiState { chain });

    let (status, body) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({ "question": "acceptance rates" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "inference_failed");

    // The failure was not cached — the retry succeeds fresh.
    let (status, body) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({ "question": "acceptance rates" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
}

// ── mode ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mode_roundtrip() {
    let router = test_router(true);

    let (status, body) = send_json(&router, "GET", "/mode", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["graph_only"], true);
    assert_eq!(body["mode"], "graph_only");

    let (status, body) = send_json(
        &router,
        "POST",
        "/mode",
        Some(json!({ "graph_only": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "hybrid");

    let (_, body) = send_json(&router, "GET", "/mode", None).await;
    assert_eq!(body["graph_only"], false);

    // New default governs the next request's fan-out.
    let (_, chat) = send_json(
        &router,
        "POST",
        "/chat",
        Some(json!({ "question": "top 10 universities" })),
    )
    .await;
    assert_eq!(chat["mode"], "hybrid");
    assert_eq!(chat["semantic_used"], true);
}

// ── clear-cache ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn clear_cache_resets_cached_answers() {
    let router = test_router(true);
    let question = json!({ "question": "scholarships at Stanford" });

    send_json(&router, "POST", "/chat", Some(question.clone())).await;
    let (_, cached) = send_json(&router, "POST", "/chat", Some(question.clone())).await;
    assert_eq!(cached["cached"], true);

    let (status, body) = send_json(&router, "POST", "/clear-cache", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], true);

    let (_, fresh) = send_json(&router, "POST", "/chat", Some(question)).await;
    assert_eq!(fresh["cached"], false);
}
