//! Axum HTTP surface.
//!
//! Thin layer over [`HybridChain`]: request/response shapes, status mapping,
//! and the server loop. The chain owns all state; handlers receive it via
//! [`axum::extract::State`].
//!
//! ## URL layout
//!
//! ```text
//! GET  /health       — probes the structured backend
//! POST /chat         — question → synthesized answer
//! POST /clear-cache  — swap in a fresh response cache
//! GET  /mode         — read the process-wide default mode
//! POST /mode         — set the process-wide default mode
//! ```

mod api;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chain::HybridChain;
use crate::error::AppError;

/// Router state injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub chain: Arc<HybridChain>,
}

/// Bind and serve until `shutdown` is cancelled.
pub async fn run(
    bind_addr: &str,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Http(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Http(format!("server error: {e}")))?;

    info!("http server shut down");
    Ok(())
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health",      get(api::health))
        .route("/chat",        post(api::chat))
        .route("/clear-cache", post(api::clear_cache))
        .route("/mode",        get(api::mode_get).post(api::mode_set))
        .with_state(state)
}
