//! Axum router and HTTP handlers for gcs-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{error, info};

use crate::{
    api_types::{HealthResponse, RunRefusedResponse},
    state::{uptime_secs, AppState, PassOutcome, Trigger},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Middleware layers (tracing) are **not** applied here; `main.rs` attaches
/// them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(digest))
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Run one pass and answer with the digest text.
///
/// - 200 `text/plain`: the digest, or the placeholder when nothing changed
/// - 409: a pass is already in flight
/// - 500 `text/plain`: the pass failed; body is the error (code first)
pub(crate) async fn digest(State(st): State<Arc<AppState>>) -> Response {
    let worker = Arc::clone(&st);
    let outcome = match tokio::task::spawn_blocking(move || worker.run_pass()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "digest worker panicked");
            return (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL: digest worker panicked")
                .into_response();
        }
    };

    st.record(Trigger::Http, &outcome).await;

    match outcome {
        PassOutcome::Done(report) => {
            info!(run_id = %report.run_id, items = report.items.len(), "digest served");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                report.render(&st.placeholder),
            )
                .into_response()
        }
        PassOutcome::Failed(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            e.to_string(),
        )
            .into_response(),
        PassOutcome::Busy => (
            StatusCode::CONFLICT,
            Json(RunRefusedResponse {
                error: "RUN_IN_PROGRESS: a digest pass is already running".to_string(),
            }),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let mut snap = st.status.read().await.clone();
    snap.daemon_uptime_secs = uptime_secs();
    snap.state = if st.is_busy() { "running" } else { "idle" }.to_string();
    (StatusCode::OK, Json(snap))
}
