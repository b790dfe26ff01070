//! Response types for the gcs-daemon HTTP endpoints.
//!
//! `Serialize + Deserialize` so tests can decode them. No logic here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

/// Outcome of the most recent pass, whoever triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastRun {
    /// `None` when the pass failed before a report existed.
    pub run_id: Option<Uuid>,
    pub finished_at_utc: DateTime<Utc>,
    /// "http" | "schedule"
    pub trigger: String,
    pub ok: bool,
    pub items: usize,
    pub cache_writes: usize,
    /// Watermark persisted by the pass (successful passes only).
    pub watermark: Option<String>,
    /// Error code and text of a failed pass.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    /// "idle" | "running"
    pub state: String,
    pub runs_ok: u64,
    pub runs_failed: u64,
    /// Requests refused because a pass was already in flight.
    pub runs_refused: u64,
    pub last_run: Option<LastRun>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON body of 409 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRefusedResponse {
    pub error: String,
}
