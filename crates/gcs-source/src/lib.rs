//! gcs-source
//!
//! Boundary to the remote scoring service.
//!
//! This crate owns the [`RecordSource`] contract and the HTTP-backed
//! [`MypageSource`]. It does **not** cache anything and does **not** decide
//! which records are new; the digest coordinator does that.

pub mod mypage;

use std::fmt;

use gcs_schemas::{RecordId, RecordSummary, Snapshot};

pub use mypage::MypageSource;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`RecordSource`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network, transport or auth failure; the service could not be read.
    Unavailable(String),
    /// The service answered but has no detail for this record id.
    NotFound(RecordId),
    /// A response payload could not be decoded.
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {msg}"),
            SourceError::NotFound(id) => write!(f, "record not found: {id}"),
            SourceError::Decode(msg) => write!(f, "source decode error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

// ---------------------------------------------------------------------------
// RecordSource trait
// ---------------------------------------------------------------------------

/// Remote scoring-service contract.
///
/// Object safe so callers can hold a `Box<dyn RecordSource>`; `Send + Sync` so
/// the daemon can move a pass onto a blocking worker thread.
pub trait RecordSource: Send + Sync {
    /// Human-readable name for logs (e.g. `"mypage"`).
    fn name(&self) -> &'static str;

    /// Every record the player has touched, ordered by last activity time,
    /// most recent first. Callers rely on this order and do not re-sort.
    fn list_summaries(&self) -> Result<Vec<RecordSummary>, SourceError>;

    /// Full current state of one record.
    fn fetch_detail(&self, id: &RecordId) -> Result<Snapshot, SourceError>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn list_summaries(&self) -> Result<Vec<RecordSummary>, SourceError> {
        (**self).list_summaries()
    }

    fn fetch_detail(&self, id: &RecordId) -> Result<Snapshot, SourceError> {
        (**self).fetch_detail(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
