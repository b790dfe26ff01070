//! Run-level failure taxonomy.
//!
//! Every variant aborts the pass that produced it. Nothing here is retried;
//! the next scheduled pass is the retry.

use std::fmt;

use gcs_schemas::{RecordId, TimestampError};
use gcs_source::SourceError;
use gcs_store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The remote service could not be read (transport, auth, undecodable payload).
    SourceUnavailable(String),
    /// The snapshot cache could not be read or written.
    StoreUnavailable(String),
    /// A timestamp from the source or the store could not be parsed.
    MalformedTimestamp { raw: String, reason: String },
    /// The source has no detail for a record it listed.
    NotFound(RecordId),
}

impl DigestError {
    /// Stable machine-readable code for logs and HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DigestError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            DigestError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            DigestError::MalformedTimestamp { .. } => "MALFORMED_TIMESTAMP",
            DigestError::NotFound(_) => "NOT_FOUND",
        }
    }
}

impl fmt::Display for DigestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestError::SourceUnavailable(msg) => write!(f, "{}: {msg}", self.code()),
            DigestError::StoreUnavailable(msg) => write!(f, "{}: {msg}", self.code()),
            DigestError::MalformedTimestamp { raw, reason } => {
                write!(f, "{}: '{raw}' ({reason})", self.code())
            }
            DigestError::NotFound(id) => write!(f, "{}: record {id}", self.code()),
        }
    }
}

impl std::error::Error for DigestError {}

impl From<SourceError> for DigestError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::NotFound(id) => DigestError::NotFound(id),
            other => DigestError::SourceUnavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for DigestError {
    fn from(e: StoreError) -> Self {
        DigestError::StoreUnavailable(e.to_string())
    }
}

impl From<TimestampError> for DigestError {
    fn from(e: TimestampError) -> Self {
        DigestError::MalformedTimestamp {
            raw: e.raw,
            reason: e.reason,
        }
    }
}
