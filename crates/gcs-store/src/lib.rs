//! gcs-store
//!
//! Key/value cache for per-record snapshots plus the single global watermark.
//!
//! # Contract
//! - A store instance is opened by the caller before a pass and dropped after
//!   it. There is no process-wide handle.
//! - Reads and writes are plain read-then-write. No transactions, no locks:
//!   at most one pass may run against a store at a time (caller-enforced).
//! - The watermark is kept as the raw persisted string (`YYYY-MM-DD HH:MM:SS`);
//!   parsing it is the digest coordinator's job so a bad value surfaces as a
//!   malformed-timestamp failure rather than a store failure.

mod codec;
pub mod file;
pub mod memory;
pub mod redis_store;

use std::fmt;

use gcs_schemas::{RecordId, Snapshot};

pub use codec::{decode_snapshot, encode_snapshot};
pub use file::FileSnapshotStore;
pub use memory::{MemorySnapshotStore, SharedMemoryStore};
pub use redis_store::RedisSnapshotStore;

/// Key the watermark is stored under (shared with the legacy cache layout).
pub const WATERMARK_KEY: &str = "lastDate";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation.
    Unavailable(String),
    /// A stored value exists but cannot be decoded.
    Corrupt { key: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::Corrupt { key, reason } => {
                write!(f, "store value corrupt key={key}: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// SnapshotStore trait
// ---------------------------------------------------------------------------

/// Cache contract consumed by the digest coordinator.
///
/// Every method takes `&mut self`: network backends hold one connection that
/// needs exclusive access per command.
pub trait SnapshotStore: Send {
    fn name(&self) -> &'static str;

    /// Last cached snapshot of `id`, or `None` if the record was never seen.
    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the cached snapshot of `id`.
    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Raw persisted watermark, or `None` before the first pass.
    fn get_watermark(&mut self) -> Result<Option<String>, StoreError>;

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        (**self).get(id)
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).set(id, snapshot)
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        (**self).get_watermark()
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        (**self).set_watermark(raw)
    }
}

// ---------------------------------------------------------------------------
// StoreOpener
// ---------------------------------------------------------------------------

/// Opens a store for one pass. Long-running callers keep the opener and
/// drop each store when its pass ends, so a dropped backend connection only
/// costs the pass that saw it.
pub trait StoreOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn SnapshotStore>, StoreError>;
}

impl<F> StoreOpener for F
where
    F: Fn() -> Result<Box<dyn SnapshotStore>, StoreError> + Send + Sync,
{
    fn open(&self) -> Result<Box<dyn SnapshotStore>, StoreError> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            StoreError::Unavailable("connection reset".to_string()).to_string(),
            "store unavailable: connection reset"
        );
        let e = StoreError::Corrupt {
            key: "301".to_string(),
            reason: "expected value at line 1".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "store value corrupt key=301: expected value at line 1"
        );
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn SnapshotStore> = Box::new(MemorySnapshotStore::new());
        assert_eq!(store.name(), "memory");
        store.set_watermark("2017-01-01 10:21:30").unwrap();
        assert_eq!(
            store.get_watermark().unwrap().as_deref(),
            Some("2017-01-01 10:21:30")
        );
    }
}
