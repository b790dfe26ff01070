//! gcs-digest
//!
//! Incremental diff-and-digest engine.
//!
//! - [`cursor`]: which listed records are newer than the stored watermark
//! - [`diff`]: old vs new snapshot -> per-tier notes
//! - [`format`]: notes -> digest text (single text or length-bounded chunks)
//! - [`coordinator`]: one fail-fast pass over source and store
//!
//! Cursor, diff and format are pure. Only the coordinator touches IO, and only
//! through the `RecordSource` / `SnapshotStore` traits it is handed.

pub mod coordinator;
pub mod cursor;
pub mod diff;
mod error;
pub mod format;

pub use coordinator::{Clock, RunCoordinator, RunReport, SystemClock};
pub use cursor::cut;
pub use diff::{diff, Achievement, Note, TierChange, PLAY_MILESTONE};
pub use error::DigestError;
pub use format::{
    display_title, format_batch, format_chunks, format_digest, format_item, parse_digest,
    DigestItem, DigestParseError, UNTITLED,
};
