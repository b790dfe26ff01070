//! One end-to-end digest pass.
//!
//! ```text
//! acquire watermark -> list summaries -> cut -> per record: load old, fetch new,
//! diff, persist new -> advance watermark -> report
//! ```
//!
//! # Failure semantics
//!
//! - Any error aborts the pass immediately; no partial digest is returned.
//! - The watermark is written once, after every record succeeded. A failed
//!   pass leaves it untouched so the same records are retried next time.
//! - Snapshot writes are per record and are **not** rolled back. A retried pass
//!   recomputes those records against the already-updated cache, which is safe
//!   because the diff is a pure function of (old, new).
//! - The only exception to "watermark written last" is the very first pass:
//!   with no watermark stored, one is initialised to now before listing.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gcs_schemas::{
    format_timestamp, parse_timestamp, truncate_to_seconds, RecordSummary, Timestamp,
    DEFAULT_ZONE,
};
use gcs_source::RecordSource;
use gcs_store::SnapshotStore;
use tracing::{debug, error, info, info_span};
use uuid::Uuid;

use crate::cursor::cut;
use crate::diff::diff;
use crate::format::{format_batch, format_digest, DigestItem};
use crate::DigestError;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Wall-clock seam so passes can be replayed at a fixed instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Outcome of one successful pass.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Watermark as read from the store; `None` on the first pass.
    pub previous_watermark: Option<String>,
    /// Boundary actually used for the cut.
    pub watermark_used: Timestamp,
    /// Watermark persisted at the end of the pass.
    pub new_watermark: Timestamp,
    pub first_run: bool,
    /// Summaries listed by the source.
    pub scanned: usize,
    /// Summaries newer than the watermark.
    pub cut: usize,
    pub cache_writes: usize,
    pub items: Vec<DigestItem>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Digest text, or `placeholder` when nothing changed.
    pub fn render(&self, placeholder: &str) -> String {
        if self.is_empty() {
            return placeholder.to_string();
        }
        format_batch(&self.items)
    }

    /// Digest texts for a transport, optionally packed under a length limit.
    pub fn texts(&self, max_chunk_len: Option<usize>) -> Vec<String> {
        format_digest(&self.items, max_chunk_len)
    }
}

// ---------------------------------------------------------------------------
// RunCoordinator
// ---------------------------------------------------------------------------

/// Borrows its collaborators for the duration of a pass. The store is opened
/// by the caller and outlives the coordinator.
pub struct RunCoordinator<'a> {
    source: &'a dyn RecordSource,
    store: &'a mut dyn SnapshotStore,
    clock: &'a dyn Clock,
    zone: Tz,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(
        source: &'a dyn RecordSource,
        store: &'a mut dyn SnapshotStore,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            zone: DEFAULT_ZONE,
        }
    }

    /// Zone used to read source timestamps and to write the watermark.
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    fn now(&self) -> Timestamp {
        truncate_to_seconds(self.clock.now().with_timezone(&self.zone))
    }

    pub fn run(&mut self) -> Result<RunReport, DigestError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("digest_run", %run_id, source = self.source.name(), store = self.store.name());
        let _guard = span.enter();

        let result = self.run_inner(run_id);
        match &result {
            Ok(report) => info!(
                items = report.items.len(),
                cache_writes = report.cache_writes,
                watermark = %format_timestamp(&report.new_watermark),
                "digest run completed"
            ),
            Err(e) => error!(code = e.code(), error = %e, "digest run aborted; watermark not advanced"),
        }
        result
    }

    fn run_inner(&mut self, run_id: Uuid) -> Result<RunReport, DigestError> {
        let (previous_watermark, watermark) = self.acquire_watermark()?;
        let first_run = previous_watermark.is_none();

        info!(source = self.source.name(), "fetching record summaries");
        let summaries = self.source.list_summaries()?;
        info!(count = summaries.len(), "record summaries fetched");

        let fresh = cut(&summaries, &watermark, self.zone)?;
        info!(count = fresh.len(), "records newer than watermark");

        // All-or-nothing: the first Err short-circuits the fold and skips the
        // watermark write below.
        let (items, cache_writes) = fresh.iter().try_fold(
            (Vec::new(), 0usize),
            |(mut items, writes), summary| {
                if let Some(item) = self.process(summary)? {
                    items.push(item);
                }
                Ok::<_, DigestError>((items, writes + 1))
            },
        )?;

        let new_watermark = self.now();
        self.store
            .set_watermark(&format_timestamp(&new_watermark))?;
        info!(watermark = %format_timestamp(&new_watermark), "watermark advanced");

        Ok(RunReport {
            run_id,
            previous_watermark,
            watermark_used: watermark,
            new_watermark,
            first_run,
            scanned: summaries.len(),
            cut: fresh.len(),
            cache_writes,
            items,
        })
    }

    /// Read the stored watermark, initialising it to now when absent.
    fn acquire_watermark(&mut self) -> Result<(Option<String>, Timestamp), DigestError> {
        match self.store.get_watermark()? {
            Some(raw) => {
                let ts = parse_timestamp(&raw, self.zone)?;
                info!(watermark = %raw, "last processed time");
                Ok((Some(raw), ts))
            }
            None => {
                let now = self.now();
                let raw = format_timestamp(&now);
                self.store.set_watermark(&raw)?;
                info!(watermark = %raw, "no watermark stored; initialised to now");
                Ok((None, now))
            }
        }
    }

    /// Diff one record against its cached snapshot and replace the cache entry.
    fn process(&mut self, summary: &RecordSummary) -> Result<Option<DigestItem>, DigestError> {
        let old = self.store.get(&summary.id)?;
        let new = self.source.fetch_detail(&summary.id)?;

        let changes = diff(old.as_ref(), &new);

        self.store.set(&summary.id, &new)?;
        info!(record_id = %summary.id, title = %summary.title, baseline = old.is_none(), "updated snapshot cache");

        if changes.is_empty() {
            debug!(record_id = %summary.id, "no noteworthy changes");
            return Ok(None);
        }
        Ok(Some(DigestItem::new(summary.title.clone(), changes)))
    }
}
