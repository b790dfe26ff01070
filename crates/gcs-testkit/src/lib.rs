//! gcs-testkit
//!
//! In-process collaborators for driving digest passes without a network or a
//! cache server:
//! - [`ScriptedSource`]: fixed summaries/details, with per-call failure injection
//! - [`FailingStore`]: a memory store that can be told to fail specific operations
//! - [`FixedClock`]: a clock pinned to one local wall-clock instant
//!
//! Plus small fixture builders. Scenario tests live under `tests/`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use gcs_digest::Clock;
use gcs_schemas::{
    parse_timestamp, RecordId, RecordSummary, Snapshot, TierResult, DEFAULT_ZONE,
};
use gcs_source::{RecordSource, SourceError};
use gcs_store::{MemorySnapshotStore, SnapshotStore, StoreError};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn tier(play_count: u64, score: u64, max_chain: u64) -> TierResult {
    TierResult {
        play_count,
        score,
        max_chain,
        ..TierResult::default()
    }
}

/// Snapshot with only the hard tier played.
pub fn hard_only(id: &str, title: &str, hard: TierResult) -> Snapshot {
    let mut s = Snapshot::empty(RecordId::new(id), title);
    s.tiers.hard = hard;
    s
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pin to a `YYYY-MM-DD HH:MM:SS` wall-clock time in the default zone.
    ///
    /// Panics on a malformed literal; fixtures only.
    pub fn at_local(raw: &str) -> Self {
        let ts = parse_timestamp(raw, DEFAULT_ZONE)
            .unwrap_or_else(|e| panic!("bad FixedClock literal: {e}"));
        Self(ts.with_timezone(&Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Serves a fixed list and fixed details. Records every detail fetch.
#[derive(Default)]
pub struct ScriptedSource {
    summaries: Vec<RecordSummary>,
    details: BTreeMap<RecordId, Snapshot>,
    list_failure: Option<SourceError>,
    detail_failures: BTreeMap<RecordId, SourceError>,
    fetched: Mutex<Vec<RecordId>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listed record (list order is call order) and its detail.
    pub fn with_record(mut self, last_activity_time: &str, detail: Snapshot) -> Self {
        self.summaries.push(RecordSummary::new(
            detail.id.clone(),
            detail.title.clone(),
            last_activity_time,
        ));
        self.details.insert(detail.id.clone(), detail);
        self
    }

    /// Append a listed record with no detail behind it.
    pub fn with_summary(mut self, summary: RecordSummary) -> Self {
        self.summaries.push(summary);
        self
    }

    pub fn failing_list(mut self, err: SourceError) -> Self {
        self.list_failure = Some(err);
        self
    }

    pub fn failing_detail(mut self, id: &str, err: SourceError) -> Self {
        self.detail_failures.insert(RecordId::new(id), err);
        self
    }

    /// Ids whose detail was requested, in request order.
    pub fn fetched(&self) -> Vec<RecordId> {
        self.fetched.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl RecordSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn list_summaries(&self) -> Result<Vec<RecordSummary>, SourceError> {
        match &self.list_failure {
            Some(e) => Err(e.clone()),
            None => Ok(self.summaries.clone()),
        }
    }

    fn fetch_detail(&self, id: &RecordId) -> Result<Snapshot, SourceError> {
        if let Ok(mut v) = self.fetched.lock() {
            v.push(id.clone());
        }
        if let Some(e) = self.detail_failures.get(id) {
            return Err(e.clone());
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.clone()))
    }
}

// ---------------------------------------------------------------------------
// FailingStore
// ---------------------------------------------------------------------------

/// Memory store with targeted failure injection.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemorySnapshotStore,
    fail_get: BTreeSet<RecordId>,
    fail_set: BTreeSet<RecordId>,
    fail_watermark_read: bool,
    fail_watermark_write: bool,
    watermark_writes: usize,
}

impl FailingStore {
    pub fn new(inner: MemorySnapshotStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn failing_get(mut self, id: &str) -> Self {
        self.fail_get.insert(RecordId::new(id));
        self
    }

    pub fn failing_set(mut self, id: &str) -> Self {
        self.fail_set.insert(RecordId::new(id));
        self
    }

    pub fn failing_watermark_read(mut self) -> Self {
        self.fail_watermark_read = true;
        self
    }

    pub fn failing_watermark_write(mut self) -> Self {
        self.fail_watermark_write = true;
        self
    }

    pub fn inner(&self) -> &MemorySnapshotStore {
        &self.inner
    }

    /// Successful watermark writes so far.
    pub fn watermark_writes(&self) -> usize {
        self.watermark_writes
    }
}

fn injected(op: &str) -> StoreError {
    StoreError::Unavailable(format!("injected {op} failure"))
}

impl SnapshotStore for FailingStore {
    fn name(&self) -> &'static str {
        "failing-memory"
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        if self.fail_get.contains(id) {
            return Err(injected("get"));
        }
        self.inner.get(id)
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_set.contains(id) {
            return Err(injected("set"));
        }
        self.inner.set(id, snapshot)
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        if self.fail_watermark_read {
            return Err(injected("watermark read"));
        }
        self.inner.get_watermark()
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        if self.fail_watermark_write {
            return Err(injected("watermark write"));
        }
        self.watermark_writes += 1;
        self.inner.set_watermark(raw)
    }
}
