//! In-process store. Used by tests and by `store.kind: memory` dry runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use gcs_schemas::{RecordId, Snapshot};

use crate::{SnapshotStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    snapshots: BTreeMap<RecordId, Snapshot>,
    watermark: Option<String>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a watermark (builder style, for tests and fixtures).
    pub fn with_watermark(mut self, raw: impl Into<String>) -> Self {
        self.watermark = Some(raw.into());
        self
    }

    /// Pre-seed a cached snapshot.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshots.insert(snapshot.id.clone(), snapshot);
        self
    }

    pub fn snapshot(&self, id: &RecordId) -> Option<&Snapshot> {
        self.snapshots.get(id)
    }

    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_deref()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshots.get(id).cloned())
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.snapshots.insert(id.clone(), snapshot.clone());
        Ok(())
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        Ok(self.watermark.clone())
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        self.watermark = Some(raw.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SharedMemoryStore
// ---------------------------------------------------------------------------

/// Cloneable handle onto one [`MemorySnapshotStore`]. Every clone sees the
/// same cache, so a memory store can be reopened per pass without losing it.
#[derive(Debug, Clone, Default)]
pub struct SharedMemoryStore {
    inner: Arc<Mutex<MemorySnapshotStore>>,
}

impl SharedMemoryStore {
    pub fn new(store: MemorySnapshotStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemorySnapshotStore> {
        // Every write is a single map insert; a poisoned guard holds a whole value.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self, id: &RecordId) -> Option<Snapshot> {
        self.lock().snapshot(id).cloned()
    }

    pub fn watermark(&self) -> Option<String> {
        self.lock().watermark().map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl SnapshotStore for SharedMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        self.lock().get(id)
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.lock().set(id, snapshot)
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        self.lock().get_watermark()
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        self.lock().set_watermark(raw)
    }
}
