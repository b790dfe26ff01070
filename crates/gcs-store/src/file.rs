//! Directory-backed store.
//!
//! Layout under the root directory:
//! - `snapshots/<id>.json`: one cached snapshot per record
//! - `lastDate`: watermark text, single line
//!
//! Writes go through temp file + rename so a crash never leaves a half-written value.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gcs_schemas::{RecordId, Snapshot};
use tracing::debug;

use crate::{decode_snapshot, encode_snapshot, SnapshotStore, StoreError, WATERMARK_KEY};

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("snapshots")).map_err(|e| {
            StoreError::Unavailable(format!("create store dir {}: {e}", root.display()))
        })?;
        debug!(root = %root.display(), "file store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, id: &RecordId) -> PathBuf {
        self.root
            .join("snapshots")
            .join(format!("{}.json", file_stem(id.as_str())))
    }

    fn watermark_path(&self) -> PathBuf {
        self.root.join(WATERMARK_KEY)
    }
}

/// Keep ids usable as file names: alphanumerics, `-` and `_` pass through,
/// anything else becomes `%XX` per byte.
fn file_stem(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::Unavailable(format!(
            "read {}: {e}",
            path.display()
        ))),
    }
}

fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)
        .map_err(|e| StoreError::Unavailable(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .map_err(|e| StoreError::Unavailable(format!("rename {}: {e}", path.display())))
}

impl SnapshotStore for FileSnapshotStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        read_optional(&self.snapshot_path(id))?
            .map(|raw| decode_snapshot(id.as_str(), &raw))
            .transpose()
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = encode_snapshot(snapshot)?;
        atomic_write(&self.snapshot_path(id), &raw)
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        Ok(read_optional(&self.watermark_path())?.map(|s| s.trim().to_string()))
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        atomic_write(&self.watermark_path(), &format!("{raw}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_escape_path_separators() {
        assert_eq!(file_stem("301"), "301");
        assert_eq!(file_stem("a/b"), "a%2Fb");
        assert_eq!(file_stem(".."), "%2E%2E");
    }
}
