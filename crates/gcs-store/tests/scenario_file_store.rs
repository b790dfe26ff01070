//! `FileSnapshotStore` persistence across re-open.

use gcs_schemas::{RecordId, Snapshot, TierResult};
use gcs_store::{FileSnapshotStore, SnapshotStore, StoreError};

fn snapshot(id: &str, hard_plays: u64) -> Snapshot {
    let mut s = Snapshot::empty(RecordId::new(id), format!("song {id}"));
    s.tiers.hard = TierResult {
        play_count: hard_plays,
        score: 500,
        max_chain: 20,
        ..TierResult::default()
    };
    s
}

#[test]
fn snapshots_and_watermark_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = RecordId::new("301");

    {
        let mut store = FileSnapshotStore::open(dir.path()).unwrap();
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.get_watermark().unwrap().is_none());

        store.set(&id, &snapshot("301", 99)).unwrap();
        store.set_watermark("2017-01-01 10:21:30").unwrap();
    }

    let mut reopened = FileSnapshotStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get(&id).unwrap(), Some(snapshot("301", 99)));
    assert_eq!(
        reopened.get_watermark().unwrap().as_deref(),
        Some("2017-01-01 10:21:30")
    );
}

#[test]
fn overwrite_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let id = RecordId::new("7");
    let mut store = FileSnapshotStore::open(dir.path()).unwrap();

    store.set(&id, &snapshot("7", 1)).unwrap();
    store.set(&id, &snapshot("7", 2)).unwrap();

    assert_eq!(store.get(&id).unwrap().unwrap().tiers.hard.play_count, 2);
    let leftovers = std::fs::read_dir(dir.path().join("snapshots"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn corrupt_payload_is_reported_not_treated_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileSnapshotStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("snapshots").join("9.json"), "{ truncated").unwrap();

    let err = store.get(&RecordId::new("9")).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }), "got {err:?}");
}
