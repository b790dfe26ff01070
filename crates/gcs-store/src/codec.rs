//! Snapshot <-> cache payload.
//!
//! Field-named JSON so an absent extra tier is simply omitted and older
//! payloads without newer optional fields still decode.

use gcs_schemas::Snapshot;

use crate::StoreError;

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String, StoreError> {
    serde_json::to_string(snapshot).map_err(|e| StoreError::Corrupt {
        key: snapshot.id.to_string(),
        reason: format!("encode failed: {e}"),
    })
}

pub fn decode_snapshot(key: &str, raw: &str) -> Result<Snapshot, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_payload_is_corrupt_with_key() {
        let err = decode_snapshot("301", "{not json").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "301"));
    }

    #[test]
    fn payload_without_extra_decodes() {
        let raw = r#"{
            "id": "5", "title": "Axeria", "hasExtraTier": false,
            "tiers": {
                "simple": {"playCount": 1, "score": 10, "maxChain": 2},
                "normal": {"playCount": 0, "score": 0, "maxChain": 0},
                "hard":   {"playCount": 3, "score": 30, "maxChain": 9, "noMiss": true}
            }
        }"#;
        let snap = decode_snapshot("5", raw).unwrap();
        assert!(snap.tiers.extra.is_none());
        assert!(snap.tiers.hard.no_miss);
        assert!(!snap.tiers.hard.perfect);
    }
}
