//! Redis-backed store, key-compatible with the legacy deployment:
//! each snapshot lives under its record id as a JSON string, the watermark
//! under `lastDate`.

use gcs_schemas::{RecordId, Snapshot};
use redis::Commands;
use tracing::info;

use crate::{decode_snapshot, encode_snapshot, SnapshotStore, StoreError, WATERMARK_KEY};

pub struct RedisSnapshotStore {
    conn: redis::Connection,
    key_prefix: String,
}

fn unavailable(op: &str, e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(format!("redis {op}: {e}"))
}

impl RedisSnapshotStore {
    /// Connect to `url`. The connection lives as long as the returned store.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        Self::connect_with_prefix(url, "")
    }

    /// Like [`connect`](Self::connect), namespacing every key with `key_prefix`.
    pub fn connect_with_prefix(url: &str, key_prefix: &str) -> Result<Self, StoreError> {
        info!("connecting to redis server");
        let client = redis::Client::open(url).map_err(|e| unavailable("open", e))?;
        let conn = client
            .get_connection()
            .map_err(|e| unavailable("connect", e))?;
        info!("connected to redis server");
        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, k: &str) -> String {
        format!("{}{}", self.key_prefix, k)
    }
}

impl Drop for RedisSnapshotStore {
    fn drop(&mut self) {
        info!("redis connection closed");
    }
}

impl SnapshotStore for RedisSnapshotStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn get(&mut self, id: &RecordId) -> Result<Option<Snapshot>, StoreError> {
        let key = self.key(id.as_str());
        let raw: Option<String> = self.conn.get(&key).map_err(|e| unavailable("GET", e))?;
        raw.map(|r| decode_snapshot(&key, &r)).transpose()
    }

    fn set(&mut self, id: &RecordId, snapshot: &Snapshot) -> Result<(), StoreError> {
        let key = self.key(id.as_str());
        let raw = encode_snapshot(snapshot)?;
        self.conn
            .set::<_, _, ()>(&key, raw)
            .map_err(|e| unavailable("SET", e))
    }

    fn get_watermark(&mut self) -> Result<Option<String>, StoreError> {
        let key = self.key(WATERMARK_KEY);
        self.conn.get(&key).map_err(|e| unavailable("GET", e))
    }

    fn set_watermark(&mut self, raw: &str) -> Result<(), StoreError> {
        let key = self.key(WATERMARK_KEY);
        self.conn
            .set::<_, _, ()>(&key, raw)
            .map_err(|e| unavailable("SET", e))
    }
}
