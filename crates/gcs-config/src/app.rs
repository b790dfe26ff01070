//! Typed view of the merged configuration.
//!
//! Every key has a default, so an empty document is a valid configuration
//! (memory store, log sink, Asia/Tokyo, loopback daemon).

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SOURCE_BASE_URL: &str = "https://mypage.groovecoaster.jp/sp/json";
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";
pub const DEFAULT_EMPTY_PLACEHOLDER: &str = "No change...\nWhy don't play GrooveCoaster?\n";
pub const DEFAULT_CHUNK_LIMIT: usize = 140;
pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:8899";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub digest: DigestConfig,
    pub notify: NotifyConfig,
    pub daemon: DaemonConfig,
}

impl AppConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        AppConfig::deserialize(v).context("CONFIG_INVALID: merged config does not match schema")
    }

    /// Zone for reading source timestamps and writing the watermark.
    pub fn zone(&self) -> Result<Tz> {
        self.digest
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("CONFIG_INVALID: digest.timezone '{}': {e}", self.digest.timezone))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    /// Env var NAME holding the session cookie.
    pub session_cookie_env: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SOURCE_BASE_URL.to_string(),
            session_cookie_env: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
    Redis,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Root directory for the file store.
    pub path: Option<String>,
    /// Env var NAME holding the redis URL.
    pub redis_url_env: Option<String>,
    /// Optional key prefix for the redis store.
    pub redis_key_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub timezone: String,
    pub empty_placeholder: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            empty_placeholder: DEFAULT_EMPTY_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Log,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub sink: SinkKind,
    pub chunk_limit: usize,
    /// Env var NAME holding the webhook URL.
    pub webhook_url_env: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Log,
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            webhook_url_env: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub addr: String,
    /// When set, the daemon also runs a pass on this period and hands it to
    /// the configured sink. `GET /` keeps working either way.
    pub interval_secs: Option<u64>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_DAEMON_ADDR.to_string(),
            interval_secs: None,
        }
    }
}
