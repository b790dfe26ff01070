//! gcs-runtime
//!
//! Turns a layered configuration into the collaborators of a digest pass.
//!
//! ```text
//! YAML layers -> LoadedConfig -> AppConfig + ResolvedSecrets + zone
//!            -> MypageSource / SnapshotStore / DeliverySink
//! ```
//!
//! Both binaries go through [`Runtime`]; neither reads config keys or secret
//! env vars on its own.

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use gcs_config::{
    load_layered_yaml, report_unused_keys, resolve_secrets, AppConfig, LoadedConfig,
    ResolvedSecrets, SinkKind, StoreKind, UnusedKeyPolicy,
};
use gcs_digest::{Clock, DigestError, RunCoordinator, RunReport};
use gcs_notify::{ChunkedPostSink, DeliverySink, LogSink, WebhookPoster};
use gcs_source::{MypageSource, RecordSource};
use gcs_store::{
    FileSnapshotStore, RedisSnapshotStore, SharedMemoryStore, SnapshotStore, StoreError, StoreOpener,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Runtime {
    pub config_hash: String,
    pub cfg: AppConfig,
    pub secrets: ResolvedSecrets,
    pub zone: Tz,
}

impl Runtime {
    /// Load layers from `paths` in order. No paths means all defaults.
    pub fn load(paths: &[String]) -> Result<Self> {
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let loaded = load_layered_yaml(&refs)?;
        Self::from_loaded(&loaded)
    }

    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        for leaf in &unused.unused_leaf_pointers {
            warn!(leaf = %leaf, "unused config key");
        }

        let cfg = loaded.app()?;
        let zone = cfg.zone()?;
        let secrets = resolve_secrets(&cfg)?;

        info!(
            config_hash = %loaded.config_hash,
            store = ?cfg.store.kind,
            sink = ?cfg.notify.sink,
            zone = %zone,
            "runtime configured"
        );

        Ok(Self {
            config_hash: loaded.config_hash.clone(),
            cfg,
            secrets,
            zone,
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.cfg.digest.empty_placeholder
    }

    pub fn build_source(&self) -> MypageSource {
        MypageSource::new_with_base_url(
            self.secrets.session_cookie.clone(),
            self.cfg.source.base_url.clone(),
        )
    }

    /// Open the configured store once. Callers that run a single pass use this.
    pub fn open_store(&self) -> Result<Box<dyn SnapshotStore>> {
        self.store_opener()?.open().context("open store")
    }

    /// Opener for the configured store, validated up front. Each `open()`
    /// yields a fresh store: a new file handle root or redis connection, or a
    /// handle onto the one in-process cache for `kind: memory`.
    pub fn store_opener(&self) -> Result<Box<dyn StoreOpener>> {
        let opener: Box<dyn StoreOpener> = match self.cfg.store.kind {
            StoreKind::Memory => {
                warn!("memory store: cache and watermark are lost when the process exits");
                let shared = SharedMemoryStore::default();
                Box::new(move || -> Result<Box<dyn SnapshotStore>, StoreError> {
                    Ok(Box::new(shared.clone()))
                })
            }
            StoreKind::File => {
                let Some(path) = self.cfg.store.path.clone() else {
                    bail!("CONFIG_INVALID: store.kind=file requires store.path");
                };
                Box::new(move || -> Result<Box<dyn SnapshotStore>, StoreError> {
                    Ok(Box::new(FileSnapshotStore::open(path.as_str())?))
                })
            }
            StoreKind::Redis => {
                let Some(url) = self.secrets.redis_url.clone() else {
                    bail!("SECRETS_MISSING: store.kind=redis but no redis url resolved");
                };
                let prefix = self.cfg.store.redis_key_prefix.clone().unwrap_or_default();
                Box::new(move || -> Result<Box<dyn SnapshotStore>, StoreError> {
                    Ok(Box::new(RedisSnapshotStore::connect_with_prefix(&url, &prefix)?))
                })
            }
        };
        Ok(opener)
    }

    pub fn build_sink(&self) -> Result<Box<dyn DeliverySink>> {
        let sink: Box<dyn DeliverySink> = match self.cfg.notify.sink {
            SinkKind::Log => Box::new(LogSink::new(self.placeholder())),
            SinkKind::Post => {
                let Some(url) = self.secrets.webhook_url.as_deref() else {
                    bail!("SECRETS_MISSING: notify.sink=post but no webhook url resolved");
                };
                Box::new(ChunkedPostSink::with_limit(
                    WebhookPoster::new(url),
                    self.cfg.notify.chunk_limit,
                ))
            }
        };
        Ok(sink)
    }

    /// One pass in the configured zone.
    pub fn run_once(
        &self,
        source: &dyn RecordSource,
        store: &mut dyn SnapshotStore,
        clock: &dyn Clock,
    ) -> Result<RunReport, DigestError> {
        RunCoordinator::new(source, store, clock)
            .with_zone(self.zone)
            .run()
    }
}
