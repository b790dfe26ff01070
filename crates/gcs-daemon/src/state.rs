//! Shared runtime state for gcs-daemon.
//!
//! # Invariants
//!
//! - At most one pass is in flight. The [`Pipeline`] sits behind a mutex that
//!   is held for the whole pass; a caller that cannot take it immediately is
//!   refused, never queued.
//! - The pipeline lock is a `std::sync::Mutex` because passes run on the
//!   blocking pool (the HTTP adapters are synchronous).
//! - The store is opened at the start of each pass and dropped at its end.
//!   Only the opener lives as long as the daemon.
//! - Anything holding a blocking HTTP client is built and dropped on the
//!   blocking pool, never on an async worker.

use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Tz;
use gcs_digest::{Clock, DigestError, RunCoordinator, RunReport, SystemClock};
use gcs_notify::DeliverySink;
use gcs_runtime::Runtime;
use gcs_schemas::format_timestamp;
use gcs_source::RecordSource;
use gcs_store::StoreOpener;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api_types::{LastRun, StatusSnapshot};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything one pass needs.
pub struct Pipeline {
    pub source: Box<dyn RecordSource>,
    /// Opens a fresh store per pass; see the module invariants.
    pub stores: Box<dyn StoreOpener>,
    pub clock: Box<dyn Clock>,
    pub zone: Tz,
}

impl Pipeline {
    fn run(&self) -> Result<RunReport, DigestError> {
        let mut store = self.stores.open()?;
        RunCoordinator::new(self.source.as_ref(), store.as_mut(), self.clock.as_ref())
            .with_zone(self.zone)
            .run()
    }
}

#[derive(Debug)]
pub enum PassOutcome {
    Done(RunReport),
    Failed(DigestError),
    /// Another pass holds the pipeline.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Http,
    Schedule,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Http => "http",
            Trigger::Schedule => "schedule",
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub build: BuildInfo,
    /// Answer body when a pass finds nothing new.
    pub placeholder: String,
    pipeline: Mutex<Pipeline>,
    pub status: RwLock<StatusSnapshot>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, placeholder: impl Into<String>) -> Self {
        Self {
            build: BuildInfo {
                service: "gcs-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            placeholder: placeholder.into(),
            pipeline: Mutex::new(pipeline),
            status: RwLock::new(StatusSnapshot {
                daemon_uptime_secs: uptime_secs(),
                state: "idle".to_string(),
                runs_ok: 0,
                runs_failed: 0,
                runs_refused: 0,
                last_run: None,
            }),
        }
    }

    /// Production wiring: HTTP source, configured store, wall clock.
    pub fn from_runtime(rt: &Runtime) -> anyhow::Result<Self> {
        let pipeline = Pipeline {
            source: Box::new(rt.build_source()),
            stores: rt.store_opener()?,
            clock: Box::new(SystemClock),
            zone: rt.zone,
        };
        Ok(Self::new(pipeline, rt.placeholder()))
    }

    /// Run one pass if none is in flight. Blocks the calling thread; call
    /// from the blocking pool.
    pub fn run_pass(&self) -> PassOutcome {
        let pipeline = match self.pipeline.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return PassOutcome::Busy,
            // A panicked pass leaves nothing half-applied beyond what a
            // failed pass would; keep serving.
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        match pipeline.run() {
            Ok(report) => PassOutcome::Done(report),
            Err(e) => PassOutcome::Failed(e),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.pipeline.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Fold a pass outcome into the status snapshot.
    pub async fn record(&self, trigger: Trigger, outcome: &PassOutcome) {
        let mut s = self.status.write().await;
        match outcome {
            PassOutcome::Done(report) => {
                s.runs_ok += 1;
                s.last_run = Some(LastRun {
                    run_id: Some(report.run_id),
                    finished_at_utc: Utc::now(),
                    trigger: trigger.as_str().to_string(),
                    ok: true,
                    items: report.items.len(),
                    cache_writes: report.cache_writes,
                    watermark: Some(format_timestamp(&report.new_watermark)),
                    error: None,
                });
            }
            PassOutcome::Failed(e) => {
                s.runs_failed += 1;
                s.last_run = Some(LastRun {
                    run_id: None,
                    finished_at_utc: Utc::now(),
                    trigger: trigger.as_str().to_string(),
                    ok: false,
                    items: 0,
                    cache_writes: 0,
                    watermark: None,
                    error: Some(e.to_string()),
                });
            }
            PassOutcome::Busy => s.runs_refused += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

// ---------------------------------------------------------------------------
// Boot
// ---------------------------------------------------------------------------

/// What `main` needs once configuration is loaded.
pub struct Boot {
    pub rt: Runtime,
    pub state: Arc<AppState>,
    /// Sink and period for scheduled passes, when `daemon.interval_secs` is set.
    pub scheduled: Option<(Arc<dyn DeliverySink>, Duration)>,
}

/// Load config and build state plus the scheduled-pass sink on the blocking
/// pool. Config load may dial redis and both HTTP adapters own blocking clients.
pub async fn boot(config_paths: Vec<String>) -> anyhow::Result<Boot> {
    tokio::task::spawn_blocking(move || {
        let rt = Runtime::load(&config_paths)?;
        let state = Arc::new(AppState::from_runtime(&rt)?);
        let scheduled = match rt.cfg.daemon.interval_secs.filter(|s| *s > 0) {
            Some(secs) => {
                let sink: Arc<dyn DeliverySink> = Arc::from(rt.build_sink()?);
                Some((sink, Duration::from_secs(secs)))
            }
            None => None,
        };
        anyhow::Ok(Boot {
            rt,
            state,
            scheduled,
        })
    })
    .await
    .context("startup worker panicked")?
}

// ---------------------------------------------------------------------------
// Scheduled passes
// ---------------------------------------------------------------------------

/// Run a pass every `interval` and hand each report to `sink`. A tick that
/// finds a pass already in flight is skipped.
///
/// The task ends once `stop` flips to `true`, releasing its state and sink on
/// the blocking pool.
pub fn spawn_scheduled_passes(
    state: Arc<AppState>,
    sink: Arc<dyn DeliverySink>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so boot does not race
        // the first HTTP request.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let worker = Arc::clone(&state);
            let sink = Arc::clone(&sink);
            let joined = tokio::task::spawn_blocking(move || {
                let outcome = worker.run_pass();
                if let PassOutcome::Done(report) = &outcome {
                    if let Err(e) = sink.deliver(report) {
                        error!(run_id = %report.run_id, sink = sink.name(), error = %e, "scheduled delivery failed; digest lost");
                    }
                }
                outcome
            })
            .await;

            match joined {
                Ok(outcome) => {
                    if matches!(outcome, PassOutcome::Busy) {
                        info!("scheduled pass skipped; another pass in flight");
                    }
                    state.record(Trigger::Schedule, &outcome).await;
                }
                Err(e) => warn!(error = %e, "scheduled pass worker panicked"),
            }
        }

        info!("scheduled passes stopped");
        let _ = tokio::task::spawn_blocking(move || drop((state, sink))).await;
    })
}
