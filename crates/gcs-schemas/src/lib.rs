//! gcs-schemas
//!
//! Shared data model for the play-digest pipeline: record summaries as listed
//! by the remote source, full per-record snapshots as cached between runs, and
//! the fixed difficulty-tier table the diff engine iterates.
//!
//! Pure types. No IO.

pub mod time;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use time::{
    format_timestamp, parse_timestamp, truncate_to_seconds, TimestampError, Timestamp,
    DEFAULT_ZONE, TIMESTAMP_FORMAT,
};

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Opaque, stable identifier of one playable item (a song).
///
/// The remote service hands out integers; the cache keys on the decimal string,
/// so the id is carried as a string everywhere past the source boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// RecordSummary
// ---------------------------------------------------------------------------

/// One entry of the source's play list, ordered by `last_activity_time` descending.
///
/// The timestamp stays as the raw string the source returned; it is parsed by
/// the watermark cursor so an unparseable value can fail the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: RecordId,
    pub title: String,
    pub last_activity_time: String,
}

impl RecordSummary {
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        last_activity_time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            last_activity_time: last_activity_time.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TierResult / Tiers / Snapshot
// ---------------------------------------------------------------------------

/// Per-tier play state. Counters are cumulative/best values and never expected
/// to regress; the achievement flags are current state only (no history).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResult {
    pub play_count: u64,
    pub score: u64,
    pub max_chain: u64,
    #[serde(default)]
    pub perfect: bool,
    #[serde(default)]
    pub full_chain: bool,
    #[serde(default)]
    pub no_miss: bool,
}

/// The four difficulty slots of a record. `extra` is only meaningful when the
/// owning snapshot has `has_extra_tier` set, and is omitted from the cache
/// payload when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiers {
    pub simple: TierResult,
    pub normal: TierResult,
    pub hard: TierResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<TierResult>,
}

/// Full captured state of one record, compared across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub has_extra_tier: bool,
    pub tiers: Tiers,
}

impl Snapshot {
    /// Snapshot with every tier unplayed.
    pub fn empty(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            has_extra_tier: false,
            tiers: Tiers::default(),
        }
    }

    /// Look a tier up through the fixed tier table.
    ///
    /// Returns `None` for the extra tier when the snapshot does not carry it.
    pub fn tier(&self, tier: Tier) -> Option<&TierResult> {
        tier.def().result(self)
    }
}

// ---------------------------------------------------------------------------
// Tier table
// ---------------------------------------------------------------------------

/// Difficulty tiers in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Simple,
    Normal,
    Hard,
    Extra,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        self.def().label
    }

    pub fn def(&self) -> &'static TierDef {
        match self {
            Tier::Simple => &TIER_TABLE[0],
            Tier::Normal => &TIER_TABLE[1],
            Tier::Hard => &TIER_TABLE[2],
            Tier::Extra => &TIER_TABLE[3],
        }
    }

    /// Reverse lookup from a rendered label (`"Hard"` -> `Tier::Hard`).
    pub fn from_label(label: &str) -> Option<Tier> {
        TIER_TABLE
            .iter()
            .find(|d| d.label == label.trim())
            .map(|d| d.tier)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the tier table: a label plus an accessor into [`Tiers`].
///
/// `conditional` rows exist only when the snapshot's `has_extra_tier` is set.
pub struct TierDef {
    pub tier: Tier,
    pub label: &'static str,
    pub conditional: bool,
    get: fn(&Tiers) -> Option<&TierResult>,
}

impl fmt::Debug for TierDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TierDef")
            .field("tier", &self.tier)
            .field("label", &self.label)
            .field("conditional", &self.conditional)
            .finish()
    }
}

impl TierDef {
    /// The tier's result inside `snap`, honoring the conditional-presence rule.
    pub fn result<'a>(&self, snap: &'a Snapshot) -> Option<&'a TierResult> {
        if self.conditional && !snap.has_extra_tier {
            return None;
        }
        (self.get)(&snap.tiers)
    }
}

fn tier_simple(t: &Tiers) -> Option<&TierResult> {
    Some(&t.simple)
}

fn tier_normal(t: &Tiers) -> Option<&TierResult> {
    Some(&t.normal)
}

fn tier_hard(t: &Tiers) -> Option<&TierResult> {
    Some(&t.hard)
}

fn tier_extra(t: &Tiers) -> Option<&TierResult> {
    t.extra.as_ref()
}

/// Fixed, ordered tier table. Iterated once per record by the diff engine.
pub static TIER_TABLE: [TierDef; 4] = [
    TierDef {
        tier: Tier::Simple,
        label: "Simple",
        conditional: false,
        get: tier_simple,
    },
    TierDef {
        tier: Tier::Normal,
        label: "Normal",
        conditional: false,
        get: tier_normal,
    },
    TierDef {
        tier: Tier::Hard,
        label: "Hard",
        conditional: false,
        get: tier_hard,
    },
    TierDef {
        tier: Tier::Extra,
        label: "Extra",
        conditional: true,
        get: tier_extra,
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
