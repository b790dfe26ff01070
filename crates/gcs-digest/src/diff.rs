//! Diff engine: old snapshot vs new snapshot -> per-tier notes.
//!
//! Deterministic, pure logic. No IO.
//!
//! Per tier of the new snapshot (extra only when flagged, unplayed tiers
//! skipped), notes are emitted in this fixed order:
//! 1. achievement: `Perfect`, else `FullChain`, else `NoMiss`; read from the
//!    new snapshot alone, so a held flag is reported on every pass
//! 2. chain delta: when max chain grew
//! 3. play milestone: when the play count is exactly [`PLAY_MILESTONE`]
//! 4. score delta: when score grew; the magnitude carried is the max-chain
//!    delta, matching what the deployed bot has always posted
//!
//! Counters that did not grow (including regressions from a bad feed) produce
//! no note.

use std::fmt;

use gcs_schemas::{Snapshot, Tier, TierDef, TierResult, TIER_TABLE};
use serde::{Deserialize, Serialize};

/// Play count that earns the one-time milestone note.
pub const PLAY_MILESTONE: u64 = 100;

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    Perfect,
    FullChain,
    NoMiss,
}

impl Achievement {
    /// Highest-priority achievement flag set on `r`, if any.
    pub fn of(r: &TierResult) -> Option<Achievement> {
        if r.perfect {
            Some(Achievement::Perfect)
        } else if r.full_chain {
            Some(Achievement::FullChain)
        } else if r.no_miss {
            Some(Achievement::NoMiss)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Achievement::Perfect => "Perfect",
            Achievement::FullChain => "FullChain",
            Achievement::NoMiss => "NoMiss",
        }
    }
}

/// One reportable fact about a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Note {
    Achievement(Achievement),
    ChainDelta(u64),
    PlayMilestone(u64),
    /// Signed: it is computed from max chain, which need not have grown.
    ScoreDelta(i64),
}

const CHAIN_MARK: &str = "⛓ ";
const SCORE_MARK: &str = "📈 ";
const PLAYED_SUFFIX: &str = " Played!";

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::Achievement(a) => f.write_str(a.as_str()),
            Note::ChainDelta(n) => write!(f, "{CHAIN_MARK}+{n}"),
            Note::PlayMilestone(n) => write!(f, "{n}{PLAYED_SUFFIX}"),
            Note::ScoreDelta(n) => write!(f, "{SCORE_MARK}{n:+}"),
        }
    }
}

impl Note {
    /// Inverse of `Display`.
    pub fn parse(s: &str) -> Option<Note> {
        let s = s.trim();
        match s {
            "Perfect" => return Some(Note::Achievement(Achievement::Perfect)),
            "FullChain" => return Some(Note::Achievement(Achievement::FullChain)),
            "NoMiss" => return Some(Note::Achievement(Achievement::NoMiss)),
            _ => {}
        }
        if let Some(rest) = s.strip_prefix(CHAIN_MARK) {
            return rest.strip_prefix('+')?.parse().ok().map(Note::ChainDelta);
        }
        if let Some(rest) = s.strip_prefix(SCORE_MARK) {
            return rest.parse().ok().map(Note::ScoreDelta);
        }
        if let Some(n) = s.strip_suffix(PLAYED_SUFFIX) {
            return n.parse().ok().map(Note::PlayMilestone);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// TierChange
// ---------------------------------------------------------------------------

/// Non-empty, ordered notes for one tier of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierChange {
    pub tier: Tier,
    pub notes: Vec<Note>,
}

impl TierChange {
    pub fn label(&self) -> &'static str {
        self.tier.label()
    }

    /// Notes joined the way they are presented: `"NoMiss, ⛓ +5"`.
    pub fn joined_notes(&self) -> String {
        self.notes
            .iter()
            .map(Note::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Compare `new` against `old`. An absent `old` means first sighting: `new` is
/// its own baseline, so only state-based notes (held achievements, the exact
/// milestone) can appear.
pub fn diff(old: Option<&Snapshot>, new: &Snapshot) -> Vec<TierChange> {
    let old = old.unwrap_or(new);
    TIER_TABLE
        .iter()
        .filter_map(|def| diff_tier(def, old, new))
        .collect()
}

fn diff_tier(def: &TierDef, old: &Snapshot, new: &Snapshot) -> Option<TierChange> {
    let cur = def.result(new)?;
    if cur.play_count == 0 {
        return None;
    }
    let prev = def.result(old).copied().unwrap_or_default();

    let notes = tier_notes(&prev, cur);
    if notes.is_empty() {
        return None;
    }
    Some(TierChange {
        tier: def.tier,
        notes,
    })
}

fn tier_notes(prev: &TierResult, cur: &TierResult) -> Vec<Note> {
    let mut notes = Vec::new();

    if let Some(a) = Achievement::of(cur) {
        notes.push(Note::Achievement(a));
    }

    if cur.max_chain > prev.max_chain {
        notes.push(Note::ChainDelta(cur.max_chain - prev.max_chain));
    }

    if cur.play_count == PLAY_MILESTONE {
        notes.push(Note::PlayMilestone(PLAY_MILESTONE));
    }

    if cur.score > prev.score {
        // Chain delta, not score delta: kept as deployed until product decides otherwise.
        let magnitude = cur.max_chain as i64 - prev.max_chain as i64;
        notes.push(Note::ScoreDelta(magnitude));
    }

    notes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn result(play_count: u64, score: u64, max_chain: u64) -> TierResult {
        TierResult {
            play_count,
            score,
            max_chain,
            ..TierResult::default()
        }
    }

    fn with_hard(hard: TierResult) -> Snapshot {
        let mut s = Snapshot::empty("301", "Got a pain cover?");
        s.tiers.hard = hard;
        s
    }

    fn strings(change: &TierChange) -> Vec<String> {
        change.notes.iter().map(Note::to_string).collect()
    }

    #[test]
    fn hard_tier_scenario_emits_all_four_notes_in_order() {
        let old = with_hard(result(99, 500, 20));
        let new = with_hard(TierResult {
            no_miss: true,
            ..result(100, 600, 25)
        });

        let changes = diff(Some(&old), &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].tier, Tier::Hard);
        assert_eq!(
            strings(&changes[0]),
            vec!["NoMiss", "⛓ +5", "100 Played!", "📈 +5"]
        );
        assert_eq!(
            changes[0].notes,
            vec![
                Note::Achievement(Achievement::NoMiss),
                Note::ChainDelta(5),
                Note::PlayMilestone(100),
                Note::ScoreDelta(5),
            ]
        );
    }

    #[test]
    fn perfect_wins_over_full_chain() {
        let r = TierResult {
            perfect: true,
            full_chain: true,
            no_miss: true,
            ..result(3, 1, 1)
        };
        let snap = with_hard(r);
        let changes = diff(Some(&snap), &snap);
        assert_eq!(
            changes[0].notes,
            vec![Note::Achievement(Achievement::Perfect)]
        );
    }

    #[test]
    fn identical_snapshots_only_report_held_state() {
        let plain = with_hard(result(42, 1000, 50));
        assert!(diff(Some(&plain), &plain).is_empty());

        let at_milestone = with_hard(result(100, 1000, 50));
        let changes = diff(Some(&at_milestone), &at_milestone);
        assert_eq!(changes[0].notes, vec![Note::PlayMilestone(100)]);

        let held_flag = with_hard(TierResult {
            full_chain: true,
            ..result(7, 1000, 50)
        });
        let changes = diff(Some(&held_flag), &held_flag);
        assert_eq!(
            changes[0].notes,
            vec![Note::Achievement(Achievement::FullChain)]
        );
    }

    #[test]
    fn milestone_fires_only_at_exactly_one_hundred() {
        for (count, fires) in [(99, false), (100, true), (101, false)] {
            let snap = with_hard(result(count, 1, 1));
            let fired = diff(Some(&snap), &snap)
                .iter()
                .any(|c| c.notes.contains(&Note::PlayMilestone(PLAY_MILESTONE)));
            assert_eq!(fired, fires, "play_count={count}");
        }
    }

    #[test]
    fn absent_old_is_a_silent_baseline() {
        let new = with_hard(result(5, 900, 40));
        assert!(diff(None, &new).is_empty());
    }

    #[test]
    fn regressions_are_not_notes() {
        let old = with_hard(result(10, 900, 40));
        let new = with_hard(result(11, 800, 30));
        assert!(diff(Some(&old), &new).is_empty());
    }

    #[test]
    fn score_growth_without_chain_growth_reports_non_positive_magnitude() {
        let old = with_hard(result(10, 900, 40));
        let new = with_hard(result(11, 950, 38));
        let changes = diff(Some(&old), &new);
        assert_eq!(changes[0].notes, vec![Note::ScoreDelta(-2)]);
        assert_eq!(strings(&changes[0]), vec!["📈 -2"]);
    }

    #[test]
    fn unplayed_tiers_and_unflagged_extra_are_skipped() {
        let old = Snapshot::empty("9", "Axeria");
        let mut new = old.clone();
        new.tiers.normal = TierResult {
            perfect: true,
            ..result(0, 0, 0)
        };
        new.tiers.extra = Some(TierResult {
            perfect: true,
            ..result(3, 10, 10)
        });
        assert!(diff(Some(&old), &new).is_empty());

        new.has_extra_tier = true;
        let changes = diff(Some(&old), &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].tier, Tier::Extra);
        assert_eq!(changes[0].notes[0], Note::Achievement(Achievement::Perfect));
    }

    #[test]
    fn per_tier_notes_do_not_depend_on_evaluation_order() {
        let mut old = Snapshot::empty("1", "x");
        old.tiers.simple = result(1, 10, 5);
        old.tiers.hard = result(2, 20, 6);
        let mut new = old.clone();
        new.tiers.simple = result(2, 15, 9);
        new.tiers.hard = TierResult {
            full_chain: true,
            ..result(100, 20, 6)
        };

        let forward = diff(Some(&old), &new);
        let mut reversed: Vec<TierChange> = TIER_TABLE
            .iter()
            .rev()
            .filter_map(|d| diff_tier(d, &old, &new))
            .collect();
        reversed.reverse();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn note_text_parses_back() {
        for n in [
            Note::Achievement(Achievement::Perfect),
            Note::Achievement(Achievement::FullChain),
            Note::Achievement(Achievement::NoMiss),
            Note::ChainDelta(12),
            Note::PlayMilestone(100),
            Note::ScoreDelta(7),
            Note::ScoreDelta(-3),
            Note::ScoreDelta(0),
        ] {
            assert_eq!(Note::parse(&n.to_string()), Some(n));
        }
        assert_eq!(Note::parse("Cleared"), None);
    }
}
