//! Watermark cursor.
//!
//! # Invariants
//!
//! - **Prefix only**: the result is always a prefix of the input slice.
//! - **Strictly newer**: an entry whose time equals the watermark is already
//!   processed; the first entry at or before the watermark ends the scan.
//! - **Input order is trusted**: the source lists most-recent first; this is a
//!   precondition and is not re-verified.
//! - **Fail-fast on a corrupt feed**: every timestamp is parsed before the
//!   scan, so one bad value anywhere fails the whole pass.
//! - **Pure, no IO.**

use chrono_tz::Tz;
use gcs_schemas::{parse_timestamp, RecordSummary, Timestamp};

use crate::DigestError;

/// Return the maximal prefix of `summaries` whose activity time is strictly
/// after `watermark`. Source timestamps are read in `zone`.
pub fn cut<'a>(
    summaries: &'a [RecordSummary],
    watermark: &Timestamp,
    zone: Tz,
) -> Result<&'a [RecordSummary], DigestError> {
    let times = summaries
        .iter()
        .map(|s| parse_timestamp(&s.last_activity_time, zone))
        .collect::<Result<Vec<_>, _>>()?;

    let end = times
        .iter()
        .position(|t| t <= watermark)
        .unwrap_or(summaries.len());

    Ok(&summaries[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcs_schemas::DEFAULT_ZONE;

    fn wm(raw: &str) -> Timestamp {
        parse_timestamp(raw, DEFAULT_ZONE).unwrap()
    }

    fn summary(id: &str, time: &str) -> RecordSummary {
        RecordSummary::new(id, format!("song {id}"), time)
    }

    fn ids(s: &[RecordSummary]) -> Vec<&str> {
        s.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn equal_time_ends_the_prefix() {
        let feed = vec![
            summary("1", "2017-01-02 00:00:00"),
            summary("2", "2017-01-01 10:21:30"),
            summary("3", "2017-01-01 09:00:00"),
        ];
        let got = cut(&feed, &wm("2017-01-01 10:21:30"), DEFAULT_ZONE).unwrap();
        assert_eq!(ids(got), vec!["1"]);
    }

    #[test]
    fn all_newer_returns_everything() {
        let feed = vec![
            summary("1", "2017-01-03 00:00:00"),
            summary("2", "2017-01-02 00:00:00"),
        ];
        let got = cut(&feed, &wm("2017-01-01 00:00:00"), DEFAULT_ZONE).unwrap();
        assert_eq!(ids(got), vec!["1", "2"]);
    }

    #[test]
    fn head_at_or_before_watermark_is_empty() {
        let feed = vec![summary("1", "2016-12-31 23:59:59")];
        assert!(cut(&feed, &wm("2017-01-01 00:00:00"), DEFAULT_ZONE)
            .unwrap()
            .is_empty());
        assert!(cut(&[], &wm("2017-01-01 00:00:00"), DEFAULT_ZONE)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_time_anywhere_fails() {
        let feed = vec![
            summary("1", "2017-01-03 00:00:00"),
            summary("2", "2016-01-01 00:00:00"),
            summary("3", "not a time"),
        ];
        let err = cut(&feed, &wm("2017-01-01 00:00:00"), DEFAULT_ZONE).unwrap_err();
        assert!(
            matches!(err, DigestError::MalformedTimestamp { ref raw, .. } if raw == "not a time"),
            "got {err:?}"
        );
    }

    #[test]
    fn maximal_prefix_property_over_every_watermark_position() {
        let feed: Vec<RecordSummary> = (0..6)
            .map(|i| summary(&i.to_string(), &format!("2017-01-0{} 12:00:00", 7 - i)))
            .collect();

        for probe in 1..=8 {
            let w = wm(&format!("2017-01-0{probe} 12:00:00"));
            let got = cut(&feed, &w, DEFAULT_ZONE).unwrap();

            let expected = feed
                .iter()
                .take_while(|s| parse_timestamp(&s.last_activity_time, DEFAULT_ZONE).unwrap() > w)
                .count();
            assert_eq!(got.len(), expected, "watermark day {probe}");
            assert_eq!(got.is_empty(), feed.is_empty() || {
                parse_timestamp(&feed[0].last_activity_time, DEFAULT_ZONE).unwrap() <= w
            });
        }
    }
}
