//! Wall-clock timestamp codec.
//!
//! The remote source and the persisted watermark both use a zone-less
//! `YYYY-MM-DD HH:MM:SS` string that is interpreted in one fixed named zone
//! (the service operates on Japan time). RFC 3339 input is accepted as well so
//! operators can paste an explicit offset.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;

/// Fixed pattern of every persisted or sourced timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone the source's timestamps are expressed in.
pub const DEFAULT_ZONE: Tz = chrono_tz::Asia::Tokyo;

/// A zone-qualified instant.
pub type Timestamp = DateTime<Tz>;

/// A timestamp string could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError {
    pub raw: String,
    pub reason: String,
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed timestamp '{}': {}", self.raw, self.reason)
    }
}

impl std::error::Error for TimestampError {}

/// Parse `raw` as a local time in `zone` (or as RFC 3339, converted into `zone`).
pub fn parse_timestamp(raw: &str, zone: Tz) -> Result<Timestamp, TimestampError> {
    let t = raw.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(t, TIMESTAMP_FORMAT) {
        // Skipped local times (DST gaps) have no instant; ambiguous ones take the earlier.
        return zone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| TimestampError {
                raw: raw.to_string(),
                reason: format!("local time does not exist in {}", zone.name()),
            });
    }

    DateTime::parse_from_rfc3339(t)
        .map(|dt| dt.with_timezone(&zone))
        .map_err(|e| TimestampError {
            raw: raw.to_string(),
            reason: format!("expected '{TIMESTAMP_FORMAT}' or RFC 3339 ({e})"),
        })
}

/// Render in the fixed persisted pattern, in the timestamp's own zone.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Drop sub-second precision so a value survives a format/parse round trip unchanged.
pub fn truncate_to_seconds(ts: Timestamp) -> Timestamp {
    ts.with_nanosecond(0).unwrap_or(ts)
}
