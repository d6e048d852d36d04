pub mod entries;
pub mod streak;
pub mod types;

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp stored by this crate. Returns `None` for
/// anything unparseable rather than failing the read path.
pub(crate) fn parse_utc(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
