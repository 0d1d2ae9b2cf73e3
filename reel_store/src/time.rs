//! Timestamp formatting and parsing helpers.
//!
//! Every timestamp column in this crate's schema is stored as an RFC-3339
//! UTC string with millisecond precision, so that lexicographic `TEXT`
//! ordering in SQLite matches chronological ordering.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a UTC instant as RFC-3339 with millisecond precision, e.g.
/// `"2024-03-10T14:30:00.000Z"`.
pub fn to_rfc3339_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// RFC-3339 with offset -> UTC.
///
/// Example:
/// - "2024-03-10T09:30:00-05:00" -> "2024-03-10T14:30:00Z"
pub fn parse_ts_to_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad rfc3339: {s}"))?;
    Ok(dt.with_timezone(&Utc))
}
