//! Discord snowflakes carry their creation time in the top 42 bits.

use chrono::{DateTime, Utc};

/// 2015-01-01T00:00:00Z in unix milliseconds.
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Creation time encoded in a snowflake id.
pub fn created_at(id: u64) -> DateTime<Utc> {
    let ms = (id >> 22) as i64 + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Smallest snowflake that could have been created at `ts`. Every id below
/// it belongs to a message created strictly before `ts`. Returns 0 for
/// instants before the Discord epoch.
pub fn lower_bound(ts: DateTime<Utc>) -> u64 {
    let ms = ts.timestamp_millis() - DISCORD_EPOCH_MS;
    if ms <= 0 { 0 } else { (ms as u64) << 22 }
}
