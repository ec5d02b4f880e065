//! Relative age labels for clip timestamps

use chrono::{Local, TimeZone};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Format how long ago `timestamp_ms` was, relative to `now_ms`.
///
/// Anything a week or older is shown as a local short month and day.
pub fn relative_age(timestamp_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(timestamp_ms).max(0);
    let minutes = elapsed / MINUTE_MS;
    let hours = elapsed / HOUR_MS;
    let days = elapsed / DAY_MS;

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        short_date(timestamp_ms)
    }
}

/// Local short month and day, e.g. "Jan 5"
pub fn short_date(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).earliest() {
        Some(date) => date.format("%b %-d").to_string(),
        None => String::from("Unknown date"),
    }
}
