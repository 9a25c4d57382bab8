//! Output helpers for terminal rendering.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

pub const INVALID_DATE: &str = "Invalid Date";

/// Parse a backend timestamp. Offsets are honoured; naive values are UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Timestamp in the local zone with seconds, or "Invalid Date"
pub fn format_utc_to_local(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt
            .with_timezone(&Local)
            .format("%b %d, %Y, %I:%M:%S %p")
            .to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// Calendar date only, e.g. "Mar 04, 2025"
pub fn format_date(value: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&Local).format("%b %d, %Y").to_string(),
        None => INVALID_DATE.to_string(),
    }
}

/// Five-character star bar for a 0..=5 rating
pub fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Truncate to `max_len` characters, marking the cut with "..."
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
