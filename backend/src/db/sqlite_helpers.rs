//! SQLite helper utilities for type conversion
//!
//! Timestamps are stored as RFC 3339 TEXT with a fixed millisecond precision
//! and a `Z` suffix, so string comparison in SQL matches time order.

use chrono::{DateTime, SecondsFormat, Utc};

/// Convert a chrono DateTime to the stored timestamp format
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Get current UTC timestamp in the stored format
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

/// Escape `%`, `_` and backslash so a term matches literally under `LIKE ... ESCAPE`
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
