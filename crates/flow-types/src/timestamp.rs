//! Lenient ISO-8601 timestamp parsing.
//!
//! The remote service is not consistent about timestamp spelling: some records carry RFC 3339
//! values with an offset, others a naive `YYYY-MM-DDTHH:MM:SS`, and a few only a date. Naive
//! values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parses an ISO-8601 date-time (with or without offset). Date-only values are rejected.
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    OFFSET_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .or_else(|| {
            NAIVE_DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|naive| naive.and_utc())
        })
}

/// Returns `true` if `value` is an ISO-8601 date-time.
pub fn is_date_time(value: &str) -> bool {
    parse_date_time(value).is_some()
}

/// Milliseconds since the Unix epoch for a date-time or a bare date.
///
/// Anything unparsable (including blank input) sorts as the epoch itself, so callers ordering
/// events never have to drop or special-case undated ones.
pub fn timestamp_millis(value: &str) -> i64 {
    if let Some(parsed) = parse_date_time(value) {
        return parsed.timestamp_millis();
    }

    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
        .unwrap_or(0)
}
