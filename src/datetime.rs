//! Canonical date-time handling shared by validation rules and read transforms.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// The one date-time format the API accepts and returns.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats tried, in order, when normalizing stored values that are not canonical.
const LENIENT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a string in the canonical format.
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).ok()
}

/// Parse a string in the canonical format or any commonly stored variant of it.
pub fn parse_date_time_lenient(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Some(dt) = parse_date_time(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in LENIENT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_date_time(dt: &NaiveDateTime) -> String {
    dt.format(DATE_TIME_FORMAT).to_string()
}

/// Read transform: rewrite a stored date-time into the canonical format.
/// Empty values become null; values that cannot be parsed are returned unchanged.
pub fn normalize_date_time(value: Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match parse_date_time_lenient(&s) {
            Some(dt) => Value::String(format_date_time(&dt)),
            None => Value::String(s),
        },
        other => other,
    }
}

/// Whole hours between two canonical date-times (minutes and seconds dropped).
/// None when either side is missing or unparsable.
pub fn hours_between(end: Option<&str>, start: Option<&str>) -> Option<i64> {
    let end = parse_date_time(end?)?;
    let start = parse_date_time(start?)?;
    Some((end - start).num_hours())
}
