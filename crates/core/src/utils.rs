use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Output layout for timestamps in the cleaned table
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Parses a timestamp string into UTC
/// Supports various formats: ISO 8601, "date time+offset" as written by the collector, date only
/// Values without an offset are taken as UTC. Returns None when nothing matches.
pub fn parse_timestamp(timestamp_str: &str) -> Option<DateTime<Utc>> {
    let timestamp_str = timestamp_str.trim();
    if timestamp_str.is_empty() {
        return None;
    }

    // Try parsing as ISO 8601 with timezone (e.g., "2025-12-16T10:30:00Z" or "2025-12-16T10:30:00+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
        return Some(dt.with_timezone(&Utc));
    }

    // Space separated with offset (e.g., "2025-12-16 10:30:00+00:00")
    if let Ok(dt) = DateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    // Try parsing as ISO 8601 without timezone
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive_dt.and_utc());
    }

    // SQL datetime format (e.g., "2025-12-16 10:30:00")
    if let Ok(naive_dt) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive_dt.and_utc());
    }

    // Date only (e.g., "2025-12-16") - midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(timestamp_str, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    dateparser::parse_with_timezone(timestamp_str, &Utc).ok()
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Integer parse of a channel id cell. Float spellings such as "123.0" are truncated.
pub fn parse_channel_id(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if let Ok(id) = value.parse::<i64>() {
        return Some(id);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

/// Best-effort integer coercion; anything non-numeric becomes 0
pub fn coerce_channel_id(value: Option<&str>) -> i64 {
    parse_channel_id(value).unwrap_or(0)
}

/// Sanitizes a string for use in a filename
/// Replaces invalid filename characters with hyphens
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
