//! Timestamp parsing shared by the XES importer and the attribute accessors

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Parse a timestamp string to `DateTime<FixedOffset>`, trying multiple formats.
///
/// # Supported Formats (in order of precedence)
/// 1. Custom format (if provided), first with timezone and then as naive datetime (assumes UTC)
/// 2. RFC3339 / ISO 8601 with offset: `2023-10-06T09:30:21+00:00`
/// 3. ISO 8601 with offset without colon: `2023-10-06T09:30:21+0000`
/// 4. Milliseconds separated by a colon: `2023-10-06T09:30:21:123+02:00`
/// 5. Naive ISO 8601 with optional fraction: `2023-10-06T09:30:21.348` (assumes UTC)
/// 6. Naive datetime with a space separator: `2023-10-06 09:30:21.890421` (assumes UTC)
pub fn parse_timestamp(time: &str, custom_format: Option<&str>) -> Option<DateTime<FixedOffset>> {
    if let Some(date_format) = custom_format {
        if let Ok(dt) = DateTime::parse_from_str(time, date_format) {
            return Some(dt);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(time, date_format) {
            return Some(dt.and_utc().into());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(time) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }

    // Some XES exports separate the milliseconds with a colon
    if let Ok(dt) = DateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S:%3f%:z") {
        return Some(dt);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().into());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(time, "%F %T%.f") {
        return Some(dt.and_utc().into());
    }

    None
}
