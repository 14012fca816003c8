//! Date/time utilities for Agora.
//!
//! Timestamps are stored by SQLite as UTC text (`YYYY-MM-DD HH:MM:SS`).

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Default display format for HTML pages.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a stored timestamp, accepting SQLite or RFC3339 text.
pub fn parse_stored(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert a stored timestamp to RFC3339 for API responses.
///
/// Returns the original string if parsing fails.
pub fn to_rfc3339(datetime_str: &str) -> String {
    match parse_stored(datetime_str) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => datetime_str.to_string(),
    }
}

/// Format a stored timestamp with a strftime-style format.
///
/// Returns the original string if parsing fails.
pub fn format_datetime(datetime_str: &str, format: &str) -> String {
    match parse_stored(datetime_str) {
        Some(dt) => dt.format(format).to_string(),
        None => datetime_str.to_string(),
    }
}

/// Format a stored timestamp with [`DISPLAY_FORMAT`].
pub fn format_display(datetime_str: &str) -> String {
    format_datetime(datetime_str, DISPLAY_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_rfc3339_from_sqlite() {
        assert_eq!(to_rfc3339("2024-01-15 12:30:00"), "2024-01-15T12:30:00Z");
    }

    #[test]
    fn test_to_rfc3339_from_rfc3339() {
        assert_eq!(
            to_rfc3339("2024-01-15T21:30:00+09:00"),
            "2024-01-15T12:30:00Z"
        );
    }

    #[test]
    fn test_invalid_input_passes_through() {
        assert_eq!(to_rfc3339("not a date"), "not a date");
        assert_eq!(format_display("not a date"), "not a date");
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("2024-01-15 12:30:45"), "2024-01-15 12:30");
        assert_eq!(
            format_datetime("2024-01-15 12:30:45", "%d/%m/%Y"),
            "15/01/2024"
        );
    }
}
