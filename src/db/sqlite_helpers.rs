//! SQLite helper utilities for type conversion
//!
//! SQLite has no timestamp type; timestamps are stored as RFC 3339 TEXT.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{StoreError, StoreResult};

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Convert a chrono DateTime to ISO8601 string
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp back into a DateTime.
///
/// Accepts RFC 3339 and SQLite's `datetime()` format ("YYYY-MM-DD HH:MM:SS").
pub fn str_to_datetime(
    table: &'static str,
    column: &'static str,
    s: &str,
) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| StoreError::Decode {
            table,
            column,
            message: format!("invalid datetime '{}': {}", s, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2022, 12, 30, 0, 12, 21).unwrap();
        let s = datetime_to_str(dt);
        assert_eq!(s, "2022-12-30T00:12:21Z");
        assert_eq!(str_to_datetime("repositories", "created_at", &s).unwrap(), dt);
    }

    #[test]
    fn test_sqlite_datetime_format() {
        let parsed = str_to_datetime("repositories", "created_at", "2024-01-15 10:30:45").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.month(), 1);
        assert_eq!(parsed.day(), 15);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = str_to_datetime("repositories", "created_at", "yesterday").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode {
                column: "created_at",
                ..
            }
        ));
    }
}
