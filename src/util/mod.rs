//! Utility functions shared across the importer.
//!
//! - [`text`] - Unicode-aware truncation and cleanup of display strings
//! - [`content_hash`] - SHA-256 fingerprint of an export file
//! - [`parse_timestamp`] - Lenient timestamp parsing for export fields

pub mod text;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the raw export bytes, recorded with each run.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Parse a timestamp as written by the export.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or a bare
/// date (midnight UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_export_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2010, 8, 23, 14, 5, 9).unwrap();
        assert_eq!(parse_timestamp("2010-08-23T14:05:09Z"), Some(expected));
        assert_eq!(parse_timestamp("2010-08-23T16:05:09+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2010-08-23T14:05:09"), Some(expected));
        assert_eq!(
            parse_timestamp("2010-08-23"),
            Some(Utc.with_ymd_and_hms(2010, 8, 23, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
