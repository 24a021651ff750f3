//! Second-precision timestamps.
//!
//! Parents are bucketed by whole UTC seconds and stored as
//! `YYYY-MM-DD HH:MM:SS` text, so lookups compare formatted strings.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::errors::{HistError, Result};

const DB_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Drop sub-second precision.
pub fn truncate_to_second(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(0)
}

/// Format a timestamp the way parent rows store it (truncated to seconds).
pub fn format_db_date(date: DateTime<Utc>) -> String {
    truncate_to_second(date).format(DB_DATE_FORMAT).to_string()
}

/// Parse a stored `YYYY-MM-DD HH:MM:SS` timestamp as UTC.
pub fn parse_db_date(text: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, DB_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| HistError::Serialization {
            message: format!("invalid stored date '{}': {}", text, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_truncates_subseconds() {
        let date = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
            + chrono::Duration::milliseconds(987);
        assert_eq!(format_db_date(date), "2024-03-09 07:05:01");
    }

    #[test]
    fn test_parse_round_trips_formatted_date() {
        let date = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_db_date(&format_db_date(date)).unwrap(), date);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_db_date("yesterday").is_err());
    }
}
