//! Time utility functions

use chrono::{DateTime, SecondsFormat, Utc};

/// Convert milliseconds since Unix epoch to DateTime<Utc>
pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Format as ISO 8601 with millisecond precision and a `Z` suffix
/// (`2024-01-01T00:00:00.000Z`)
pub fn to_iso_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse ISO 8601 / RFC 3339 timestamp string to DateTime<Utc>
pub fn parse_iso_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Elapsed time between two instants, zero when `later` precedes `earlier`
pub fn elapsed_since(earlier: DateTime<Utc>, later: DateTime<Utc>) -> std::time::Duration {
    (later - earlier).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    #[test]
    fn test_millis_to_datetime_known_value() {
        // 2024-01-01 00:00:00 UTC
        let dt = millis_to_datetime(1_704_067_200_000).unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_to_iso_millis_format() {
        let dt = millis_to_datetime(1_704_067_200_123).unwrap();
        assert_eq!(to_iso_millis(dt), "2024-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_parse_iso_timestamp_valid() {
        let dt = parse_iso_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_705_314_600_000);
    }

    #[test]
    fn test_parse_iso_timestamp_invalid() {
        assert!(parse_iso_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_elapsed_since_clamps_negative() {
        let now = Utc::now();
        assert_eq!(
            elapsed_since(now, now - Duration::seconds(5)),
            std::time::Duration::ZERO
        );
        assert_eq!(
            elapsed_since(now - Duration::seconds(5), now),
            std::time::Duration::from_secs(5)
        );
    }
}
