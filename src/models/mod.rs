pub mod account;
pub mod keyword;

use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 in UTC, so stored timestamps also order lexicographically.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let formatted = format_timestamp(ts);
        assert_eq!(formatted, "2023-11-14T22:13:20.123Z");
        assert_eq!(parse_timestamp(&formatted), Some(ts));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
