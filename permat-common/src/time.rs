//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as milliseconds since the Unix epoch.
///
/// Audit fields and CSV timestamp columns carry epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse an epoch-milliseconds string (CSV audit columns).
///
/// Returns `None` for anything that is not a plain integer.
pub fn parse_millis(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_millis_matches_now() {
        let millis = now_millis();
        // Epoch milliseconds for any date after 2020 exceed 1.5e12
        assert!(millis > 1_577_836_800_000); // 2020-01-01 00:00:00 UTC
    }

    #[test]
    fn test_parse_millis_plain_integer() {
        assert_eq!(parse_millis("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_millis("  42  "), Some(42));
    }

    #[test]
    fn test_parse_millis_rejects_non_integers() {
        assert_eq!(parse_millis(""), None);
        assert_eq!(parse_millis("2024-01-01"), None);
        assert_eq!(parse_millis("12.5"), None);
    }
}
