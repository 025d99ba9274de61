//! Timestamp and report identifier utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Prefix of every generated report identifier
pub const REPORT_ID_PREFIX: &str = "RPT-";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way it is stored and returned by the APIs
pub fn to_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current UTC time formatted with [`to_rfc3339`]
pub fn now_rfc3339() -> String {
    to_rfc3339(now())
}

/// Build the report identifier for an analysis finished at `at`
///
/// Resolution is one second, so two analyses finishing within the same
/// second share an identifier and the later one overwrites the earlier.
pub fn report_id_at(at: DateTime<Utc>) -> String {
    format!("{}{}", REPORT_ID_PREFIX, at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_id_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(report_id_at(at), "RPT-20260307090501");
    }

    #[test]
    fn test_report_id_same_second_collides() {
        let a = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(900);
        assert_eq!(report_id_at(a), report_id_at(b));
    }

    #[test]
    fn test_rfc3339_is_utc_zulu() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        assert_eq!(to_rfc3339(at), "2026-10-16T12:00:00.000000Z");
    }

    #[test]
    fn test_now_is_recent() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
        assert!(timestamp.timestamp() < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }
}
