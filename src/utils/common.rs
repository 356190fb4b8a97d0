//! Common utility functions

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a datetime the way KeePass XML stores it (`2017-12-20T18:25:28.372Z`)
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a Unix epoch value given in seconds
///
/// Accepts integers and fractional values. Returns `None` for anything
/// that is not a finite number or falls outside chrono's range.
pub fn parse_epoch(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }

    let secs = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let millis = (secs * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Resolve an optional epoch value into a timestamp
///
/// Missing, unparseable, and pre-2000 values all become the current time.
pub fn resolve_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(parse_epoch)
        .filter(|dt| dt.timestamp() >= crate::MIN_VALID_TIMESTAMP)
        .unwrap_or_else(now)
}

/// Get current UTC datetime
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.timestamp_millis_opt(1513794328372).unwrap();
        assert_eq!(format_timestamp(&dt), "2017-12-20T18:25:28.372Z");

        let dt = Utc.with_ymd_and_hms(2016, 12, 15, 17, 23, 54).unwrap();
        assert_eq!(format_timestamp(&dt), "2016-12-15T17:23:54.000Z");
    }

    #[test]
    fn test_parse_epoch() {
        let dt = parse_epoch("1513796400").unwrap();
        assert_eq!(dt.timestamp(), 1513796400);

        let dt = parse_epoch(" 1513796400.5 ").unwrap();
        assert_eq!(dt.timestamp_millis(), 1513796400500);

        assert!(parse_epoch("").is_none());
        assert!(parse_epoch("yesterday").is_none());
        assert!(parse_epoch("NaN").is_none());
        assert!(parse_epoch("1e300").is_none());
    }

    #[test]
    fn test_resolve_timestamp_keeps_recent_values() {
        let dt = resolve_timestamp(Some("946681200"));
        assert_eq!(dt.timestamp(), 946681200);
        assert_eq!(format_timestamp(&dt), "1999-12-31T23:00:00.000Z");

        let dt = resolve_timestamp(Some("1600000000"));
        assert_eq!(format_timestamp(&dt), "2020-09-13T12:26:40.000Z");
    }

    #[test]
    fn test_resolve_timestamp_falls_back_to_now() {
        for value in [Some("946681199"), Some("0"), Some("-5"), Some("garbage"), None] {
            let before = Utc::now();
            let dt = resolve_timestamp(value);
            let after = Utc::now();
            assert!(dt >= before && dt <= after, "value {:?} not replaced", value);
        }
    }

    #[test]
    fn test_now() {
        let before = Utc::now();
        let result = now();
        let after = Utc::now();
        assert!(result >= before);
        assert!(result <= after);
    }
}
