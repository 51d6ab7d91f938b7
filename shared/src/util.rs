use chrono::{DateTime, Utc};

/// Current UTC instant as an RFC 3339 string (gateway timestamp format).
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse a gateway timestamp (RFC 3339, with or without offset).
///
/// Returns `None` for absent or unparseable input; callers treat a missing
/// timestamp as "unknown", never as an error.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // Timestamps without an offset (e.g. "2024-01-02T03:04:05") are UTC.
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Date portion of a date-of-birth value.
///
/// The gateway sometimes returns `YYYY-MM-DDT00:00:00`; only the calendar
/// date participates in the natural key.
pub fn date_part(value: &str) -> &str {
    value.split('T').next().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let dt = parse_timestamp(Some("2024-03-01T10:30:00+00:00")).unwrap();
        assert_eq!(dt.timestamp(), 1709289000);
    }

    #[test]
    fn test_parse_timestamp_without_offset() {
        let dt = parse_timestamp(Some("2024-03-01T10:30:00")).unwrap();
        assert_eq!(dt.timestamp(), 1709289000);
    }

    #[test]
    fn test_parse_timestamp_absent() {
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("")).is_none());
        assert!(parse_timestamp(Some("not-a-date")).is_none());
    }

    #[test]
    fn test_date_part() {
        assert_eq!(date_part("1990-05-17T00:00:00"), "1990-05-17");
        assert_eq!(date_part("1990-05-17"), "1990-05-17");
    }
}
