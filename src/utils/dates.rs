use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{TrackerError, TrackerResult};

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Accepts RFC 3339 (converted to UTC), naive date-times and plain
/// `YYYY-MM-DD` dates (midnight).
pub fn parse_datetime(raw: &str) -> TrackerResult<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| TrackerError::validation(format!("invalid date `{trimmed}`")))
}

/// Blank or missing input means "no date".
pub fn parse_optional_datetime(raw: Option<&str>) -> TrackerResult<Option<NaiveDateTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_datetime(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_shapes() {
        let midnight = NaiveDate::from_ymd_opt(2026, 2, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2026-02-16").unwrap(), midnight);
        assert_eq!(parse_datetime("2026-02-16T00:00:00").unwrap(), midnight);
        assert_eq!(parse_datetime("2026-02-16 00:00:00.000").unwrap(), midnight);
        assert_eq!(parse_datetime("2026-02-16T07:00:00+07:00").unwrap(), midnight);
        assert_eq!(parse_datetime("2026-02-16T00:00").unwrap(), midnight);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_datetime("16/02/2026"),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(parse_optional_datetime(None).unwrap(), None);
        assert_eq!(parse_optional_datetime(Some("  ")).unwrap(), None);
        assert!(parse_optional_datetime(Some("2026-02-16")).unwrap().is_some());
    }
}
