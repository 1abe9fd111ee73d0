use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{BlobGapError, Result};

// ── Timestamp normalisation ───────────────────────────────────────────────────

/// Offset-carrying layouts tried after RFC 3339 (space separator, compact offset).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Offset-free layouts; these are read as UTC already.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 timestamp into a UTC instant without an offset.
///
/// * A trailing `Z` is rewritten to `+00:00`.
/// * An explicit numeric offset is applied and then discarded.
/// * A string without an offset is taken to be UTC as-is.
/// * A bare date means midnight UTC.
///
/// Anything else yields [`BlobGapError::InvalidTimestamp`].
pub fn normalize_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(BlobGapError::InvalidTimestamp(raw.to_string()));
    }

    let normalised = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Ok(dt.naive_utc());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalised, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalised, fmt) {
            return Ok(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalised, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive);
        }
    }

    debug!("could not parse timestamp \"{}\"", raw);
    Err(BlobGapError::InvalidTimestamp(raw.to_string()))
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS`, with microseconds only when present.
pub fn format_space_separated(ts: &NaiveDateTime) -> String {
    if ts.and_utc().timestamp_subsec_micros() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Seconds elapsed from `earlier` to `later` (negative if reversed).
pub fn seconds_between(earlier: &NaiveDateTime, later: &NaiveDateTime) -> f64 {
    let delta = *later - *earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_z_suffix_and_offset_agree() {
        let z = normalize_timestamp("2024-01-01T00:00:00Z").unwrap();
        let plus_two = normalize_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(z, plus_two);
        assert_eq!(z, ymd_hms(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_negative_offset_crosses_midnight() {
        let ts = normalize_timestamp("2023-12-31T20:30:00-05:00").unwrap();
        assert_eq!(ts, ymd_hms(2024, 1, 1, 1, 30, 0));
    }

    #[test]
    fn test_no_offset_is_utc() {
        let ts = normalize_timestamp("2024-03-05T10:11:12").unwrap();
        assert_eq!(ts, ymd_hms(2024, 3, 5, 10, 11, 12));
    }

    #[test]
    fn test_fractional_seconds_kept() {
        let ts = normalize_timestamp("2024-03-05T10:11:12.250Z").unwrap();
        assert_eq!(ts.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_space_separator_with_offset() {
        let ts = normalize_timestamp("2024-01-01 03:00:00+03:00").unwrap();
        assert_eq!(ts, ymd_hms(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_compact_offset() {
        let ts = normalize_timestamp("2024-01-01T01:00:00+0100").unwrap();
        assert_eq!(ts, ymd_hms(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_date_only_is_midnight() {
        let ts = normalize_timestamp("2024-06-30").unwrap();
        assert_eq!(ts, ymd_hms(2024, 6, 30, 0, 0, 0));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let ts = normalize_timestamp("  2024-01-01T00:00:00Z \n").unwrap();
        assert_eq!(ts, ymd_hms(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_malformed_is_invalid_timestamp() {
        for bad in ["", "yesterday", "2024-13-01T00:00:00Z", "1700000000", "2024-01-01T25:00"] {
            let err = normalize_timestamp(bad).unwrap_err();
            assert!(
                matches!(err, BlobGapError::InvalidTimestamp(_)),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_format_space_separated() {
        let ts = ymd_hms(2024, 1, 2, 3, 4, 5);
        assert_eq!(format_space_separated(&ts), "2024-01-02 03:04:05");
        let frac = normalize_timestamp("2024-01-02T03:04:05.5Z").unwrap();
        assert_eq!(format_space_separated(&frac), "2024-01-02 03:04:05.500000");
    }

    #[test]
    fn test_seconds_between() {
        let a = ymd_hms(2024, 1, 1, 0, 0, 0);
        let b = ymd_hms(2024, 1, 1, 0, 10, 0);
        assert_eq!(seconds_between(&a, &b), 600.0);
        assert_eq!(seconds_between(&b, &a), -600.0);
    }
}
