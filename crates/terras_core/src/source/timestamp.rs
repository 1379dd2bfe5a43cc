//! Source timestamp normalization.
//!
//! # Invariants
//! - ISO-8601 forms are tried before the fixed `%Y-%m-%d %H:%M:%S` form.
//! - Naive timestamps are interpreted in the configured time zone.
//! - Absent or unparseable input yields `None`, never a default.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

// `%.f` also matches a missing fraction.
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];
const ISO_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const SOURCE_NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a source "last modified" value into an offset-aware timestamp.
pub fn parse_source_timestamp(
    value: Option<&str>,
    time_zone: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let value = value.map(str::trim).filter(|value| !value.is_empty())?;

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed);
    }
    for format in ISO_OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    ISO_NAIVE_FORMATS
        .iter()
        .chain(std::iter::once(&SOURCE_NAIVE_FORMAT))
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| time_zone.from_local_datetime(&naive).single())
}

#[cfg(test)]
mod tests {
    use super::parse_source_timestamp;
    use chrono::{Datelike, FixedOffset, Timelike};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn parses_source_fixed_format_in_configured_zone() {
        let manaus = FixedOffset::west_opt(4 * 3600).unwrap();
        let parsed = parse_source_timestamp(Some("2025-10-20 19:23:06"), manaus).unwrap();
        assert_eq!(parsed.year(), 2025);
        assert_eq!(parsed.month(), 10);
        assert_eq!(parsed.day(), 20);
        assert_eq!(parsed.hour(), 19);
        assert_eq!(parsed.offset(), &manaus);
    }

    #[test]
    fn keeps_explicit_offsets() {
        let parsed = parse_source_timestamp(Some("2024-01-02T03:04:05-03:00"), utc()).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -3 * 3600);
        assert_eq!(parsed.to_rfc3339(), "2024-01-02T03:04:05-03:00");
    }

    #[test]
    fn parses_naive_iso_form() {
        let parsed = parse_source_timestamp(Some("2024-01-02T03:04:05.250"), utc()).unwrap();
        assert_eq!(parsed.second(), 5);
        assert_eq!(parsed.nanosecond(), 250_000_000);
    }

    #[test]
    fn parses_space_separated_fraction() {
        let parsed = parse_source_timestamp(Some("2025-10-20 19:23:06.5"), utc()).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-10-20T19:23:06.500+00:00");
    }

    #[test]
    fn parses_compact_offsets() {
        for value in ["2025-10-20T19:23:06+0300", "2025-10-20 19:23:06+0300"] {
            let parsed = parse_source_timestamp(Some(value), utc()).unwrap();
            assert_eq!(parsed.to_rfc3339(), "2025-10-20T19:23:06+03:00", "{value}");
        }
        let minutes_only = parse_source_timestamp(Some("2025-10-20T19:23-0300"), utc()).unwrap();
        assert_eq!(minutes_only.to_rfc3339(), "2025-10-20T19:23:00-03:00");
    }

    #[test]
    fn parses_space_separated_offset_with_fraction() {
        let parsed =
            parse_source_timestamp(Some("2025-10-20 19:23:06.25-03:00"), utc()).unwrap();
        assert_eq!(parsed.nanosecond(), 250_000_000);
        assert_eq!(parsed.offset().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn parses_naive_minute_precision() {
        let zone = FixedOffset::west_opt(3 * 3600).unwrap();
        let parsed = parse_source_timestamp(Some("2025-10-20 19:23"), zone).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-10-20T19:23:00-03:00");
    }

    #[test]
    fn unparseable_or_missing_values_yield_none() {
        assert_eq!(parse_source_timestamp(None, utc()), None);
        assert_eq!(parse_source_timestamp(Some("   "), utc()), None);
        assert_eq!(parse_source_timestamp(Some("20/10/2025"), utc()), None);
    }
}
