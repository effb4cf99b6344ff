//! Small helpers shared by both pipelines: timestamp formatting, earliest-date
//! selection, and validation of comma-separated ID lists.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Formats a UTC timestamp as a JST (`UTC+9`) local string, `YYYY/MM/DD HH:MM`.
///
/// Returns `None` when no timestamp is given, so callers can thread optional
/// API fields straight through.
pub fn to_jst_string(date: Option<DateTime<Utc>>) -> Option<String> {
    let jst = FixedOffset::east_opt(JST_OFFSET_SECS).unwrap();
    date.map(|d| d.with_timezone(&jst).format("%Y/%m/%d %H:%M").to_string())
}

/// Returns the chronologically earliest of the given timestamps.
///
/// Absent values are excluded from the comparison; an all-absent (or empty)
/// input yields `None`.
pub fn min_date(dates: &[Option<DateTime<Utc>>]) -> Option<DateTime<Utc>> {
    dates.iter().flatten().min().copied()
}

/// Checks whether `input` is a non-empty comma-separated list of numbers.
///
/// Whitespace around segments is tolerated (`"1, 2, 3"`), but empty segments
/// (`"1,,3"`) and non-numeric segments (`"1,a,3"`) are rejected.
pub fn is_comma_separated_numbers(input: &str) -> bool {
    if input.is_empty() {
        return false;
    }
    input.split(',').all(|part| {
        let part = part.trim();
        !part.is_empty() && part.parse::<f64>().is_ok_and(f64::is_finite)
    })
}

/// Parses a comma-separated ID list into numeric IDs.
///
/// Validation failures are configuration errors and name the offending input.
pub fn parse_id_list(input: &str) -> Result<Vec<u64>> {
    if !is_comma_separated_numbers(input) {
        bail!("invalid ID list: {input:?} is not a comma-separated list of numbers");
    }
    input
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<u64>()
                .with_context(|| format!("invalid ID in list: {part:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_to_jst_string() {
        let date: DateTime<Utc> = "2024-01-01T00:00:00.999Z".parse().unwrap();
        assert_eq!(
            to_jst_string(Some(date)),
            Some("2024/01/01 09:00".to_string())
        );
    }

    #[test]
    fn test_to_jst_string_crosses_midnight() {
        // 16:30 UTC is 01:30 the next day in JST.
        let date = utc(2024, 3, 31, 16, 30, 0);
        assert_eq!(
            to_jst_string(Some(date)),
            Some("2024/04/01 01:30".to_string())
        );
    }

    #[test]
    fn test_to_jst_string_none() {
        assert_eq!(to_jst_string(None), None);
    }

    #[test]
    fn test_min_date() {
        let dates = [
            Some(utc(2024, 1, 5, 0, 0, 0)),
            Some(utc(2024, 1, 1, 0, 0, 0)),
            Some(utc(2024, 1, 3, 0, 0, 0)),
        ];
        assert_eq!(min_date(&dates), Some(utc(2024, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_min_date_skips_missing() {
        let dates = [None, Some(utc(2024, 1, 3, 0, 0, 0)), None];
        assert_eq!(min_date(&dates), Some(utc(2024, 1, 3, 0, 0, 0)));
    }

    #[test]
    fn test_min_date_all_missing() {
        assert_eq!(min_date(&[None, None]), None);
        assert_eq!(min_date(&[]), None);
    }

    #[test]
    fn test_is_comma_separated_numbers() {
        assert!(is_comma_separated_numbers("1,2,3"));
        assert!(is_comma_separated_numbers("1, 2, 3"));
        assert!(is_comma_separated_numbers("42"));
        assert!(!is_comma_separated_numbers(""));
        assert!(!is_comma_separated_numbers("1,a,3"));
        assert!(!is_comma_separated_numbers("1,,3"));
        assert!(!is_comma_separated_numbers(",1"));
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1, 2, 3").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list("").is_err());
        assert!(parse_id_list("1,x").is_err());
    }
}
