use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};

/// Canonical date-key format: the user's local calendar day.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT)
        .with_context(|| format!("Invalid date '{s}'. Must be YYYY-MM-DD"))
}

#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The `days` calendar days ending at `end` inclusive, oldest first.
#[must_use]
pub fn trailing_days(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .map(|offset| end - Duration::days(i64::from(offset)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(date_key(date), "2024-01-07");
    }

    #[test]
    fn test_parse_date_key_roundtrip() {
        let date = parse_date_key("2024-01-07").unwrap();
        assert_eq!(date_key(date), "2024-01-07");
        assert_eq!(parse_date_key(" 2024-01-07 ").unwrap(), date);
    }

    #[test]
    fn test_parse_date_key_invalid() {
        assert!(parse_date_key("07/01/2024").is_err());
        assert!(parse_date_key("2024-13-01").is_err());
        assert!(parse_date_key("nope").is_err());
    }

    #[test]
    fn test_trailing_days_spans_week() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let days = trailing_days(end, 7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(days[6], end);
        // strictly chronological
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_trailing_days_crosses_month_boundary() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days = trailing_days(end, 4);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_trailing_days_zero() {
        let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert!(trailing_days(end, 0).is_empty());
    }
}
