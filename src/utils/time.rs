//! Time utilities: parsing timestamps given on the command line.

use crate::errors::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// Parse `YYYY-MM-DD HH:MM[:SS]` (a `T` separator is accepted too).
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

/// Accept a full timestamp, or a bare `HH:MM` on `default_date`.
pub fn parse_moment(s: &str, default_date: NaiveDate) -> AppResult<NaiveDateTime> {
    parse_datetime(s)
        .or_else(|| parse_time(s).map(|t| default_date.and_time(t)))
        .ok_or_else(|| AppError::InvalidTime(s.to_string()))
}

pub fn parse_optional_moment(
    input: Option<&String>,
    default_date: NaiveDate,
) -> AppResult<Option<NaiveDateTime>> {
    input.map(|s| parse_moment(s, default_date)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_accept_full_and_short_forms() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let full = parse_moment("2025-03-07 09:15", day).unwrap();
        assert_eq!(parse_moment("09:15", day).unwrap(), full);
        assert_eq!(parse_moment("2025-03-07T09:15:00", day).unwrap(), full);
        assert!(matches!(
            parse_moment("9 o'clock", day),
            Err(AppError::InvalidTime(_))
        ));
    }
}
