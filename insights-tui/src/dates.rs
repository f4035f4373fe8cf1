//! Date parsing and formatting at the input boundaries.
//!
//! The backend sends `dd-MM-yyyy`, the add-task form uses `yyyy-MM-dd`.
//! Both are turned into `NaiveDate` immediately; nothing past this module
//! sees a date string.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::DateError;

/// Backend wire format (`25-11-2024`)
pub const BACKEND_FORMAT: &str = "%d-%m-%Y";
/// Form input format (`2024-11-25`)
pub const FORM_FORMAT: &str = "%Y-%m-%d";

/// First day of a timeline week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekStart::Monday => write!(f, "monday"),
            WeekStart::Sunday => write!(f, "sunday"),
        }
    }
}

impl std::str::FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekStart::Monday),
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            other => Err(format!("unknown week start '{other}' (expected monday or sunday)")),
        }
    }
}

pub fn parse_backend_date(input: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(input.trim(), BACKEND_FORMAT).map_err(|_| DateError {
        input: input.to_string(),
        expected: "dd-MM-yyyy",
    })
}

pub fn parse_form_date(input: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(input.trim(), FORM_FORMAT).map_err(|_| DateError {
        input: input.to_string(),
        expected: "yyyy-MM-dd",
    })
}

/// `Nov 25`
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// `Nov 25, 2024`
pub fn format_long(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

pub fn format_form(date: NaiveDate) -> String {
    date.format(FORM_FORMAT).to_string()
}

/// Latest date on or before `date` that falls on the configured week start.
pub fn start_of_week(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let first = week_start.weekday().num_days_from_monday() as i64;
    let current = date.weekday().num_days_from_monday() as i64;
    let back = (current - first).rem_euclid(7);
    date - Duration::days(back)
}

/// Shift a form date string by `days`, falling back to `fallback` when the
/// field does not hold a valid date yet.
pub fn shift_form_date(value: &str, days: i64, fallback: NaiveDate) -> String {
    let date = parse_form_date(value).unwrap_or(fallback);
    format_form(date + Duration::days(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn backend_date_formats_as_short_label() {
        let date = parse_backend_date("25-11-2024").unwrap();
        assert_eq!(date, ymd(2024, 11, 25));
        assert_eq!(format_short(date), "Nov 25");
        assert_eq!(format_long(date), "Nov 25, 2024");
    }

    #[test]
    fn both_formats_land_on_the_same_date() {
        assert_eq!(
            parse_backend_date("09-12-2024").unwrap(),
            parse_form_date("2024-12-09").unwrap()
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let err = parse_backend_date("2024-11-25").unwrap_err();
        assert_eq!(err.expected, "dd-MM-yyyy");
        assert!(parse_form_date("25-11-2024").is_err());
        assert!(parse_form_date("").is_err());
        assert!(parse_backend_date("31-02-2024").is_err());
    }

    #[test]
    fn start_of_week_monday() {
        // 2023-06-01 is a Thursday
        assert_eq!(start_of_week(ymd(2023, 6, 1), WeekStart::Monday), ymd(2023, 5, 29));
        assert_eq!(start_of_week(ymd(2023, 5, 29), WeekStart::Monday), ymd(2023, 5, 29));
        assert_eq!(start_of_week(ymd(2023, 6, 4), WeekStart::Monday), ymd(2023, 5, 29));
    }

    #[test]
    fn start_of_week_sunday() {
        assert_eq!(start_of_week(ymd(2023, 6, 1), WeekStart::Sunday), ymd(2023, 5, 28));
        assert_eq!(start_of_week(ymd(2023, 6, 4), WeekStart::Sunday), ymd(2023, 6, 4));
    }

    #[test]
    fn week_start_parses_from_cli_text() {
        assert_eq!("Sunday".parse::<WeekStart>(), Ok(WeekStart::Sunday));
        assert_eq!("mon".parse::<WeekStart>(), Ok(WeekStart::Monday));
        assert!("friday".parse::<WeekStart>().is_err());
    }

    #[test]
    fn shifting_an_empty_field_uses_fallback() {
        let today = ymd(2024, 1, 31);
        assert_eq!(shift_form_date("", 1, today), "2024-02-01");
        assert_eq!(shift_form_date("2024-03-01", -7, today), "2024-02-23");
    }
}
