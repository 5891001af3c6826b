use chrono::{Datelike, NaiveDate, Utc, Weekday};

use crate::error::ValidationError;

/// Parse a form date (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date_str.to_string()))
}

/// Format a date as YYYY-MM-DD
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// First day offered by the date picker when nothing was chosen
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default()
}

/// Today's date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Midnight UTC of the given date as a unix timestamp
pub fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Check if it's weekend (Saturday or Sunday)
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekdays in the half-open range [start, end)
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| !is_weekend(*day))
        .collect()
}
