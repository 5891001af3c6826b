use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::ValidationError;
use crate::utils::date::{default_start_date, parse_date};

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const MAX_SYMBOL_LEN: usize = 20;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9^][A-Z0-9.\-^=]*$").expect("symbol pattern is valid"))
}

/// Raw values as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardInput {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DashboardInput {
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start_date,
            end_date,
        }
    }

    /// The form's initial state: AAPL from 2015-01-01 up to today
    pub fn defaults(today: NaiveDate) -> Self {
        Self::new(DEFAULT_SYMBOL, default_start_date(), today)
    }

    /// Build input from optional text fields. Missing fields fall back to the defaults;
    /// a present but blank symbol stays blank.
    pub fn from_fields(
        symbol: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let defaults = Self::defaults(today);
        let start_date = match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => parse_date(text)?,
            None => defaults.start_date,
        };
        let end_date = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => parse_date(text)?,
            None => defaults.end_date,
        };

        Ok(Self {
            symbol: symbol.map(String::from).unwrap_or(defaults.symbol),
            start_date,
            end_date,
        })
    }
}

/// A validated request for daily bars. Used as the fetch cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Query {
    /// Validate user input.
    ///
    /// Returns `Ok(None)` when the symbol is blank: the dashboard stays idle.
    /// The end date is clamped to `today`. A start date after the end date is
    /// accepted and resolves to an empty series downstream.
    pub fn from_input(input: &DashboardInput, today: NaiveDate) -> Result<Option<Self>, ValidationError> {
        let symbol = normalize_symbol(&input.symbol);
        if symbol.is_empty() {
            return Ok(None);
        }
        if symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong { max: MAX_SYMBOL_LEN });
        }
        if !symbol_pattern().is_match(&symbol) {
            return Err(ValidationError::InvalidSymbol(symbol));
        }

        Ok(Some(Self {
            symbol,
            start_date: input.start_date,
            end_date: input.end_date.min(today),
        }))
    }

    /// Half-open range [start, end) holds no days
    pub fn is_empty_range(&self) -> bool {
        self.start_date >= self.end_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date
    }
}

/// Trim surrounding whitespace and uppercase.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_symbol_is_trimmed_and_uppercased() {
        let input = DashboardInput::new("  aapl ", date(2015, 1, 1), date(2015, 6, 1));
        let query = Query::from_input(&input, date(2024, 1, 1)).unwrap().unwrap();
        assert_eq!(query.symbol, "AAPL");
    }

    #[test]
    fn test_blank_symbol_means_idle() {
        let input = DashboardInput::new("   ", date(2015, 1, 1), date(2015, 6, 1));
        assert_eq!(Query::from_input(&input, date(2024, 1, 1)).unwrap(), None);
    }

    #[test]
    fn test_end_date_clamped_to_today() {
        let today = date(2024, 1, 10);
        let input = DashboardInput::new("MSFT", date(2023, 1, 1), date(2030, 1, 1));
        let query = Query::from_input(&input, today).unwrap().unwrap();
        assert_eq!(query.end_date, today);
    }

    #[test]
    fn test_inverted_range_is_accepted_as_empty() {
        let input = DashboardInput::new("MSFT", date(2023, 6, 1), date(2023, 1, 1));
        let query = Query::from_input(&input, date(2024, 1, 1)).unwrap().unwrap();
        assert!(query.is_empty_range());
    }

    #[test]
    fn test_symbol_characters_checked() {
        let today = date(2024, 1, 1);
        for ok in ["BRK.B", "^GSPC", "EURUSD=X", "BTC-USD", "7203.T"] {
            let input = DashboardInput::new(ok, date(2023, 1, 1), today);
            assert!(Query::from_input(&input, today).unwrap().is_some(), "{ok} should be accepted");
        }

        let input = DashboardInput::new("AAPL; DROP", date(2023, 1, 1), today);
        assert!(matches!(
            Query::from_input(&input, today),
            Err(ValidationError::InvalidSymbol(_))
        ));

        let input = DashboardInput::new("A".repeat(21), date(2023, 1, 1), today);
        assert_eq!(
            Query::from_input(&input, today),
            Err(ValidationError::SymbolTooLong { max: MAX_SYMBOL_LEN })
        );
    }

    #[test]
    fn test_from_fields_defaults() {
        let today = date(2024, 5, 2);
        let input = DashboardInput::from_fields(None, None, None, today).unwrap();
        assert_eq!(input, DashboardInput::new("AAPL", date(2015, 1, 1), today));

        let blank = DashboardInput::from_fields(Some(""), Some("2020-01-01"), Some(""), today).unwrap();
        assert_eq!(blank.symbol, "");
        assert_eq!(blank.start_date, date(2020, 1, 1));
        assert_eq!(blank.end_date, today);

        assert!(matches!(
            DashboardInput::from_fields(Some("AAPL"), Some("01/02/2020"), None, today),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_range_is_half_open() {
        let query = Query {
            symbol: "AAPL".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 3),
        };
        assert!(query.contains(date(2024, 1, 1)));
        assert!(query.contains(date(2024, 1, 2)));
        assert!(!query.contains(date(2024, 1, 3)));
    }
}
