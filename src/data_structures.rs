use crate::config::AppConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use stock_analyzer::api::StockAnalyzer;
use stock_analyzer::error::ValidationError;
use stock_analyzer::models::DashboardInput;
use stock_analyzer::services::CacheStats;
use stock_analyzer::utils::date::{format_date, parse_date};

// --- Type Aliases for Shared State ---

// One analyzer per process; its fetch cache is shared by every session
pub type SharedAnalyzer = Arc<StockAnalyzer>;

pub type SharedConfig = Arc<AppConfig>;

// --- Request / Response Types ---

/// Dashboard widget values as they arrive in the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    #[serde(default, deserialize_with = "present_string")]
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DashboardParams {
    /// Fill absent widgets from the configured defaults. A present but blank symbol stays blank.
    pub fn to_input(&self, config: &AppConfig, today: chrono::NaiveDate) -> Result<DashboardInput, ValidationError> {
        let date_or = |text: &Option<String>, fallback| match text.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => parse_date(t),
            _ => Ok(fallback),
        };

        Ok(DashboardInput {
            symbol: self.symbol.clone().unwrap_or_else(|| config.default_symbol.clone()),
            start_date: date_or(&self.start, config.default_start_date)?,
            end_date: date_or(&self.end, today)?,
        })
    }
}

// `symbol=` is a cleared text box, not a missing widget
fn present_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    String::deserialize(deserializer).map(Some)
}

/// Values echoed back into the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub symbol: String,
    pub start: String,
    pub end: String,
    pub max_date: String,
}

impl FormValues {
    pub fn from_input(input: &DashboardInput, today: chrono::NaiveDate) -> Self {
        Self {
            symbol: input.symbol.clone(),
            start: format_date(input.start_date),
            end: format_date(input.end_date.min(today)),
            max_date: format_date(today),
        }
    }

    /// Raw values, used when the dates could not be parsed
    pub fn from_params(params: &DashboardParams, today: chrono::NaiveDate) -> Self {
        Self {
            symbol: params.symbol.clone().unwrap_or_default(),
            start: params.start.clone().unwrap_or_default(),
            end: params.end.clone().unwrap_or_default(),
            max_date: format_date(today),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub environment: String,
    pub provider: &'static str,
    pub market_date: String,
    pub cache: CacheStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_missing_params_use_defaults() {
        let input = DashboardParams::default().to_input(&AppConfig::default(), today()).unwrap();
        assert_eq!(input.symbol, "AAPL");
        assert_eq!(input.start_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(input.end_date, today());
    }

    #[test]
    fn test_blank_symbol_stays_blank() {
        let params = DashboardParams {
            symbol: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(params.to_input(&AppConfig::default(), today()).unwrap().symbol, "");
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let params = DashboardParams {
            start: Some("2015-13-01".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            params.to_input(&AppConfig::default(), today()),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_form_values_clamp_end_to_today() {
        let input = DashboardInput::new("MSFT", NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        let form = FormValues::from_input(&input, today());
        assert_eq!(form.end, "2024-06-03");
        assert_eq!(form.max_date, "2024-06-03");
    }
}
