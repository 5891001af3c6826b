use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejected user input. Never reaches the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid ticker symbol")]
    InvalidSymbol(String),
    #[error("ticker symbol is longer than {max} characters")]
    SymbolTooLong { max: usize },
    #[error("'{0}' is not a valid date (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Failure classes reported by a market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Timeout,
    RateLimited,
    Network,
    Upstream,
    MalformedResponse,
}

impl FetchErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Network => "network",
            Self::Upstream => "upstream",
            Self::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Timeout, detail)
    }

    pub fn rate_limited(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, detail)
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, detail)
    }

    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Upstream, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::MalformedResponse, detail)
    }

    /// Message shown to the dashboard user for this failure.
    pub fn user_message(&self) -> String {
        match self.kind {
            FetchErrorKind::Timeout => "The market data provider did not answer in time. Please try again.".to_string(),
            FetchErrorKind::RateLimited => "The market data provider is rate limiting requests. Please wait a moment and try again.".to_string(),
            FetchErrorKind::Network => "Could not reach the market data provider.".to_string(),
            FetchErrorKind::Upstream => format!("The market data provider returned an error ({}).", self.detail),
            FetchErrorKind::MalformedResponse => "The market data provider sent a response that could not be read.".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return FetchError::timeout(error.to_string());
        }
        if error.is_decode() {
            return FetchError::malformed(error.to_string());
        }
        match error.status() {
            Some(status) if status.as_u16() == 429 => FetchError::rate_limited(status.to_string()),
            Some(status) => FetchError::upstream(status.to_string()),
            None => FetchError::network(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::malformed(error.to_string())
    }
}

/// Invalid analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("a market data provider is required")]
    MissingProvider,
    #[error("at least one moving average window is required")]
    NoWindows,
    #[error("moving average windows must be greater than zero")]
    ZeroWindow,
    #[error("provider client could not be created: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_includes_kind() {
        let error = FetchError::rate_limited("429 Too Many Requests");
        assert_eq!(error.to_string(), "rate_limited: 429 Too Many Requests");
    }

    #[test]
    fn test_user_message_mentions_upstream_detail() {
        let error = FetchError::upstream("503 Service Unavailable");
        assert!(error.user_message().contains("503"));
    }
}
