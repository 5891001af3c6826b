use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::FetchError;
use crate::models::{PriceBar, Query};

/// Source of daily OHLCV bars.
///
/// Implementations return the bars the provider has for `query.symbol` over
/// `[query.start_date, query.end_date)`. An unknown symbol or a range without
/// trading days is an empty vector, not an error.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn daily_bars(&self, query: &Query) -> Result<Vec<PriceBar>, FetchError>;
}

/// Provider backed by a fixed map of symbol to bars. Counts calls.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, Vec<PriceBar>>,
    calls: AtomicUsize,
    failure: Mutex<Option<FetchError>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.series.insert(symbol.to_uppercase(), bars);
        self
    }

    /// Every subsequent call fails with `error` until cleared
    pub fn fail_with(&self, error: FetchError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn clear_failure(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn daily_bars(&self, query: &Query) -> Result<Vec<PriceBar>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let injected = self.failure.lock().ok().and_then(|failure| failure.clone());
        if let Some(error) = injected {
            return Err(error);
        }

        Ok(self
            .series
            .get(&query.symbol)
            .map(|bars| bars.iter().filter(|bar| query.contains(bar.date)).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(symbol: &str) -> Query {
        Query {
            symbol: symbol.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_provider_filters_range_and_counts() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let provider = InMemoryProvider::new().with_series(
            "aapl",
            vec![
                PriceBar::new(day(1), 1.0, 1.0, 1.0, 1.0, 1),
                PriceBar::new(day(2), 2.0, 2.0, 2.0, 2.0, 1),
                PriceBar::new(day(3), 3.0, 3.0, 3.0, 3.0, 1),
            ],
        );

        let bars = provider.daily_bars(&query("AAPL")).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert!(provider.daily_bars(&query("ZZZZINVALID")).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let provider = InMemoryProvider::new();
        provider.fail_with(FetchError::timeout("slow"));
        assert!(provider.daily_bars(&query("AAPL")).await.is_err());
        provider.clear_failure();
        assert!(provider.daily_bars(&query("AAPL")).await.is_ok());
    }
}
