//! Builder for wiring a provider, cache and analysis settings together

use std::sync::Arc;

use crate::api::analyzer::{AnalysisSettings, StockAnalyzer, DEFAULT_TAIL_ROWS};
use crate::error::BuildError;
use crate::services::{CacheConfig, FetchCache, MarketDataFetcher, MarketDataProvider, YahooConfig, YahooProvider};
use crate::utils::DEFAULT_WINDOWS;

/// Builder for configuring a [`StockAnalyzer`]
///
/// Provides a fluent interface for setting up the pipeline.
///
/// # Example
/// ```rust
/// use stock_analyzer::api::AnalyzerBuilder;
/// use stock_analyzer::services::{CacheConfig, InMemoryProvider};
/// use std::sync::Arc;
///
/// let analyzer = AnalyzerBuilder::new()
///     .with_provider(Arc::new(InMemoryProvider::new()))
///     .with_cache_config(CacheConfig { capacity: 8, ttl: None })
///     .with_windows(vec![20, 50])
///     .build()
///     .unwrap();
/// assert_eq!(analyzer.settings().windows, vec![20, 50]);
/// ```
pub struct AnalyzerBuilder {
    provider: Option<Arc<dyn MarketDataProvider>>,
    cache: Option<FetchCache>,
    cache_config: CacheConfig,
    windows: Vec<usize>,
    tail_rows: usize,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            provider: None,
            cache: None,
            cache_config: CacheConfig::default(),
            windows: DEFAULT_WINDOWS.to_vec(),
            tail_rows: DEFAULT_TAIL_ROWS,
        }
    }

    /// Start from a Yahoo Finance provider
    pub fn yahoo(config: YahooConfig) -> Result<Self, BuildError> {
        let provider = YahooProvider::new(config).map_err(|e| BuildError::Client(e.to_string()))?;
        Ok(Self::new().with_provider(Arc::new(provider)))
    }

    /// Set the data source
    pub fn with_provider(mut self, provider: Arc<dyn MarketDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Share an existing cache instead of creating one
    pub fn with_cache(mut self, cache: FetchCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Configure the cache created at build time
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Set the moving average windows, in display order
    pub fn with_windows(mut self, windows: Vec<usize>) -> Self {
        self.windows = windows;
        self
    }

    /// Set how many of the most recent bars the report keeps
    pub fn with_tail_rows(mut self, rows: usize) -> Self {
        self.tail_rows = rows;
        self
    }

    /// Build the analyzer
    pub fn build(self) -> Result<StockAnalyzer, BuildError> {
        let provider = self.provider.ok_or(BuildError::MissingProvider)?;
        if self.windows.is_empty() {
            return Err(BuildError::NoWindows);
        }
        if self.windows.contains(&0) {
            return Err(BuildError::ZeroWindow);
        }

        let cache = self.cache.unwrap_or_else(|| FetchCache::new(self.cache_config));
        let fetcher = MarketDataFetcher::new(provider, cache);
        Ok(StockAnalyzer::new(
            fetcher,
            AnalysisSettings {
                windows: self.windows,
                tail_rows: self.tail_rows,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryProvider;

    #[test]
    fn test_defaults() {
        let analyzer = AnalyzerBuilder::new()
            .with_provider(Arc::new(InMemoryProvider::new()))
            .build()
            .unwrap();
        assert_eq!(analyzer.settings().windows, vec![100, 200]);
        assert_eq!(analyzer.settings().tail_rows, 5);
        assert_eq!(analyzer.provider_name(), "in-memory");
    }

    #[test]
    fn test_rejects_incomplete_configuration() {
        assert!(matches!(AnalyzerBuilder::new().build(), Err(BuildError::MissingProvider)));

        let no_windows = AnalyzerBuilder::new()
            .with_provider(Arc::new(InMemoryProvider::new()))
            .with_windows(vec![])
            .build();
        assert!(matches!(no_windows, Err(BuildError::NoWindows)));

        let zero = AnalyzerBuilder::new()
            .with_provider(Arc::new(InMemoryProvider::new()))
            .with_windows(vec![100, 0])
            .build();
        assert!(matches!(zero, Err(BuildError::ZeroWindow)));
    }

    #[tokio::test]
    async fn test_shared_cache_is_used() {
        let cache = FetchCache::new(CacheConfig { capacity: 3, ttl: None });
        let analyzer = AnalyzerBuilder::new()
            .with_provider(Arc::new(InMemoryProvider::new()))
            .with_cache(cache.clone())
            .build()
            .unwrap();
        assert_eq!(analyzer.cache_stats().await.capacity, 3);
    }

    #[test]
    fn test_yahoo_builder() {
        let builder = AnalyzerBuilder::yahoo(YahooConfig::default()).unwrap();
        let analyzer = builder.build().unwrap();
        assert_eq!(analyzer.provider_name(), "yahoo");
    }
}
