use std::sync::Arc;

use super::cache_manager::{CacheStats, FetchCache};
use super::provider::MarketDataProvider;
use crate::error::FetchError;
use crate::models::{PriceSeries, Query};
use crate::utils::{log_fetch, Logger, Timer};

/// Memoized access to daily bars.
///
/// A query is answered from the cache when the exact same
/// (symbol, start, end) was fetched before; otherwise the provider is asked
/// once. Failures are returned as-is and never cached. There is no retry.
#[derive(Clone)]
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: FetchCache,
    logger: Logger,
}

impl MarketDataFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: FetchCache) -> Self {
        Self {
            provider,
            cache,
            logger: Logger::new("FETCHER"),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn fetch(&self, query: &Query) -> Result<Arc<PriceSeries>, FetchError> {
        if query.is_empty_range() {
            self.logger.debug(&format!(
                "{}: range {}..{} holds no days, skipping provider",
                query.symbol, query.start_date, query.end_date
            ));
            return Ok(Arc::new(PriceSeries::empty(&query.symbol)));
        }

        if let Some(series) = self.cache.get(query).await {
            self.logger.debug(&format!("Cache hit for {} ({} bars)", query.symbol, series.len()));
            return Ok(series);
        }

        let timer = Timer::start("provider fetch");
        let bars = match self.provider.daily_bars(query).await {
            Ok(bars) => bars,
            Err(e) => {
                self.logger.warn_with_error(&format!("{} fetch failed via {}", query.symbol, self.provider.name()), &e);
                return Err(e);
            }
        };

        let received = bars.len();
        let bars: Vec<_> = bars
            .into_iter()
            .filter(|bar| bar.is_finite() && query.contains(bar.date))
            .collect();
        if bars.len() != received {
            self.logger.debug(&format!(
                "Dropped {} bars outside the range or with non-finite prices",
                received - bars.len()
            ));
        }

        let series = Arc::new(PriceSeries::new(&query.symbol, bars));
        log_fetch(&format!(
            "{} {}..{}: {} bars from {} in {:.1}ms",
            query.symbol,
            query.start_date,
            query.end_date,
            series.len(),
            self.provider.name(),
            timer.elapsed_ms()
        ));

        self.cache.insert(query.clone(), Arc::clone(&series)).await;
        Ok(series)
    }
}
