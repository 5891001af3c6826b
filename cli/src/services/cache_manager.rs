use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::models::{PriceSeries, Query};
use crate::utils::log_cache;

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of queries kept. 0 disables caching.
    pub capacity: usize,
    /// Entries older than this are refetched. `None` keeps them for the process lifetime.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

#[derive(Debug)]
struct CacheEntry {
    series: Arc<PriceSeries>,
    inserted_at: Instant,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<Query, CacheEntry>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recently_used(&mut self) -> Option<Query> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(query, _)| query.clone())?;
        self.entries.remove(&oldest);
        self.evictions += 1;
        Some(oldest)
    }
}

/// Fetch results keyed by the exact query, shared by every session in the process.
///
/// Least-recently-used entries are evicted once `capacity` is reached. Entries
/// are immutable once written, so a single mutex around the map is enough.
#[derive(Debug, Clone)]
pub struct FetchCache {
    inner: Arc<Mutex<CacheInner>>,
    config: CacheConfig,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl FetchCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            config,
        }
    }

    pub fn disabled() -> Self {
        Self::new(CacheConfig { capacity: 0, ttl: None })
    }

    pub fn is_disabled(&self) -> bool {
        self.config.capacity == 0
    }

    pub async fn get(&self, query: &Query) -> Option<Arc<PriceSeries>> {
        let mut inner = self.inner.lock().await;
        let now = inner.tick();

        let expired = match (inner.entries.get(query), self.config.ttl) {
            (Some(entry), Some(ttl)) => entry.inserted_at.elapsed() >= ttl,
            _ => false,
        };
        if expired {
            inner.entries.remove(query);
            inner.expirations += 1;
            log_cache(&format!("Expired {} {}..{}", query.symbol, query.start_date, query.end_date));
        }

        let found = inner.entries.get_mut(query).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.series)
        });
        match found {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        found
    }

    pub async fn insert(&self, query: Query, series: Arc<PriceSeries>) {
        if self.is_disabled() {
            return;
        }

        let mut inner = self.inner.lock().await;
        let now = inner.tick();

        if !inner.entries.contains_key(&query) && inner.entries.len() >= self.config.capacity {
            if let Some(evicted) = inner.evict_least_recently_used() {
                log_cache(&format!(
                    "Evicted {} {}..{}",
                    evicted.symbol, evicted.start_date, evicted.end_date
                ));
            }
        }

        inner.entries.insert(
            query,
            CacheEntry {
                series,
                inserted_at: Instant::now(),
                last_used: now,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            capacity: self.config.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(symbol: &str) -> Query {
        Query {
            symbol: symbol.to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(),
        }
    }

    fn series(symbol: &str) -> Arc<PriceSeries> {
        Arc::new(PriceSeries::empty(symbol))
    }

    #[tokio::test]
    async fn test_get_after_insert_hits() {
        let cache = FetchCache::default();
        assert!(cache.get(&query("AAPL")).await.is_none());

        cache.insert(query("AAPL"), series("AAPL")).await;
        let cached = cache.get(&query("AAPL")).await.unwrap();
        assert_eq!(cached.symbol(), "AAPL");

        let stats = cache.stats().await;
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_key_includes_dates() {
        let cache = FetchCache::default();
        cache.insert(query("AAPL"), series("AAPL")).await;

        let mut other = query("AAPL");
        other.end_date = NaiveDate::from_ymd_opt(2015, 6, 2).unwrap();
        assert!(cache.get(&other).await.is_none());
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let cache = FetchCache::new(CacheConfig { capacity: 2, ttl: None });
        cache.insert(query("AAPL"), series("AAPL")).await;
        cache.insert(query("MSFT"), series("MSFT")).await;

        // touch AAPL so MSFT becomes the oldest
        assert!(cache.get(&query("AAPL")).await.is_some());
        cache.insert(query("GOOG"), series("GOOG")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&query("MSFT")).await.is_none());
        assert!(cache.get(&query("AAPL")).await.is_some());
        assert!(cache.get(&query("GOOG")).await.is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_ttl_expires_entries() {
        let cache = FetchCache::new(CacheConfig {
            capacity: 4,
            ttl: Some(Duration::from_millis(10)),
        });
        cache.insert(query("AAPL"), series("AAPL")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get(&query("AAPL")).await.is_none());
        assert_eq!(cache.stats().await.expirations, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let cache = FetchCache::disabled();
        cache.insert(query("AAPL"), series("AAPL")).await;
        assert!(cache.get(&query("AAPL")).await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
