use async_trait::async_trait;
use chrono::DateTime;
use rand::seq::IndexedRandom;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::provider::MarketDataProvider;
use crate::error::FetchError;
use crate::models::{PriceBar, Query};
use crate::utils::{unix_midnight, Logger};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub rate_limit_per_minute: u32,
    pub random_agent: bool,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit_per_minute: 60,
            random_agent: true,
        }
    }
}

/// Sliding one-minute window over outgoing requests. A limit of 0 disables it.
#[derive(Debug)]
struct RateLimiter {
    per_minute: u32,
    request_times: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            request_times: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until one more request fits in the window, then record it
    async fn acquire(&self) {
        if self.per_minute == 0 {
            return;
        }
        let window = Duration::from_secs(60);

        loop {
            let wait = {
                let mut times = self.request_times.lock().await;
                let now = Instant::now();
                while times.front().is_some_and(|t| now.duration_since(*t) >= window) {
                    times.pop_front();
                }

                if times.len() < self.per_minute as usize {
                    times.push_back(now);
                    return;
                }

                match times.front() {
                    Some(oldest) => window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!(wait_ms = wait.as_millis() as u64, "Provider rate limit reached, waiting");
            sleep(wait + Duration::from_millis(100)).await;
        }
    }
}

/// Daily bars from the Yahoo Finance chart API
pub struct YahooProvider {
    client: Client,
    base_url: String,
    limiter: RateLimiter,
    user_agents: Vec<String>,
    random_agent: bool,
    logger: Logger,
}

impl YahooProvider {
    pub fn new(config: YahooConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0".to_string(),
        ];

        Ok(Self {
            client,
            base_url: config.base_url,
            limiter: RateLimiter::new(config.rate_limit_per_minute),
            user_agents,
            random_agent: config.random_agent,
            logger: Logger::new("YAHOO"),
        })
    }

    fn get_user_agent(&self) -> &str {
        let chosen = if self.random_agent {
            self.user_agents.choose(&mut rand::rng())
        } else {
            self.user_agents.first()
        };
        chosen.map(String::as_str).unwrap_or_default()
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::network(format!("invalid provider url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::network(format!("provider url '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn daily_bars(&self, query: &Query) -> Result<Vec<PriceBar>, FetchError> {
        self.limiter.acquire().await;

        let url = self.chart_url(&query.symbol)?;
        let period1 = unix_midnight(query.start_date).to_string();
        let period2 = unix_midnight(query.end_date).to_string();

        self.logger.debug(&format!(
            "Requesting {} daily bars {}..{}",
            query.symbol, query.start_date, query.end_date
        ));

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ])
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", self.get_user_agent())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let result = classify_response(status, &body, query);
        if let Err(e) = &result {
            self.logger.warn_with_error(&format!("{} answered {}", query.symbol, status), e);
        }
        result
    }
}

/// Map an HTTP status and body to bars or a fetch error.
///
/// 404 means an unknown symbol and yields no bars, 429 is rate limiting, and
/// every other non-success status is an upstream failure.
fn classify_response(status: StatusCode, body: &str, query: &Query) -> Result<Vec<PriceBar>, FetchError> {
    if status.is_success() {
        parse_chart(body, query)
    } else if status == StatusCode::NOT_FOUND {
        Ok(parse_chart(body, query).unwrap_or_default())
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(FetchError::rate_limited(status.to_string()))
    } else {
        Err(FetchError::upstream(status.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Turn a chart payload into bars inside the query's range.
///
/// Unknown symbols and empty ranges come back as an empty vector. Bars with a
/// missing price are skipped. Timestamps are shifted by the exchange's UTC
/// offset so each bar carries its local trading date.
fn parse_chart(body: &str, query: &Query) -> Result<Vec<PriceBar>, FetchError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND_CODE {
            return Ok(Vec::new());
        }
        return Err(FetchError::upstream(format!(
            "{}: {}",
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(Vec::new());
    };
    let Some(quote) = result.indicators.and_then(|ind| ind.quote.into_iter().next()) else {
        return Err(FetchError::malformed("chart result has timestamps but no quote data"));
    };

    let length = timestamps.len();
    if [quote.open.len(), quote.high.len(), quote.low.len(), quote.close.len()]
        .iter()
        .any(|&len| len != length)
    {
        return Err(FetchError::malformed("inconsistent array lengths in quote data"));
    }

    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let mut bars = Vec::with_capacity(length);

    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(time) = DateTime::from_timestamp(timestamp + offset, 0) else {
            return Err(FetchError::malformed(format!("invalid timestamp {} at index {}", timestamp, i)));
        };
        let date = time.date_naive();
        if !query.contains(date) {
            continue;
        }

        if let (Some(open), Some(high), Some(low), Some(close)) =
            (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
        {
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0).max(0.0) as u64;
            bars.push(PriceBar::new(date, open, high, low, close, volume));
        }
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use chrono::NaiveDate;

    fn query() -> Query {
        Query {
            symbol: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2015, 1, 6).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_yahoo_provider_creation() {
        let provider = YahooProvider::new(YahooConfig::default());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_chart_url_appends_symbol_path() {
        let provider = YahooProvider::new(YahooConfig {
            base_url: "https://example.com/".to_string(),
            ..YahooConfig::default()
        })
        .unwrap();

        let url = provider.chart_url("BRK.B").unwrap();
        assert_eq!(url.as_str(), "https://example.com/v8/finance/chart/BRK.B");
    }

    #[test]
    fn test_parse_chart_uses_exchange_offset_and_skips_gaps() {
        // 14:30 UTC on 2015-01-02, 2015-01-05 and 2015-01-06
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"AAPL","gmtoffset":-18000},
            "timestamp":[1420209000,1420468200,1420554600],
            "indicators":{"quote":[{
                "open":[111.39,108.29,106.54],
                "high":[111.44,108.65,107.43],
                "low":[107.35,105.41,104.63],
                "close":[109.33,null,106.26],
                "volume":[53204600,64285500,65797100]
            }]}
        }],"error":null}}"#;

        let bars = parse_chart(body, &query()).unwrap();
        // second bar has no close, third falls on the exclusive end date
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2015, 1, 2).unwrap());
        assert_eq!(bars[0].close, 109.33);
        assert_eq!(bars[0].volume, 53_204_600);
    }

    #[test]
    fn test_parse_chart_not_found_is_empty() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart(body, &query()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart(body, &query()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_errors_are_classified() {
        let err = parse_chart("<html>oops</html>", &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::MalformedResponse);

        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = parse_chart(body, &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Upstream);

        let body = r#"{"chart":{"result":[{"timestamp":[1420209000],"indicators":{"quote":[{"open":[1.0],"high":[1.0],"low":[],"close":[1.0]}]}}]}}"#;
        let err = parse_chart(body, &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::MalformedResponse);
    }

    #[test]
    fn test_not_found_status_is_empty() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(classify_response(StatusCode::NOT_FOUND, body, &query()).unwrap().is_empty());
        assert!(classify_response(StatusCode::NOT_FOUND, "Not Found", &query()).unwrap().is_empty());
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let err = classify_response(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests", &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::RateLimited);
    }

    #[test]
    fn test_server_error_is_upstream() {
        let err = classify_response(StatusCode::INTERNAL_SERVER_ERROR, "", &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Upstream);

        let err = classify_response(StatusCode::FORBIDDEN, "{}", &query()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Upstream);
    }

    #[test]
    fn test_success_status_parses_chart() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":-18000},"timestamp":[1420209000],
            "indicators":{"quote":[{"open":[111.39],"high":[111.44],"low":[107.35],"close":[109.33],"volume":[53204600]}]}}],"error":null}}"#;
        let bars = classify_response(StatusCode::OK, body, &query()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 109.33);
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst_up_to_limit() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.request_times.lock().await.len(), 3);
    }
}
