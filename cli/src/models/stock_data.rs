use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// All price fields are finite numbers
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Daily bars for one symbol, ordered by date with no duplicate dates.
/// Non-trading days are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

// Deserialized bars go through `PriceSeries::new` for ordering
#[derive(Deserialize)]
struct RawPriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl From<RawPriceSeries> for PriceSeries {
    fn from(raw: RawPriceSeries) -> Self {
        PriceSeries::new(raw.symbol, raw.bars)
    }
}

impl PriceSeries {
    /// Build a series, sorting by date. When two bars share a date the later one wins.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: deduped,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|bar| bar.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|bar| bar.date)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|bar| bar.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    /// The last `n` bars (or all of them when the series is shorter)
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        PriceBar::new(date, close, close, close, close, 1_000)
    }

    #[test]
    fn test_new_sorts_and_drops_duplicate_dates() {
        let series = PriceSeries::new("AAPL", vec![bar(5, 3.0), bar(4, 1.0), bar(5, 4.0), bar(6, 5.0)]);

        let dates = series.dates();
        assert_eq!(dates.len(), 3);
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(series.closes(), vec![1.0, 4.0, 5.0]);
    }

    #[test]
    fn test_deserialized_series_is_sorted_and_deduplicated() {
        let json = r#"{"symbol":"AAPL","bars":[
            {"date":"2024-03-05","open":3.0,"high":3.0,"low":3.0,"close":3.0,"volume":1000},
            {"date":"2024-03-04","open":1.0,"high":1.0,"low":1.0,"close":1.0,"volume":1000},
            {"date":"2024-03-05","open":4.0,"high":4.0,"low":4.0,"close":4.0,"volume":1000}
        ]}"#;

        let series: PriceSeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.symbol(), "AAPL");
        assert_eq!(series.dates(), vec![bar(4, 1.0).date, bar(5, 4.0).date]);
        assert_eq!(series.closes(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_tail_clamps_to_length() {
        let series = PriceSeries::new("AAPL", vec![bar(4, 1.0), bar(5, 2.0)]);
        assert_eq!(series.tail(5).len(), 2);
        assert_eq!(series.tail(1)[0].close, 2.0);
        assert!(PriceSeries::empty("AAPL").tail(5).is_empty());
    }

    #[test]
    fn test_non_finite_bar_detection() {
        let mut broken = bar(4, 1.0);
        broken.close = f64::NAN;
        assert!(!broken.is_finite());
        assert!(bar(4, 1.0).is_finite());
    }
}
