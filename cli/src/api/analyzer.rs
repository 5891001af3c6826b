//! One pass of the dashboard pipeline: validate, fetch, derive, summarize.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::FetchError;
use crate::models::{
    AnalysisReport, ChartLine, DashboardInput, DerivedSeries, LineChart, PriceSeries, Query, RenderModel,
    LOADED_MESSAGE, NO_DATA_MESSAGE,
};
use crate::services::{CacheStats, MarketDataFetcher};
use crate::utils::{compute_moving_averages, summarize, Timer, DEFAULT_WINDOWS};

pub const DEFAULT_TAIL_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub windows: Vec<usize>,
    pub tail_rows: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            tail_rows: DEFAULT_TAIL_ROWS,
        }
    }
}

/// Runs the whole pipeline for one interaction and hands back an immutable render model.
///
/// Cheap to clone; clones share the fetch cache.
#[derive(Clone)]
pub struct StockAnalyzer {
    fetcher: MarketDataFetcher,
    settings: AnalysisSettings,
}

impl StockAnalyzer {
    pub fn new(fetcher: MarketDataFetcher, settings: AnalysisSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &'static str {
        self.fetcher.provider_name()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache_stats().await
    }

    /// Validate `input`, fetch the bars and build everything the dashboard shows.
    ///
    /// Nothing past the fetch runs when the series comes back empty.
    #[instrument(skip(self, input), fields(symbol = %input.symbol.trim()))]
    pub async fn analyze(&self, input: &DashboardInput, today: NaiveDate) -> RenderModel {
        let query = match Query::from_input(input, today) {
            Ok(Some(query)) => query,
            Ok(None) => return RenderModel::Idle,
            Err(e) => {
                warn!(error = %e, "Rejected dashboard input");
                return RenderModel::Rejected { message: e.to_string() };
            }
        };

        match self.fetcher.fetch(&query).await {
            Ok(series) if series.is_empty() => {
                info!(symbol = %query.symbol, start = %query.start_date, end = %query.end_date, "No data for query");
                RenderModel::NoData {
                    query,
                    message: NO_DATA_MESSAGE.to_string(),
                }
            }
            Ok(series) => RenderModel::Ready(Box::new(self.build_report(query, series))),
            Err(e) => failed(query, e),
        }
    }

    fn build_report(&self, query: Query, series: Arc<PriceSeries>) -> AnalysisReport {
        let timer = Timer::start("report build");

        let derived = compute_moving_averages(&series, &self.settings.windows);
        let statistics = summarize(&series, &derived);
        let closing_chart = closing_price_chart(&series);
        let overlay_chart = moving_average_chart(&series, &derived);
        let tail = series.tail(self.settings.tail_rows).to_vec();

        timer.log_elapsed("ANALYZER");
        info!(symbol = %query.symbol, bars = series.len(), "Report ready");

        AnalysisReport {
            query,
            message: LOADED_MESSAGE.to_string(),
            series,
            tail,
            derived,
            statistics,
            closing_chart,
            overlay_chart,
        }
    }
}

fn failed(query: Query, error: FetchError) -> RenderModel {
    warn!(symbol = %query.symbol, kind = %error.kind, detail = %error.detail, "Fetch failed");
    RenderModel::Failed {
        query,
        kind: error.kind,
        message: error.user_message(),
    }
}

fn close_line(series: &PriceSeries) -> ChartLine {
    ChartLine::new(
        "Close",
        series.bars().iter().map(|bar| (bar.date, Some(bar.close))).collect(),
    )
}

/// Closing price over time, titled with the symbol
pub fn closing_price_chart(series: &PriceSeries) -> LineChart {
    LineChart::new(
        Some(format!("{} Closing Price", series.symbol())),
        vec![close_line(series)],
        false,
    )
}

/// Closing price with one overlay per moving average, with a legend
pub fn moving_average_chart(series: &PriceSeries, derived: &DerivedSeries) -> LineChart {
    let dates = series.dates();
    let mut lines = vec![close_line(series)];
    for ma in &derived.averages {
        lines.push(ChartLine::new(
            ma.label(),
            dates.iter().copied().zip(ma.values.iter().copied()).collect(),
        ));
    }
    LineChart::new(None, lines, true)
}
