//! Offline Dashboard Example
//!
//! Runs the dashboard pipeline against an in-memory provider with a
//! synthetic random-walk series, so no network access is needed.

use chrono::NaiveDate;
use stock_analyzer::formatters::format_report;
use stock_analyzer::prelude::*;
use stock_analyzer::utils::date::weekdays_between;
use std::error::Error;
use std::sync::Arc;

fn synthetic_bars(start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    let mut close = 100.0_f64;
    weekdays_between(start, end)
        .into_iter()
        .map(|day| {
            close *= 1.0 + (rand::random::<f64>() - 0.48) * 0.03;
            let open = close * (1.0 + (rand::random::<f64>() - 0.5) * 0.01);
            let high = close.max(open) * 1.01;
            let low = close.min(open) * 0.99;
            PriceBar::new(day, open, high, low, close, 20_000_000 + rand::random_range(0..10_000_000))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    stock_analyzer::init_logger("stock_analyzer=debug")?;

    let start = NaiveDate::from_ymd_opt(2015, 1, 1).ok_or("bad start date")?;
    let today = NaiveDate::from_ymd_opt(2016, 12, 31).ok_or("bad end date")?;

    let provider = Arc::new(InMemoryProvider::new().with_series("DEMO", synthetic_bars(start, today)));
    let analyzer = AnalyzerBuilder::new().with_provider(provider.clone()).build()?;

    println!("Example 1: full range");
    let model = analyzer.analyze(&DashboardInput::new("demo", start, today), today).await;
    println!("{}\n", format_report(&model));

    println!("Example 2: same interaction again is served from the cache");
    analyzer.analyze(&DashboardInput::new("DEMO", start, today), today).await;
    println!("provider calls: {}, cache: {:?}\n", provider.calls(), analyzer.cache_stats().await);

    println!("Example 3: unknown symbol");
    let model = analyzer.analyze(&DashboardInput::new("ZZZZINVALID", start, today), today).await;
    println!("{}", format_report(&model));

    Ok(())
}
