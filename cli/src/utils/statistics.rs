//! Describe-style summary statistics over price and derived columns.

use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::models::{ColumnSummary, DerivedSeries, PriceSeries, SummaryStatistics};

/// Summaries for Open, High, Low, Close, Volume and then every derived column.
pub fn summarize(series: &PriceSeries, derived: &DerivedSeries) -> SummaryStatistics {
    let bars = series.bars();
    let mut columns: Vec<(String, Vec<Option<f64>>)> = vec![
        ("Open".to_string(), bars.iter().map(|b| Some(b.open)).collect()),
        ("High".to_string(), bars.iter().map(|b| Some(b.high)).collect()),
        ("Low".to_string(), bars.iter().map(|b| Some(b.low)).collect()),
        ("Close".to_string(), bars.iter().map(|b| Some(b.close)).collect()),
        ("Volume".to_string(), bars.iter().map(|b| Some(b.volume as f64)).collect()),
    ];
    for ma in &derived.averages {
        columns.push((ma.column(), ma.values.clone()));
    }

    let columns = columns
        .into_par_iter()
        .map(|(name, values)| describe(name, &values))
        .collect();

    SummaryStatistics { columns }
}

/// Count, mean, sample standard deviation, min, quartiles and max of the present values.
pub fn describe(column: impl Into<String>, values: &[Option<f64>]) -> ColumnSummary {
    let mut present: Vec<f64> = values.iter().filter_map(|v| *v).filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return ColumnSummary::empty(column);
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let count = present.len();
    let std = (count > 1).then(|| present.iter().std_dev());

    ColumnSummary {
        column: column.into(),
        count,
        mean: Some(present.iter().mean()),
        std,
        min: Some(Statistics::min(present.iter())),
        p25: Some(quantile(&present, 0.25)),
        p50: Some(quantile(&present, 0.50)),
        p75: Some(quantile(&present, 0.75)),
        max: Some(Statistics::max(present.iter())),
    }
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovingAverage, PriceBar};
    use chrono::NaiveDate;

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be present");
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_describe_matches_known_values() {
        let values: Vec<Option<f64>> = [1.0, 2.0, 3.0, 4.0].iter().map(|v| Some(*v)).collect();
        let summary = describe("x", &values);

        assert_eq!(summary.count, 4);
        approx(summary.mean, 2.5);
        approx(summary.std, 1.2909944487358056);
        approx(summary.min, 1.0);
        approx(summary.p25, 1.75);
        approx(summary.p50, 2.5);
        approx(summary.p75, 3.25);
        approx(summary.max, 4.0);
    }

    #[test]
    fn test_describe_price_like_column() {
        let values: Vec<Option<f64>> = [101.5, 99.25, 104.0, 102.75, 100.0].iter().map(|v| Some(*v)).collect();
        let summary = describe("Close", &values);

        approx(summary.mean, 101.5);
        approx(summary.std, 1.9445436482630056);
        approx(summary.min, 99.25);
        approx(summary.p25, 100.0);
        approx(summary.p50, 101.5);
        approx(summary.max, 104.0);
    }

    #[test]
    fn test_describe_skips_absent_values() {
        let summary = describe("MA_3", &[None, None, Some(5.0)]);
        assert_eq!(summary.count, 1);
        approx(summary.mean, 5.0);
        assert_eq!(summary.std, None);
        approx(summary.p75, 5.0);

        let empty = describe("MA_200", &[None, None]);
        assert_eq!(empty, ColumnSummary::empty("MA_200"));
    }

    #[test]
    fn test_summarize_includes_derived_columns() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PriceBar::new(day(2), 10.0, 11.0, 9.0, 10.5, 1_000),
                PriceBar::new(day(3), 10.5, 12.0, 10.0, 11.5, 3_000),
            ],
        );
        let derived = DerivedSeries {
            averages: vec![MovingAverage { window: 100, values: vec![None, None] }],
        };

        let stats = summarize(&series, &derived);
        let names: Vec<_> = stats.columns.iter().map(|c| c.column.as_str()).collect();
        assert_eq!(names, ["Open", "High", "Low", "Close", "Volume", "MA_100"]);

        assert_eq!(stats.column("Close").unwrap().count, series.len());
        approx(stats.column("Volume").unwrap().mean, 2_000.0);
        assert_eq!(stats.column("MA_100").unwrap().count, 0);
    }
}
