//! Trailing simple moving averages over closing prices.

use crate::models::{DerivedSeries, MovingAverage, PriceSeries};

/// Windows drawn on the overlay chart
pub const DEFAULT_WINDOWS: [usize; 2] = [100, 200];

/// Compute one trailing mean per window, aligned to the series' dates.
///
/// Pure: the same series and windows always produce the same output.
pub fn compute_moving_averages(series: &PriceSeries, windows: &[usize]) -> DerivedSeries {
    let closes = series.closes();
    let averages = windows
        .iter()
        .map(|&window| MovingAverage {
            window,
            values: rolling_mean(&closes, window),
        })
        .collect();

    DerivedSeries { averages }
}

/// Entry `i` is the mean of `values[i + 1 - window..=i]`, or `None` while fewer
/// than `window` values are available. A zero window yields no values at all.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return result;
    }

    let mut sum: f64 = values[..window].iter().sum();
    result[window - 1] = Some(sum / window as f64);

    for i in window..values.len() {
        sum += values[i] - values[i - window];
        result[i] = Some(sum / window as f64);
    }

    result
}
