use serde::{Deserialize, Serialize};

/// Trailing simple moving average aligned one-to-one with a price series.
/// `values[i]` is `None` until `window` closes are available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverage {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl MovingAverage {
    /// Legend label, e.g. "MA 100"
    pub fn label(&self) -> String {
        format!("MA {}", self.window)
    }

    /// Column name used in tables, e.g. "MA_100"
    pub fn column(&self) -> String {
        format!("MA_{}", self.window)
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Every moving average computed for one series, in window order as requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedSeries {
    pub averages: Vec<MovingAverage>,
}

impl DerivedSeries {
    pub fn get(&self, window: usize) -> Option<&MovingAverage> {
        self.averages.iter().find(|ma| ma.window == window)
    }
}
