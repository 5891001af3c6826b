use serde::{Deserialize, Serialize};

/// Describe-style aggregate for one numeric column.
///
/// `count` is the number of present values; every other statistic is `None`
/// when it cannot be computed (no values, or a single value for `std`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn empty(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            count: 0,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            max: None,
        }
    }

    /// Row labels in display order, paired with the values
    pub fn rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.p25),
            ("50%", self.p50),
            ("75%", self.p75),
            ("max", self.max),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub columns: Vec<ColumnSummary>,
}

impl SummaryStatistics {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub const ROW_LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
}
