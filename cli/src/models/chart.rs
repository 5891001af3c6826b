use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One plotted line. Absent points break the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLine {
    pub label: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl ChartLine {
    pub fn new(label: impl Into<String>, points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|(_, value)| *value)
    }
}

/// Line chart over dates, independent of how it is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineChart {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<ChartLine>,
    pub show_legend: bool,
}

impl LineChart {
    pub fn new(title: Option<String>, lines: Vec<ChartLine>, show_legend: bool) -> Self {
        Self {
            title,
            x_label: "Date".to_string(),
            y_label: "Price".to_string(),
            lines,
            show_legend,
        }
    }

    /// Smallest and largest plotted value across all lines
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.lines
            .iter()
            .flat_map(|line| line.values())
            .fold(None, |bounds, v| match bounds {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// First and last date across all lines
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.lines.iter().flat_map(|line| line.points.iter().map(|(d, _)| *d));
        dates.fold(None, |bounds, d| match bounds {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }
}
