use serde::Serialize;
use std::sync::Arc;

use super::{DerivedSeries, LineChart, PriceBar, PriceSeries, Query, SummaryStatistics};
use crate::error::FetchErrorKind;

pub const NO_DATA_MESSAGE: &str = "No data found. Please check the stock symbol or date range.";
pub const LOADED_MESSAGE: &str = "Data Loaded Successfully!";

/// Everything the presentation layer shows for one interaction.
/// Built fresh for every request and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderModel {
    /// No symbol entered, nothing to show
    Idle,
    Rejected {
        message: String,
    },
    NoData {
        query: Query,
        message: String,
    },
    Failed {
        query: Query,
        kind: FetchErrorKind,
        message: String,
    },
    Ready(Box<AnalysisReport>),
}

impl RenderModel {
    pub fn status(&self) -> &'static str {
        match self {
            RenderModel::Idle => "idle",
            RenderModel::Rejected { .. } => "rejected",
            RenderModel::NoData { .. } => "no_data",
            RenderModel::Failed { .. } => "failed",
            RenderModel::Ready(_) => "ready",
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            RenderModel::Ready(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub query: Query,
    pub message: String,
    pub series: Arc<PriceSeries>,
    pub tail: Vec<PriceBar>,
    pub derived: DerivedSeries,
    pub statistics: SummaryStatistics,
    pub closing_chart: LineChart,
    pub overlay_chart: LineChart,
}
