//! High-level API for easy library usage
//!
//! [`AnalyzerBuilder`] wires a provider and cache together; [`StockAnalyzer`]
//! turns one dashboard input into a render model.

pub mod analyzer;
pub mod builder;

pub use analyzer::{closing_price_chart, moving_average_chart, AnalysisSettings, StockAnalyzer, DEFAULT_TAIL_ROWS};
pub use builder::AnalyzerBuilder;
