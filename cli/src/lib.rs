//! # stock-analyzer - Stock Price Dashboard Pipeline
//!
//! Library behind the stock dashboard:
//! - Ticker and date range validation
//! - Daily bar fetching from Yahoo Finance with a shared memoization cache
//! - 100/200-day simple moving averages
//! - Describe-style summary statistics
//! - A serializable render model for HTML, JSON or terminal output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stock_analyzer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = AnalyzerBuilder::yahoo(YahooConfig::default())?.build()?;
//!     let today = today_utc();
//!     let model = analyzer.analyze(&DashboardInput::defaults(today), today).await;
//!     println!("{}", stock_analyzer::formatters::format_report(&model));
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Public API for easy library usage
pub mod api;

// Terminal output
pub mod formatters;

// Prelude for convenient imports
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use stock_analyzer::prelude::*;
    //! ```

    pub use crate::api::{AnalyzerBuilder, StockAnalyzer};
    pub use crate::error::{BuildError, FetchError, FetchErrorKind, ValidationError};
    pub use crate::models::{AnalysisReport, DashboardInput, PriceBar, PriceSeries, Query, RenderModel};
    pub use crate::services::{CacheConfig, FetchCache, InMemoryProvider, MarketDataProvider, YahooConfig, YahooProvider};
    pub use crate::utils::date::today_utc;
}

// Re-export some commonly used utilities
pub use utils::{init_logger, Logger, Timer};
