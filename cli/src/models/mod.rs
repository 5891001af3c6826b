pub mod chart;
pub mod derived;
pub mod query;
pub mod report;
pub mod statistics;
pub mod stock_data;

pub use chart::*;
pub use derived::*;
pub use query::*;
pub use report::*;
pub use statistics::*;
pub use stock_data::*;
