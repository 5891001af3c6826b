pub mod date;
pub mod logger;
pub mod moving_average;
pub mod statistics;

pub use date::*;
pub use logger::*;
pub use moving_average::*;
pub use statistics::*;
