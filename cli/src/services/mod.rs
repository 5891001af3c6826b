pub mod cache_manager;
pub mod fetcher;
pub mod provider;
pub mod yahoo_service;

pub use cache_manager::*;
pub use fetcher::*;
pub use provider::*;
pub use yahoo_service::*;
