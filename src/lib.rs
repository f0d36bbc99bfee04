pub mod api;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod ranking;
pub mod scoring;
pub mod snapshot;
pub mod tickers;

pub use error::{Result, ScreenerError};
