use std::time::Duration;

use crate::error::Result;
use crate::models::QuoteRecord;

pub mod yahoo_client;
pub use yahoo_client::YahooClient;

/// Fixed inter-request delay used as simple backpressure against provider
/// rate limits. A zero delay disables throttling (useful in tests).
pub struct FetchThrottle {
    delay_ms: u64,
}

impl FetchThrottle {
    pub fn new(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    pub async fn wait(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}

/// External quote provider boundary.
///
/// Implementations may fail per symbol (unknown ticker, network fault);
/// the fetcher treats every error as recoverable for that symbol only.
#[async_trait::async_trait]
pub trait QuoteProvider {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn throttle_sleeps_for_configured_delay() {
        let throttle = FetchThrottle::new(50);
        let start = std::time::Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn zero_throttle_returns_immediately() {
        let throttle = FetchThrottle::new(0);
        let start = std::time::Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
