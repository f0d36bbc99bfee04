use tracing::{info, warn};

use crate::api::{FetchThrottle, QuoteProvider};
use crate::models::QuoteRecord;

/// A ticker the fetch cycle gave up on, with the reason it was skipped.
#[derive(Debug, Clone)]
pub struct SkippedTicker {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of one fetch cycle: the records that succeeded, in input order,
/// plus every ticker that was skipped and why.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub records: Vec<QuoteRecord>,
    pub skipped: Vec<SkippedTicker>,
}

impl FetchReport {
    pub fn fetched_count(&self) -> usize {
        self.records.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Explicit cache of one fetch cycle, keyed by the exact ticker list.
///
/// A lookup with a different ticker list misses, and storing a new cycle
/// replaces the old one. This replaces any notion of an implicit
/// process-lifetime cache: invalidation is the caller's call.
#[derive(Debug, Default)]
pub struct QuoteCache {
    entry: Option<(Vec<String>, FetchReport)>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tickers: &[String]) -> Option<&FetchReport> {
        match &self.entry {
            Some((key, report)) if key == tickers => Some(report),
            _ => None,
        }
    }

    pub fn store(&mut self, tickers: &[String], report: FetchReport) {
        self.entry = Some((tickers.to_vec(), report));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Sequential per-ticker metric fetcher.
///
/// Strictly one request at a time with a fixed delay between requests.
/// One bad symbol never fails the batch: provider errors are logged,
/// recorded in the report, and the loop moves on.
pub struct MetricFetcher<P: QuoteProvider> {
    provider: P,
    throttle: FetchThrottle,
}

impl<P: QuoteProvider> MetricFetcher<P> {
    pub fn new(provider: P, throttle: FetchThrottle) -> Self {
        Self { provider, throttle }
    }

    pub async fn fetch(&self, tickers: &[String]) -> FetchReport {
        let mut report = FetchReport::default();

        for (i, symbol) in tickers.iter().enumerate() {
            if i > 0 {
                self.throttle.wait().await;
            }

            match self.provider.quote(symbol).await {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    report.skipped.push(SkippedTicker {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Fetch cycle complete: {} fetched, {} skipped",
            report.fetched_count(),
            report.skipped_count()
        );
        report
    }

    /// Fetch through an explicit cache keyed by the ticker list.
    pub async fn fetch_cached(&self, tickers: &[String], cache: &mut QuoteCache) -> FetchReport {
        if let Some(report) = cache.get(tickers) {
            info!("Using cached fetch cycle ({} records)", report.fetched_count());
            return report.clone();
        }

        let report = self.fetch(tickers).await;
        cache.store(tickers, report.clone());
        report
    }
}
