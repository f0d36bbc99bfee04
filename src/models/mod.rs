use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ScoreFormula;

/// One fetched fundamentals snapshot for a ticker.
///
/// Built once per ticker per fetch cycle and never mutated afterwards.
/// Numeric fields the provider could not supply stay `None`; scoring and
/// filtering decide what absence means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub eps: Option<f64>,
    pub pe: Option<f64>,
    pub volume: Option<i64>,
    pub market_cap: Option<i64>,
    /// Dividend yield as a fraction (0.0153 = 1.53%).
    pub dividend_yield: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

/// A quote plus its derived Pearl Score.
///
/// The score is kept unrounded so sort order stays stable; rounding to two
/// decimals happens only at serialization and display.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub quote: QuoteRecord,
    pub score: f64,
}

/// One dated, immutable batch of scored records.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub records: Vec<ScoredRecord>,
}

/// User-supplied screen predicate. All criteria are optional and ANDed.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub min_eps: Option<f64>,
    pub max_pe: Option<f64>,
    pub max_volume: Option<i64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

/// Configuration for the screener, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory snapshots are written to and read from.
    pub data_dir: String,
    /// Optional CSV file of tickers; the builtin list is used when absent.
    pub ticker_file: Option<String>,
    /// Symbol column in the ticker file; auto-detected when `None`.
    pub symbol_column: Option<String>,
    /// Delay between consecutive provider requests.
    pub throttle_ms: u64,
    /// Provider request timeout in seconds.
    pub request_timeout_secs: u64,
    pub formula: ScoreFormula,
}

impl Config {
    /// Load configuration from environment variables, honoring a .env file.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let formula = match std::env::var("PEARL_FORMULA") {
            Ok(name) => name
                .parse::<ScoreFormula>()
                .map_err(|e| anyhow::anyhow!("PEARL_FORMULA: {}", e))?,
            Err(_) => ScoreFormula::default(),
        };

        Ok(Config {
            data_dir: std::env::var("PEARL_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            ticker_file: std::env::var("PEARL_TICKER_FILE").ok(),
            symbol_column: std::env::var("PEARL_SYMBOL_COLUMN").ok(),
            throttle_ms: std::env::var("PEARL_THROTTLE_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            request_timeout_secs: std::env::var("PEARL_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            formula,
        })
    }
}
