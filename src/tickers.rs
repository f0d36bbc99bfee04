use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, ScreenerError};

/// Column names tried, in order, when no symbol column is configured.
const DEFAULT_SYMBOL_COLUMNS: &[&str] = &["Ticker", "Symbol"];

/// Static top-50 S&P 500 watchlist used when no ticker file is configured.
const BUILTIN_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "BRK.B", "UNH", "JNJ",
    "V", "PG", "JPM", "MA", "HD", "XOM", "LLY", "MRK", "ABBV", "PEP",
    "KO", "AVGO", "ADBE", "COST", "MCD", "WMT", "CRM", "BAC", "TMO", "ACN",
    "CVX", "NFLX", "TXN", "ABT", "INTC", "LIN", "AMD", "NEE", "NKE", "DHR",
    "QCOM", "HON", "UNP", "PM", "AMGN", "LOW", "UPS", "MS", "ORCL", "SBUX",
];

/// Where the refresh run gets its ticker list from.
#[derive(Debug, Clone)]
pub enum TickerSource {
    Builtin,
    CsvFile {
        path: PathBuf,
        /// Explicit symbol column; auto-detected when `None`.
        column: Option<String>,
    },
}

impl TickerSource {
    pub fn builtin() -> Self {
        TickerSource::Builtin
    }

    pub fn from_csv(path: impl AsRef<Path>, column: Option<String>) -> Self {
        TickerSource::CsvFile {
            path: path.as_ref().to_path_buf(),
            column,
        }
    }

    /// Resolve the ordered, deduplicated ticker list.
    ///
    /// Blank cells are skipped. A missing file or a file without a usable
    /// symbol column is a `Configuration` error: the refresh must surface
    /// it rather than quietly run over an empty list.
    pub fn list_tickers(&self) -> Result<Vec<String>> {
        match self {
            TickerSource::Builtin => {
                debug!("Using builtin ticker list ({} symbols)", BUILTIN_TICKERS.len());
                Ok(BUILTIN_TICKERS.iter().map(|s| s.to_string()).collect())
            }
            TickerSource::CsvFile { path, column } => read_ticker_csv(path, column.as_deref()),
        }
    }
}

fn read_ticker_csv(path: &Path, column: Option<&str>) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ScreenerError::Configuration(format!("cannot read ticker file {}: {}", path.display(), e))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| {
            ScreenerError::Configuration(format!(
                "ticker file {} has no header row: {}",
                path.display(),
                e
            ))
        })?
        .clone();

    let symbol_index = match column {
        Some(name) => headers.iter().position(|h| h == name),
        None => DEFAULT_SYMBOL_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h == *name)),
    }
    .ok_or_else(|| {
        ScreenerError::Configuration(format!(
            "ticker file {} has no symbol column (looked for {})",
            path.display(),
            column.map(|c| c.to_string()).unwrap_or_else(|| DEFAULT_SYMBOL_COLUMNS.join(" or "))
        ))
    })?;

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            ScreenerError::Configuration(format!("bad row in {}: {}", path.display(), e))
        })?;
        let symbol = record.get(symbol_index).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        if seen.insert(symbol.to_string()) {
            tickers.push(symbol.to_string());
        }
    }

    info!("Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}
