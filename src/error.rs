use thiserror::Error;

/// Error taxonomy for the screener pipeline.
///
/// `Provider` errors are recoverable per ticker (the fetcher logs them and
/// keeps going); the other variants abort whichever run raised them.
#[derive(Debug, Error)]
pub enum ScreenerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScreenerError {
    pub fn provider(symbol: impl Into<String>, message: impl ToString) -> Self {
        ScreenerError::Provider {
            symbol: symbol.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScreenerError>;
