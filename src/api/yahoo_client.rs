use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::QuoteProvider;
use crate::error::{Result, ScreenerError};
use crate::models::{Config, QuoteRecord};

const QUOTE_SUMMARY_BASE: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const MODULES: &str = "price,summaryDetail,defaultKeyStatistics,assetProfile";

/// Yahoo Finance quote-summary client.
///
/// One request per symbol; all field extraction is defensive since Yahoo
/// omits modules and fields freely depending on the instrument.
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent("pearl-screener/1.0")
            .build()
            .map_err(|e| ScreenerError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn quote_summary(&self, symbol: &str) -> Result<Value> {
        let url = Url::parse_with_params(
            &format!("{}/{}", QUOTE_SUMMARY_BASE, symbol),
            &[("modules", MODULES)],
        )
        .map_err(|e| ScreenerError::provider(symbol, e))?;

        debug!("Requesting quote summary: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScreenerError::provider(symbol, e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ScreenerError::provider(
                symbol,
                format!("quote request failed with status {}", status),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScreenerError::provider(symbol, e))?;

        if let Some(error) = body
            .pointer("/quoteSummary/error")
            .filter(|e| !e.is_null())
        {
            return Err(ScreenerError::provider(symbol, error));
        }

        body.pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| ScreenerError::provider(symbol, "empty quote summary result"))
    }
}

#[async_trait::async_trait]
impl QuoteProvider for YahooClient {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord> {
        let summary = self.quote_summary(symbol).await?;
        Ok(parse_quote_record(symbol, &summary))
    }
}

/// Map a quote-summary result object onto a `QuoteRecord`.
///
/// Trailing figures are preferred, forward figures are the fallback, and
/// anything still missing stays `None` for downstream policy to handle.
fn parse_quote_record(symbol: &str, summary: &Value) -> QuoteRecord {
    let eps = raw_f64(summary, "defaultKeyStatistics", "trailingEps")
        .or_else(|| raw_f64(summary, "defaultKeyStatistics", "forwardEps"));
    let pe = raw_f64(summary, "summaryDetail", "trailingPE")
        .or_else(|| raw_f64(summary, "summaryDetail", "forwardPE"));
    let volume = raw_i64(summary, "summaryDetail", "averageVolume");
    let market_cap = raw_i64(summary, "price", "marketCap");
    let dividend_yield = raw_f64(summary, "summaryDetail", "dividendYield");

    let name = str_field(summary, "price", "longName")
        .or_else(|| str_field(summary, "price", "shortName"))
        .unwrap_or_else(|| symbol.to_string());
    let sector = str_field(summary, "assetProfile", "sector").unwrap_or_else(|| "Unknown".to_string());
    let industry =
        str_field(summary, "assetProfile", "industry").unwrap_or_else(|| "Unknown".to_string());

    QuoteRecord {
        symbol: symbol.to_string(),
        name,
        sector,
        industry,
        eps,
        pe,
        volume,
        market_cap,
        dividend_yield,
        fetched_at: Utc::now(),
    }
}

// Yahoo wraps numbers as {"raw": 1.23, "fmt": "1.23"}; bare numbers show
// up occasionally too, so both shapes are accepted.
fn raw_value<'a>(summary: &'a Value, module: &str, field: &str) -> Option<&'a Value> {
    let value = summary.get(module)?.get(field)?;
    match value.get("raw") {
        Some(raw) => Some(raw),
        None => Some(value),
    }
}

fn raw_f64(summary: &Value, module: &str, field: &str) -> Option<f64> {
    raw_value(summary, module, field).and_then(|v| v.as_f64())
}

fn raw_i64(summary: &Value, module: &str, field: &str) -> Option<i64> {
    raw_value(summary, module, field).and_then(|v| v.as_i64())
}

fn str_field(summary: &Value, module: &str, field: &str) -> Option<String> {
    summary
        .get(module)?
        .get(field)?
        .as_str()
        .map(|s| s.to_string())
}
