//! End-to-end pipeline tests: ticker file → fetch → score → snapshot →
//! filter/rank, using a scripted in-memory provider and a tempdir store.

use std::collections::HashMap;
use std::io::Write;

use chrono::{NaiveDate, Utc};
use pretty_assertions::assert_eq;

use pearl_screener::api::{FetchThrottle, QuoteProvider};
use pearl_screener::error::{Result, ScreenerError};
use pearl_screener::fetcher::MetricFetcher;
use pearl_screener::models::{FilterCriteria, QuoteRecord, ScoredRecord};
use pearl_screener::ranking;
use pearl_screener::scoring::ScoreFormula;
use pearl_screener::snapshot::SnapshotStore;
use pearl_screener::tickers::TickerSource;

/// In-memory provider with per-symbol canned fundamentals; unknown
/// symbols fail the way a real provider would.
struct FakeProvider {
    quotes: HashMap<String, (f64, f64, i64, &'static str)>,
}

impl FakeProvider {
    fn new() -> Self {
        let mut quotes = HashMap::new();
        quotes.insert("AAPL".to_string(), (6.0, 30.0, 58_000_000, "Technology"));
        quotes.insert("MSFT".to_string(), (11.0, 33.0, 24_000_000, "Technology"));
        quotes.insert("JNJ".to_string(), (9.0, 15.0, 7_000_000, "Healthcare"));
        quotes.insert("XOM".to_string(), (8.0, 10.0, 18_000_000, "Energy"));
        Self { quotes }
    }
}

#[async_trait::async_trait]
impl QuoteProvider for FakeProvider {
    async fn quote(&self, symbol: &str) -> Result<QuoteRecord> {
        let (eps, pe, volume, sector) = self
            .quotes
            .get(symbol)
            .ok_or_else(|| ScreenerError::provider(symbol, "unknown symbol"))?;
        Ok(QuoteRecord {
            symbol: symbol.to_string(),
            name: format!("{} Corp", symbol),
            sector: sector.to_string(),
            industry: "General".to_string(),
            eps: Some(*eps),
            pe: Some(*pe),
            volume: Some(*volume),
            market_cap: Some(1_000_000_000),
            dividend_yield: Some(0.01),
            fetched_at: Utc::now(),
        })
    }
}

fn write_ticker_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn refresh_then_screen_round_trip() {
    let ticker_file = write_ticker_file("Ticker\nAAPL\nMSFT\nBOGUS\nJNJ\nXOM\n");
    let tickers = TickerSource::from_csv(ticker_file.path(), None)
        .list_tickers()
        .unwrap();
    assert_eq!(tickers.len(), 5);

    // Fetch: the unknown symbol is skipped, everything else survives in order.
    let fetcher = MetricFetcher::new(FakeProvider::new(), FetchThrottle::new(0));
    let report = fetcher.fetch(&tickers).await;
    let fetched: Vec<_> = report.records.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(fetched, vec!["AAPL", "MSFT", "JNJ", "XOM"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].symbol, "BOGUS");

    // Score with the canonical formula and persist.
    let formula = ScoreFormula::EpsOverPe;
    let scored: Vec<ScoredRecord> = report
        .records
        .into_iter()
        .map(|q| formula.score_record(q))
        .collect();
    assert_eq!(scored[0].score, 20.0); // AAPL: 6/30 * 100

    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let date = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    store.write(date, &scored).unwrap();

    // Read back and screen.
    let snapshot = store.latest().unwrap();
    assert_eq!(snapshot.date, date);
    assert_eq!(snapshot.records.len(), 4);

    let criteria = FilterCriteria {
        min_eps: Some(7.0),
        max_pe: Some(20.0),
        ..Default::default()
    };
    let filtered = ranking::filter(&snapshot.records, &criteria);
    let symbols: Vec<_> = filtered.iter().map(|r| r.quote.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["JNJ", "XOM"]); // AAPL fails eps, MSFT fails pe

    let ranked = ranking::top_n(&filtered, 1);
    assert_eq!(ranked[0].quote.symbol, "XOM"); // 80.0 beats 60.0
}

#[tokio::test]
async fn scores_round_trip_to_two_decimals() {
    let fetcher = MetricFetcher::new(FakeProvider::new(), FetchThrottle::new(0));
    let report = fetcher.fetch(&["MSFT".to_string()]).await;

    let scored: Vec<ScoredRecord> = report
        .records
        .into_iter()
        .map(|q| ScoreFormula::EpsOverPe.score_record(q))
        .collect();
    // 11/33 * 100 = 33.3333… — persisted rounded.
    assert!((scored[0].score - 33.333333).abs() < 1e-4);

    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let date = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
    store.write(date, &scored).unwrap();

    let snapshot = store.read(date).unwrap();
    assert_eq!(snapshot.records[0].score, 33.33);
    assert_eq!(snapshot.records[0].quote.eps, scored[0].quote.eps);
    assert_eq!(snapshot.records[0].quote.pe, scored[0].quote.pe);
}

#[test]
fn latest_supersedes_older_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let record = ScoredRecord {
        quote: QuoteRecord {
            symbol: "AAPL".to_string(),
            name: "Apple Inc.".to_string(),
            sector: "Technology".to_string(),
            industry: "Consumer Electronics".to_string(),
            eps: Some(6.0),
            pe: Some(30.0),
            volume: None,
            market_cap: None,
            dividend_yield: None,
            fetched_at: Utc::now(),
        },
        score: 20.0,
    };

    store
        .write(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[record.clone()])
        .unwrap();
    store
        .write(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(), &[record])
        .unwrap();

    assert_eq!(
        store.latest_date().unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    );
}

#[test]
fn empty_store_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    match store.latest() {
        Err(ScreenerError::NotFound(message)) => {
            assert!(message.contains("no snapshot"));
        }
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.records.len())),
    }
}

#[tokio::test]
async fn volume_adjusted_formula_end_to_end() {
    let fetcher = MetricFetcher::new(FakeProvider::new(), FetchThrottle::new(0));
    let report = fetcher.fetch(&["JNJ".to_string(), "AAPL".to_string()]).await;

    let formula = ScoreFormula::VolumeAdjusted;
    let scored: Vec<ScoredRecord> = report
        .records
        .into_iter()
        .map(|q| formula.score_record(q))
        .collect();

    // The low-volume stock outranks the high-volume one despite similar
    // earnings quality.
    let ranked = ranking::top_n(&scored, 2);
    assert_eq!(ranked[0].quote.symbol, "JNJ");
    assert!(ranked[0].score > ranked[1].score);
}
