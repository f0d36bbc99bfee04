use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pearl_screener::api::{FetchThrottle, YahooClient};
use pearl_screener::fetcher::MetricFetcher;
use pearl_screener::models::{Config, FilterCriteria, ScoredRecord, Snapshot};
use pearl_screener::ranking;
use pearl_screener::scoring::{round2, ScoreFormula};
use pearl_screener::snapshot::{write_records_csv, SnapshotStore};
use pearl_screener::tickers::TickerSource;
use pearl_screener::ScreenerError;

/// Quantile cut for the hidden-gem view.
const GEM_QUANTILE: f64 = 0.95;

#[derive(Parser)]
#[command(name = "pearl-screener", version, about = "Pearl Score stock screener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fundamentals, score them, and write today's snapshot
    Refresh {
        /// CSV file of tickers (builtin S&P watchlist when omitted)
        #[arg(long)]
        tickers: Option<PathBuf>,
        /// Symbol column name in the ticker file (auto-detected when omitted)
        #[arg(long)]
        column: Option<String>,
        /// Score formula: eps-over-pe (default) or volume-adjusted
        #[arg(long)]
        formula: Option<String>,
        /// Delay between provider requests, in milliseconds
        #[arg(long)]
        throttle_ms: Option<u64>,
    },
    /// Filter and rank the latest snapshot
    Screen {
        #[arg(long)]
        min_eps: Option<f64>,
        #[arg(long)]
        max_pe: Option<f64>,
        #[arg(long)]
        max_volume: Option<i64>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        /// Show the top N matches (default 50)
        #[arg(long, default_value_t = 50)]
        top: usize,
        /// Show average Pearl Score per sector
        #[arg(long)]
        by_sector: bool,
        /// Show hidden gems (scores above the 95th percentile)
        #[arg(long)]
        gems: bool,
        /// Screen a specific snapshot date instead of the latest
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Export the filtered ranking as CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pearl_screener=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Refresh {
            tickers,
            column,
            formula,
            throttle_ms,
        } => run_refresh(config, tickers, column, formula, throttle_ms).await,
        Commands::Screen {
            min_eps,
            max_pe,
            max_volume,
            sector,
            industry,
            top,
            by_sector,
            gems,
            date,
            export,
        } => {
            let criteria = FilterCriteria {
                min_eps,
                max_pe,
                max_volume,
                sector,
                industry,
            };
            run_screen(config, criteria, top, by_sector, gems, date, export)
        }
    }
}

async fn run_refresh(
    mut config: Config,
    tickers: Option<PathBuf>,
    column: Option<String>,
    formula: Option<String>,
    throttle_ms: Option<u64>,
) -> Result<()> {
    if let Some(ms) = throttle_ms {
        config.throttle_ms = ms;
    }
    if let Some(name) = formula {
        config.formula = name
            .parse::<ScoreFormula>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    let source = match tickers.or_else(|| config.ticker_file.clone().map(PathBuf::from)) {
        Some(path) => TickerSource::from_csv(path, column.or_else(|| config.symbol_column.clone())),
        None => TickerSource::builtin(),
    };
    let tickers = source.list_tickers().context("ticker source")?;

    info!(
        "Refreshing {} tickers (formula: {}, throttle: {}ms)",
        tickers.len(),
        config.formula,
        config.throttle_ms
    );

    let client = YahooClient::new(&config)?;
    let fetcher = MetricFetcher::new(client, FetchThrottle::new(config.throttle_ms));
    let report = fetcher.fetch(&tickers).await;

    let scored: Vec<ScoredRecord> = report
        .records
        .into_iter()
        .map(|quote| config.formula.score_record(quote))
        .collect();

    let store = SnapshotStore::new(&config.data_dir);
    let today = Utc::now().date_naive();
    let path = store.write(today, &scored).context("writing snapshot")?;

    println!(
        "✅ Snapshot {} written: {} scored, {} skipped",
        path.display(),
        scored.len(),
        report.skipped.len()
    );
    for skipped in &report.skipped {
        println!("   ⚠️  {}: {}", skipped.symbol, skipped.reason);
    }

    Ok(())
}

fn run_screen(
    config: Config,
    criteria: FilterCriteria,
    top: usize,
    by_sector: bool,
    gems: bool,
    date: Option<NaiveDate>,
    export: Option<PathBuf>,
) -> Result<()> {
    let store = SnapshotStore::new(&config.data_dir);
    let snapshot = match load_snapshot(&store, date) {
        Ok(snapshot) => snapshot,
        Err(ScreenerError::NotFound(_)) => {
            println!("No snapshot yet — run `pearl-screener refresh` first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("📊 Snapshot {} ({} records)", snapshot.date, snapshot.records.len());

    let filtered = ranking::filter(&snapshot.records, &criteria);
    if filtered.is_empty() {
        println!("No stocks matched the filter criteria.");
        return Ok(());
    }

    let ranked = ranking::top_n(&filtered, top);
    println!("\nTop {} by Pearl Score:", ranked.len());
    for (i, record) in ranked.iter().enumerate() {
        print_record(i + 1, record);
    }

    if by_sector {
        let mut averages: Vec<(String, f64)> =
            ranking::group_average(&filtered, |r| &r.quote.sector)
                .into_iter()
                .collect();
        averages.sort_by(|a, b| b.1.total_cmp(&a.1));

        println!("\nAverage Pearl Score by sector:");
        for (sector, average) in averages {
            println!("  {:<24} {:>8.2}", sector, average);
        }
    }

    if gems {
        let gems = ranking::outliers(&snapshot.records, GEM_QUANTILE);
        println!("\n💎 Hidden gems (above the {:.0}th percentile):", GEM_QUANTILE * 100.0);
        if gems.is_empty() {
            println!("  none in this snapshot");
        }
        for (i, record) in gems.iter().enumerate() {
            print_record(i + 1, record);
        }
    }

    if let Some(path) = export {
        write_records_csv(&path, &ranked).context("exporting filtered CSV")?;
        println!("\n📥 Exported {} records to {}", ranked.len(), path.display());
    }

    Ok(())
}

fn load_snapshot(store: &SnapshotStore, date: Option<NaiveDate>) -> pearl_screener::Result<Snapshot> {
    match date {
        Some(date) => store.read(date),
        None => store.latest(),
    }
}

fn print_record(rank: usize, record: &ScoredRecord) {
    let q = &record.quote;
    println!(
        "{:>3}. {:<6} {:<28} score {:>8.2}  EPS {:>7}  P/E {:>7}  {}",
        rank,
        q.symbol,
        truncate(&q.name, 28),
        round2(record.score),
        fmt_opt(q.eps),
        fmt_opt(q.pe),
        q.sector,
    );
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate("Apple Inc.", 28), "Apple Inc.");
    }

    #[test]
    fn truncate_shortens_long_names() {
        let long = "International Business Machines Corporation";
        let out = truncate(long, 28);
        assert_eq!(out.chars().count(), 28);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn fmt_opt_handles_missing() {
        assert_eq!(fmt_opt(Some(1.234)), "1.23");
        assert_eq!(fmt_opt(None), "n/a");
    }
}
