use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScreenerError};
use crate::models::{QuoteRecord, ScoredRecord, Snapshot};
use crate::scoring::round2;

const FILE_PREFIX: &str = "pearl_scores_";
const FILE_SUFFIX: &str = ".csv";

/// One CSV row of a persisted snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "EPS")]
    eps: Option<f64>,
    #[serde(rename = "PE")]
    pe: Option<f64>,
    #[serde(rename = "Pearl Score")]
    pearl_score: f64,
    #[serde(rename = "Sector")]
    sector: String,
    #[serde(rename = "Industry")]
    industry: String,
    #[serde(rename = "Volume")]
    volume: Option<i64>,
    #[serde(rename = "MarketCap")]
    market_cap: Option<i64>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<f64>,
    #[serde(rename = "FetchedAt")]
    fetched_at: DateTime<Utc>,
}

impl From<&ScoredRecord> for SnapshotRow {
    fn from(record: &ScoredRecord) -> Self {
        let q = &record.quote;
        SnapshotRow {
            ticker: q.symbol.clone(),
            name: q.name.clone(),
            eps: q.eps,
            pe: q.pe,
            pearl_score: round2(record.score),
            sector: q.sector.clone(),
            industry: q.industry.clone(),
            volume: q.volume,
            market_cap: q.market_cap,
            dividend_yield: q.dividend_yield,
            fetched_at: q.fetched_at,
        }
    }
}

impl From<SnapshotRow> for ScoredRecord {
    fn from(row: SnapshotRow) -> Self {
        ScoredRecord {
            quote: QuoteRecord {
                symbol: row.ticker,
                name: row.name,
                sector: row.sector,
                industry: row.industry,
                eps: row.eps,
                pe: row.pe,
                volume: row.volume,
                market_cap: row.market_cap,
                dividend_yield: row.dividend_yield,
                fetched_at: row.fetched_at,
            },
            score: row.pearl_score,
        }
    }
}

/// Dated CSV snapshot store under one directory.
///
/// Snapshots are written once per date and never mutated; re-running a
/// refresh for the same date overwrites the whole file (last writer wins).
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_SUFFIX))
    }

    /// Serialize a scored batch to its dated file, creating the directory
    /// if needed. Scores land rounded to two decimals.
    pub fn write(&self, date: NaiveDate, records: &[ScoredRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(date);
        write_records_csv(&path, records)?;
        info!("Wrote snapshot {} ({} records)", path.display(), records.len());
        Ok(path)
    }

    /// All snapshot dates present in the store, ascending.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            // A store that was never written to simply has no snapshots.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(date) = parse_snapshot_filename(&entry.file_name().to_string_lossy()) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    /// The greatest snapshot date on disk.
    pub fn latest_date(&self) -> Result<NaiveDate> {
        self.list_dates()?
            .into_iter()
            .max()
            .ok_or_else(|| {
                ScreenerError::NotFound(format!("no snapshot found in {}", self.dir.display()))
            })
    }

    pub fn read(&self, date: NaiveDate) -> Result<Snapshot> {
        let path = self.path_for(date);
        let mut reader = csv::Reader::from_path(&path).map_err(|e| {
            let missing = matches!(
                e.kind(),
                csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound
            );
            if missing {
                ScreenerError::NotFound(format!("no snapshot for {}", date))
            } else {
                e.into()
            }
        })?;

        let mut records = Vec::new();
        for row in reader.deserialize::<SnapshotRow>() {
            records.push(row?.into());
        }

        debug!("Read snapshot {} ({} records)", path.display(), records.len());
        Ok(Snapshot { date, records })
    }

    /// Load the snapshot with the greatest date stamp.
    pub fn latest(&self) -> Result<Snapshot> {
        let date = self.latest_date()?;
        self.read(date)
    }
}

/// Write scored records as CSV in the snapshot schema. Also used for
/// exporting filtered screen results.
pub fn write_records_csv(path: &Path, records: &[ScoredRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(SnapshotRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_snapshot_filename(name: &str) -> Option<NaiveDate> {
    let stamp = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok()
}
