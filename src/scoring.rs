use std::fmt;
use std::str::FromStr;

use crate::models::{QuoteRecord, ScoredRecord};

/// Pearl Score formula strategy.
///
/// Both variants the screener has historically used are kept behind one
/// enum; the canonical default is `EpsOverPe`. Negative EPS or P/E values
/// are scored as-is: a negative P/E produces a negative score and sorts to
/// the bottom, which is the documented policy rather than an exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreFormula {
    /// Canonical: `(eps / pe) * 100`, or 0 when P/E is missing or zero.
    #[default]
    EpsOverPe,
    /// Volume-penalized: `(eps / (pe + 1)) * (1e8 / (volume + 1))`.
    ///
    /// Rewards strong earnings at low valuation with low trading volume
    /// (the "overlooked stock" heuristic). Missing volume counts as 0;
    /// the +1 offsets keep both denominators nonzero. Missing or zero
    /// EPS/P/E means the stock cannot be scored and yields 0.
    VolumeAdjusted,
}

impl ScoreFormula {
    /// Compute the raw (unrounded) score from fetched fundamentals.
    pub fn score(&self, eps: Option<f64>, pe: Option<f64>, volume: Option<i64>) -> f64 {
        match self {
            ScoreFormula::EpsOverPe => match (eps, pe) {
                (Some(eps), Some(pe)) if pe != 0.0 => (eps / pe) * 100.0,
                _ => 0.0,
            },
            ScoreFormula::VolumeAdjusted => match (eps, pe) {
                (Some(eps), Some(pe)) if eps != 0.0 && pe != 0.0 => {
                    let volume = volume.unwrap_or(0) as f64;
                    (eps / (pe + 1.0)) * (1e8 / (volume + 1.0))
                }
                _ => 0.0,
            },
        }
    }

    /// Attach a score to a fetched quote.
    pub fn score_record(&self, quote: QuoteRecord) -> ScoredRecord {
        let score = self.score(quote.eps, quote.pe, quote.volume);
        ScoredRecord { quote, score }
    }
}

impl FromStr for ScoreFormula {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eps-over-pe" | "eps_over_pe" | "canonical" => Ok(ScoreFormula::EpsOverPe),
            "volume-adjusted" | "volume_adjusted" => Ok(ScoreFormula::VolumeAdjusted),
            other => Err(format!(
                "unknown formula '{}' (expected eps-over-pe or volume-adjusted)",
                other
            )),
        }
    }
}

impl fmt::Display for ScoreFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreFormula::EpsOverPe => write!(f, "eps-over-pe"),
            ScoreFormula::VolumeAdjusted => write!(f, "volume-adjusted"),
        }
    }
}

/// Round to two decimals for display and serialization.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
