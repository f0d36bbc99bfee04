//! Pure filter/sort/group operations over a loaded snapshot.
//!
//! Everything here is order-preserving except where sorting is explicit,
//! and ties always break by original fetch order (stable sorts only).

use std::collections::HashMap;

use crate::models::{FilterCriteria, ScoredRecord};

/// Keep records satisfying ALL given criteria.
///
/// A record missing a numeric field fails any predicate that references
/// that field (fail-closed): a stock with no P/E never passes a max-P/E
/// screen.
pub fn filter(records: &[ScoredRecord], criteria: &FilterCriteria) -> Vec<ScoredRecord> {
    records
        .iter()
        .filter(|r| matches(r, criteria))
        .cloned()
        .collect()
}

fn matches(record: &ScoredRecord, criteria: &FilterCriteria) -> bool {
    let q = &record.quote;

    if let Some(min_eps) = criteria.min_eps {
        if !q.eps.map_or(false, |eps| eps >= min_eps) {
            return false;
        }
    }
    if let Some(max_pe) = criteria.max_pe {
        if !q.pe.map_or(false, |pe| pe <= max_pe) {
            return false;
        }
    }
    if let Some(max_volume) = criteria.max_volume {
        if !q.volume.map_or(false, |v| v <= max_volume) {
            return false;
        }
    }
    if let Some(sector) = &criteria.sector {
        if &q.sector != sector {
            return false;
        }
    }
    if let Some(industry) = &criteria.industry {
        if &q.industry != industry {
            return false;
        }
    }
    true
}

/// Descending stable sort by score, truncated to `n`.
pub fn top_n(records: &[ScoredRecord], n: usize) -> Vec<ScoredRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.score.total_cmp(&a.score));
    sorted.truncate(n);
    sorted
}

/// Mean score per distinct group value. Groups nobody belongs to are
/// simply absent.
pub fn group_average<F>(records: &[ScoredRecord], key: F) -> HashMap<String, f64>
where
    F: Fn(&ScoredRecord) -> &str,
{
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for record in records {
        let entry = sums.entry(key(record).to_string()).or_insert((0.0, 0));
        entry.0 += record.score;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(group, (sum, count))| (group, sum / count as f64))
        .collect()
}

/// The `k` highest-scoring records within each group, concatenated in
/// first-seen group order.
pub fn top_k_per_group<F>(records: &[ScoredRecord], k: usize, key: F) -> Vec<ScoredRecord>
where
    F: Fn(&ScoredRecord) -> &str,
{
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ScoredRecord>> = HashMap::new();

    for record in records {
        let group = key(record).to_string();
        if !groups.contains_key(&group) {
            group_order.push(group.clone());
        }
        groups.entry(group).or_default().push(record.clone());
    }

    let mut result = Vec::new();
    for group in group_order {
        if let Some(members) = groups.remove(&group) {
            result.extend(top_n(&members, k));
        }
    }
    result
}

/// Records whose score strictly exceeds the given quantile of the full
/// score distribution. The 0.95 cut is the "hidden gem" view.
pub fn outliers(records: &[ScoredRecord], quantile: f64) -> Vec<ScoredRecord> {
    let Some(cutoff) = score_quantile(records, quantile) else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| r.score > cutoff)
        .cloned()
        .collect()
}

/// Linearly interpolated quantile of the score distribution, or `None`
/// for an empty dataset.
pub fn score_quantile(records: &[ScoredRecord], quantile: f64) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let mut scores: Vec<f64> = records.iter().map(|r| r.score).collect();
    scores.sort_by(f64::total_cmp);

    let q = quantile.clamp(0.0, 1.0);
    let pos = q * (scores.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(scores[lo]);
    }
    let weight = pos - lo as f64;
    Some(scores[lo] + (scores[hi] - scores[lo]) * weight)
}
