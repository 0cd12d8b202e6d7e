//! Doughnut top-N: keep the largest contributors, bucket the rest as "Others".

use serde::Serialize;

use crate::domain::{DoughnutDataEntry, Rgb, palette_color};

pub const OTHERS_LABEL: &str = "Others";

/// Sort descending by `commits`, keep the first `n`, and sum the remainder
/// into a single `"Others"` entry (appended only if that sum is positive).
///
/// The sort is stable: entries with equal counts keep their input order, so
/// ties at the cut-off are decided by CSV order.
pub fn top_n_with_others(entries: &[DoughnutDataEntry], n: usize) -> Vec<DoughnutDataEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.commits.partial_cmp(&a.commits).unwrap_or(std::cmp::Ordering::Equal));

    let rest = sorted.split_off(n.min(sorted.len()));
    let others: f64 = rest.iter().map(|e| e.commits).sum();
    if others > 0.0 {
        sorted.push(DoughnutDataEntry::new(OTHERS_LABEL, others));
    }
    sorted
}

/// One rendered doughnut slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoughnutSlice {
    pub author: String,
    pub commits: f64,
    /// Share of the total, in percent.
    pub share: f64,
    pub background_color: String,
    #[serde(skip)]
    pub color: Rgb,
}

/// Each entry's share of the total, in percent. All zeros if the total is zero.
pub fn share_percentages(entries: &[DoughnutDataEntry]) -> Vec<f64> {
    let total: f64 = entries.iter().map(|e| e.commits).sum();
    entries
        .iter()
        .map(|e| if total > 0.0 { e.commits / total * 100.0 } else { 0.0 })
        .collect()
}

/// Top-N reduction plus per-slice share and colour.
pub fn doughnut_slices(entries: &[DoughnutDataEntry], n: usize) -> Vec<DoughnutSlice> {
    let reduced = top_n_with_others(entries, n);
    let shares = share_percentages(&reduced);

    reduced
        .into_iter()
        .zip(shares)
        .enumerate()
        .map(|(idx, (e, share))| {
            let color = palette_color(idx);
            DoughnutSlice {
                author: e.author,
                commits: e.commits,
                share,
                background_color: color.hex(),
                color,
            }
        })
        .collect()
}
