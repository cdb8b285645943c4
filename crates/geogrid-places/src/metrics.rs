use geogrid_core::GridMetrics;

use crate::scan::NOT_FOUND_RANK;

/// Summary metrics over a rank matrix.
///
/// - `agr`: mean rank over every cell with data; unranked cells count as 21.
/// - `atgr`: mean rank over cells ranked 1 to 20 only.
/// - `solv`: share of cells with data ranked 1 to 3, as a percentage.
///
/// Cells with rank `0` (no data) are ignored by all three. An empty or
/// all-zero matrix yields zeros.
#[must_use]
pub fn compute_metrics(ranks: &[Vec<i32>]) -> GridMetrics {
    let with_data: Vec<i32> = ranks
        .iter()
        .flatten()
        .copied()
        .filter(|&r| r > 0)
        .map(|r| r.min(NOT_FOUND_RANK))
        .collect();
    if with_data.is_empty() {
        return GridMetrics::default();
    }

    let top20: Vec<i32> = with_data
        .iter()
        .copied()
        .filter(|&r| r < NOT_FOUND_RANK)
        .collect();
    let top3 = with_data.iter().filter(|&&r| r <= 3).count();

    #[allow(clippy::cast_precision_loss)]
    let solv = top3 as f64 / with_data.len() as f64 * 100.0;

    GridMetrics {
        agr: mean(&with_data),
        atgr: mean(&top20),
        solv,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[i32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64
}
