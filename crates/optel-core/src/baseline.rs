//! Per-span baseline statistics.
//!
//! Baselines are the reference the deviation rules compare against:
//! median, mean, sample standard deviation and observation count per
//! (span, KPI column), recomputed fully on every run from the full
//! available window. There is no incremental update and no on-disk store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{group_by_span, Baseline, BaselineTable, Sample};
use crate::stats;

/// Configuration for the baseline estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Source columns baselines are computed for.
    pub kpi_columns: Vec<String>,
    /// Whether the caller intends to feed the resampled (fill-repaired)
    /// table instead of the raw coerced one. Interpolated values bias the
    /// dispersion estimate, so the default pipeline computes over raw
    /// values; this flag documents the caller's choice and is surfaced in
    /// logs.
    pub include_filled: bool,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            kpi_columns: ["QFACTOR-AVG", "ESNR-AVG", "CDR", "PREFEC-AVG"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_filled: false,
        }
    }
}

/// Compute baselines per (span, column) over all non-missing observations.
///
/// A (span, column) combination with zero non-missing values contributes
/// no entry — absence, never a zero-filled row. A single observation
/// yields a baseline without a standard deviation.
pub fn compute_baselines(samples: &[Sample], config: &BaselineConfig) -> BaselineTable {
    let mut table = BaselineTable::default();
    for (span, group) in group_by_span(samples) {
        for column in &config.kpi_columns {
            let observed: Vec<f64> = group.iter().filter_map(|s| s.value(column)).collect();
            let (Some(median), Some(mean)) = (stats::median(&observed), stats::mean(&observed))
            else {
                continue;
            };
            table.insert(Baseline {
                span: span.to_string(),
                column: column.clone(),
                median,
                mean,
                std_dev: stats::sample_std(&observed),
                count: observed.len(),
            });
        }
    }
    debug!(
        entries = table.len(),
        include_filled = config.include_filled,
        "baselines computed"
    );
    table
}
