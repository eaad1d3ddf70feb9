//! Dataset summaries: present KPIs, time range, per-span statistics and
//! the per-run summary artifact.

use serde::{Deserialize, Serialize};

use crate::columns::KpiColumnMap;
use crate::model::{columns_present, group_by_span, GapReport, Sample};
use crate::stats;

/// Observed time range over all valid timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// ISO-8601, `None` when no row carried a valid timestamp.
    pub start: Option<String>,
    pub end: Option<String>,
    pub count: usize,
}

/// Summary statistics for one (span, column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanSummary {
    pub span: String,
    pub column: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: Option<f64>,
    pub count: usize,
}

/// The JSON artifact written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub time_range: TimeRange,
    /// Canonical KPIs detected in the dataset.
    pub kpis: Vec<String>,
    pub gap_reports: Vec<GapReport>,
    pub alert_count: usize,
    pub anomaly_count: usize,
}

/// Canonical KPIs for which at least one column variant is present.
pub fn infer_kpis_present(samples: &[Sample], columns: &KpiColumnMap) -> Vec<String> {
    let present = columns_present(samples);
    columns
        .kpis()
        .filter(|kpi| columns.resolve(kpi, &present).is_some())
        .map(str::to_string)
        .collect()
}

/// Min/max/count over all valid timestamps in the batch.
pub fn compute_time_range(samples: &[Sample]) -> TimeRange {
    let mut timestamps: Vec<_> = samples.iter().filter_map(|s| s.timestamp).collect();
    timestamps.sort();
    TimeRange {
        start: timestamps.first().map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
        end: timestamps.last().map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
        count: timestamps.len(),
    }
}

/// Per-(span, resolved column) summary statistics over non-missing values.
///
/// Combinations with zero observations are omitted, not zero-filled.
pub fn summarize_by_span(samples: &[Sample], columns: &KpiColumnMap) -> Vec<SpanSummary> {
    let present = columns_present(samples);
    let resolved: Vec<&str> = columns
        .kpis()
        .filter_map(|kpi| columns.resolve(kpi, &present))
        .collect();

    let mut summaries = Vec::new();
    for (span, group) in group_by_span(samples) {
        for &column in &resolved {
            let observed: Vec<f64> = group.iter().filter_map(|s| s.value(column)).collect();
            let Some(mean) = stats::mean(&observed) else { continue };
            let min = observed.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            summaries.push(SpanSummary {
                span: span.to_string(),
                column: column.to_string(),
                mean,
                min,
                max,
                std_dev: stats::sample_std(&observed),
                count: observed.len(),
            });
        }
    }
    summaries
}
