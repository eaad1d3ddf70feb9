//! Data model for the telemetry pipeline.
//!
//! Samples are constructed once per ingest batch and are immutable
//! afterward; resampling produces new samples on a canonical grid rather
//! than mutating the originals. Baselines and anomaly records are
//! recomputed fully on each run and never persisted.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One telemetry observation for a span.
///
/// `timestamp` is `None` when the source row's time field failed to parse;
/// such rows stay visible to threshold alerting but are invisible to the
/// resampler, the gap detector and the deviation detector.
///
/// `values` maps source column names to coerced readings; `None` marks a
/// vendor sentinel, a missing field or an unparseable token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub span: String,
    pub timestamp: Option<NaiveDateTime>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl Sample {
    pub fn new(span: impl Into<String>, timestamp: Option<NaiveDateTime>) -> Self {
        Self {
            span: span.into(),
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Coerced reading for a source column, flattened to a plain option.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn set_value(&mut self, column: impl Into<String>, value: Option<f64>) {
        self.values.insert(column.into(), value);
    }
}

/// Ordered `(timestamp, value)` pairs for one span and one source column.
///
/// This is the hand-off shape for the forecasting collaborator: sorted,
/// gaps already handled by the resampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSeries {
    pub span: String,
    pub column: String,
    pub points: Vec<(NaiveDateTime, Option<f64>)>,
}

impl KpiSeries {
    /// Points with a present value, in timestamp order.
    pub fn observed(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|&(ts, v)| v.map(|v| (ts, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Per-(span, column) central-tendency and dispersion statistics.
///
/// `std_dev` uses the sample (n−1) denominator and is absent for a single
/// observation rather than reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub span: String,
    pub column: String,
    pub median: f64,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub count: usize,
}

/// Keyed collection of baselines, span then column.
///
/// A (span, column) combination with zero non-missing observations has no
/// entry here; absence is the "insufficient history" signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineTable {
    entries: BTreeMap<String, BTreeMap<String, Baseline>>,
}

impl BaselineTable {
    pub fn insert(&mut self, baseline: Baseline) {
        self.entries
            .entry(baseline.span.clone())
            .or_default()
            .insert(baseline.column.clone(), baseline);
    }

    pub fn get(&self, span: &str, column: &str) -> Option<&Baseline> {
        self.entries.get(span)?.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|cols| cols.len()).sum()
    }

    /// Flat iterator over all entries, ordered by span then column.
    pub fn iter(&self) -> impl Iterator<Item = &Baseline> {
        self.entries.values().flat_map(|cols| cols.values())
    }
}

/// Why an anomaly record was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Q-factor fell more than the configured margin below its baseline median.
    QDrop,
    /// Chromatic dispersion drifted more than the configured bound from its baseline median.
    CdDrift,
    /// OSNR fell below the configured absolute floor.
    OsnrFloor,
}

/// One baseline/threshold rule breach for one sample.
///
/// `baseline` is `None` only for rules that do not consult a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub timestamp: NaiveDateTime,
    pub span: String,
    /// Canonical KPI name (e.g. `qfactor`).
    pub kpi: String,
    /// Resolved source column the value was read from.
    pub column: String,
    pub value: f64,
    pub baseline: Option<f64>,
    pub reason: ReasonCode,
}

/// Raw-data completeness report for one span, measured on the original
/// irregular timestamps before any fill policy applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    pub span: String,
    /// Grid slots implied by `[min, max]` at the configured cadence.
    pub expected_count: usize,
    /// Distinct valid original timestamps.
    pub observed_count: usize,
    /// `expected − observed`; negative for groups sampled denser than the cadence.
    pub missing_count: i64,
}

/// Direction of a fixed-threshold breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    BelowMin,
    AboveMax,
}

/// One fixed-threshold breach, independent of any baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub span: String,
    pub kpi: String,
    pub column: String,
    pub value: f64,
    pub reason: AlertReason,
}

/// Union of source columns carried by a batch of samples.
pub fn columns_present(samples: &[Sample]) -> BTreeSet<String> {
    samples
        .iter()
        .flat_map(|s| s.values.keys().cloned())
        .collect()
}

/// Extract one span's series for one column, sorted by timestamp.
///
/// Rows without a valid timestamp are skipped; duplicate timestamps
/// collapse, last value wins.
pub fn kpi_series(samples: &[Sample], span: &str, column: &str) -> KpiSeries {
    let mut by_ts: BTreeMap<NaiveDateTime, Option<f64>> = BTreeMap::new();
    for sample in samples.iter().filter(|s| s.span == span) {
        if let Some(ts) = sample.timestamp {
            by_ts.insert(ts, sample.value(column));
        }
    }
    KpiSeries {
        span: span.to_string(),
        column: column.to_string(),
        points: by_ts.into_iter().collect(),
    }
}

/// Group samples by span, preserving input order within each group.
pub fn group_by_span(samples: &[Sample]) -> BTreeMap<&str, Vec<&Sample>> {
    let mut groups: BTreeMap<&str, Vec<&Sample>> = BTreeMap::new();
    for sample in samples {
        groups.entry(sample.span.as_str()).or_default().push(sample);
    }
    groups
}
