//! Fixed-threshold alerting.
//!
//! A small rules table, independent of baselines: per canonical KPI an
//! optional absolute minimum and maximum. The core only produces the
//! evaluable facts; delivery is the alerting collaborator's concern.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::columns::KpiColumnMap;
use crate::model::{columns_present, AlertReason, AlertRecord, Sample};

/// Absolute bounds for one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KpiBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl KpiBounds {
    pub fn min(value: f64) -> Self {
        Self {
            min: Some(value),
            max: None,
        }
    }

    pub fn max(value: f64) -> Self {
        Self {
            min: None,
            max: Some(value),
        }
    }
}

/// Fixed threshold table, keyed by canonical KPI name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub bounds: BTreeMap<String, KpiBounds>,
}

impl Default for ThresholdConfig {
    /// Conservative defaults; tune per network. Baseline-relative rules
    /// (Q-factor drop, CD drift) live in the deviation detector, not here.
    fn default() -> Self {
        let mut bounds = BTreeMap::new();
        bounds.insert("osnr".to_string(), KpiBounds::min(15.0));
        bounds.insert("pre_fec_ber".to_string(), KpiBounds::max(1e-3));
        Self { bounds }
    }
}

/// Emit an alert record for every row breaching a configured bound.
///
/// KPIs whose column variants are absent from the dataset are skipped
/// silently. Rows without a valid timestamp still alert — thresholds are
/// absolute, not temporal.
pub fn evaluate_thresholds(
    samples: &[Sample],
    columns: &KpiColumnMap,
    config: &ThresholdConfig,
) -> Vec<AlertRecord> {
    let present = columns_present(samples);
    let resolved: Vec<(&str, &str, &KpiBounds)> = config
        .bounds
        .iter()
        .filter_map(|(kpi, bounds)| {
            columns
                .resolve(kpi, &present)
                .map(|col| (kpi.as_str(), col, bounds))
        })
        .collect();

    let mut alerts = Vec::new();
    for sample in samples {
        for &(kpi, col, bounds) in &resolved {
            let Some(value) = sample.value(col) else { continue };
            if let Some(min) = bounds.min {
                if value < min {
                    alerts.push(AlertRecord {
                        timestamp: sample.timestamp,
                        span: sample.span.clone(),
                        kpi: kpi.to_string(),
                        column: col.to_string(),
                        value,
                        reason: AlertReason::BelowMin,
                    });
                }
            }
            if let Some(max) = bounds.max {
                if value > max {
                    alerts.push(AlertRecord {
                        timestamp: sample.timestamp,
                        span: sample.span.clone(),
                        kpi: kpi.to_string(),
                        column: col.to_string(),
                        value,
                        reason: AlertReason::AboveMax,
                    });
                }
            }
        }
    }
    alerts
}
