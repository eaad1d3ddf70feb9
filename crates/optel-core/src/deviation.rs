//! Baseline deviation rules.
//!
//! Each sample's KPI values are evaluated against three independent rules;
//! a sample can produce zero to three records, one per rule. Rules that
//! consult a baseline silently skip spans with no baseline entry — that is
//! the insufficient-history policy, not an error. The output is fully
//! deterministic for a fixed (samples, baselines, config) triple: input
//! row order, rule order q_drop → cd_drift → osnr_floor.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::columns::KpiColumnMap;
use crate::model::{columns_present, AnomalyRecord, BaselineTable, ReasonCode, Sample};

/// Thresholds for the deviation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationConfig {
    /// `q_drop` fires when Q-factor < baseline median − this margin (dB).
    pub q_drop_db: f64,
    /// `cd_drift` fires when |CD − baseline median| > this bound (ps/nm).
    pub cd_drift: f64,
    /// `osnr_floor` fires when OSNR < this absolute minimum (dB),
    /// independent of any baseline.
    pub osnr_min: f64,
}

impl Default for DeviationConfig {
    fn default() -> Self {
        Self {
            q_drop_db: 1.0,
            cd_drift: 1000.0,
            osnr_min: 15.0,
        }
    }
}

/// Evaluates samples against baselines and fixed limits.
#[derive(Debug, Clone)]
pub struct DeviationDetector {
    config: DeviationConfig,
    columns: KpiColumnMap,
}

impl DeviationDetector {
    pub fn new(config: DeviationConfig, columns: KpiColumnMap) -> Self {
        Self { config, columns }
    }

    pub fn config(&self) -> &DeviationConfig {
        &self.config
    }

    /// Evaluate every sample and collect the breaches.
    ///
    /// Matching is strictly "the sample's value in the resolved source
    /// column for this KPI"; nothing fires for a KPI whose column is not
    /// in the dataset. Samples without a valid timestamp are skipped —
    /// an anomaly record always references an instant.
    pub fn detect(&self, samples: &[Sample], baselines: &BaselineTable) -> Vec<AnomalyRecord> {
        let present = columns_present(samples);
        let q_col = self.columns.resolve("qfactor", &present);
        let cd_col = self.columns.resolve("cd", &present);
        let osnr_col = self.columns.resolve("osnr", &present);

        let mut records = Vec::new();
        for sample in samples {
            let Some(ts) = sample.timestamp else { continue };

            // Q-factor drop: needs both an observed value and a baseline.
            if let Some(col) = q_col {
                if let (Some(value), Some(base)) =
                    (sample.value(col), baselines.get(&sample.span, col))
                {
                    if value < base.median - self.config.q_drop_db {
                        records.push(AnomalyRecord {
                            timestamp: ts,
                            span: sample.span.clone(),
                            kpi: "qfactor".to_string(),
                            column: col.to_string(),
                            value,
                            baseline: Some(base.median),
                            reason: ReasonCode::QDrop,
                        });
                    }
                }
            }

            // Dispersion drift: same baseline-presence requirement.
            if let Some(col) = cd_col {
                if let (Some(value), Some(base)) =
                    (sample.value(col), baselines.get(&sample.span, col))
                {
                    if (value - base.median).abs() > self.config.cd_drift {
                        records.push(AnomalyRecord {
                            timestamp: ts,
                            span: sample.span.clone(),
                            kpi: "cd".to_string(),
                            column: col.to_string(),
                            value,
                            baseline: Some(base.median),
                            reason: ReasonCode::CdDrift,
                        });
                    }
                }
            }

            // OSNR floor: absolute limit, no baseline prerequisite; the
            // baseline median is echoed for context when one exists.
            if let Some(col) = osnr_col {
                if let Some(value) = sample.value(col) {
                    if value < self.config.osnr_min {
                        records.push(AnomalyRecord {
                            timestamp: ts,
                            span: sample.span.clone(),
                            kpi: "osnr".to_string(),
                            column: col.to_string(),
                            value,
                            baseline: baselines.get(&sample.span, col).map(|b| b.median),
                            reason: ReasonCode::OsnrFloor,
                        });
                    }
                }
            }
        }
        debug!(records = records.len(), "deviation detection complete");
        records
    }
}
