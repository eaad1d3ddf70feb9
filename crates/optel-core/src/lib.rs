//! # optel-core
//!
//! Cleaning, resampling and baseline-anomaly engines for periodic
//! optical-network telemetry (OSNR, pre-FEC BER, Q-factor, chromatic
//! dispersion).
//!
//! The pipeline is batch-oriented and group-local: samples are grouped by
//! span, each span's series is regularized onto a fixed cadence, per-span
//! baselines are computed over the raw coerced values, and live samples are
//! evaluated against those baselines and fixed thresholds.
//!
//! ## Example
//!
//! ```rust
//! use optel_core::prelude::*;
//! use chrono::NaiveDate;
//!
//! let t0 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let mut sample = Sample::new("S1", Some(t0));
//! sample.set_value("QFACTOR-AVG", Some(8.5));
//!
//! let baselines = compute_baselines(&[sample.clone()], &BaselineConfig::default());
//! let detector = DeviationDetector::new(DeviationConfig::default(), KpiColumnMap::default());
//! let records = detector.detect(&[sample], &baselines);
//! // A single observation is its own median, so nothing deviates.
//! assert!(records.is_empty());
//! ```

pub mod alerts;
pub mod baseline;
pub mod coerce;
pub mod columns;
pub mod deviation;
pub mod gaps;
pub mod model;
pub mod resample;
pub mod stats;
pub mod summary;
mod error;

pub use error::{Result, TelemetryError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::alerts::{evaluate_thresholds, KpiBounds, ThresholdConfig};
    pub use crate::baseline::{compute_baselines, BaselineConfig};
    pub use crate::coerce::{coerce_value, CoercionConfig};
    pub use crate::columns::KpiColumnMap;
    pub use crate::deviation::{DeviationConfig, DeviationDetector};
    pub use crate::error::{Result, TelemetryError};
    pub use crate::gaps::detect_gaps;
    pub use crate::model::{
        columns_present, kpi_series, AlertReason, AlertRecord, AnomalyRecord, Baseline,
        BaselineTable, GapReport, KpiSeries, ReasonCode, Sample,
    };
    pub use crate::resample::{resample, ResampleConfig};
    pub use crate::summary::{
        compute_time_range, infer_kpis_present, summarize_by_span, RunSummary, SpanSummary,
        TimeRange,
    };
}
