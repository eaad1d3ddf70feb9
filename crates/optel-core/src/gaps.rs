//! Raw-data completeness per span.
//!
//! The gap detector runs on the original irregular timestamps, before any
//! resampler fill applies: it measures how complete the raw feed was, not
//! how complete the repaired series looks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};

use crate::error::{Result, TelemetryError};
use crate::model::{GapReport, Sample};

/// Count missing sample slots per span against the configured cadence.
///
/// Spans with fewer than two distinct valid timestamps are excluded from
/// the output entirely rather than reported as zero — a single point
/// implies no grid to be incomplete against.
pub fn detect_gaps(samples: &[Sample], cadence: Duration) -> Result<Vec<GapReport>> {
    if cadence <= Duration::zero() {
        return Err(TelemetryError::InvalidParameter {
            name: "cadence".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    let mut by_span: BTreeMap<&str, BTreeSet<NaiveDateTime>> = BTreeMap::new();
    for sample in samples {
        if let Some(ts) = sample.timestamp {
            by_span.entry(sample.span.as_str()).or_default().insert(ts);
        }
    }

    let mut reports = Vec::new();
    for (span, timestamps) in by_span {
        if timestamps.len() < 2 {
            continue;
        }
        let (Some(&min), Some(&max)) = (timestamps.iter().next(), timestamps.iter().next_back())
        else {
            continue;
        };
        let expected = ((max - min).num_seconds() / cadence.num_seconds()) as usize + 1;
        let observed = timestamps.len();
        reports.push(GapReport {
            span: span.to_string(),
            expected_count: expected,
            observed_count: observed,
            missing_count: expected as i64 - observed as i64,
        });
    }
    Ok(reports)
}
