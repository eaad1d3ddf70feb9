//! Temporal resampling onto a fixed-cadence grid.
//!
//! Each span's irregular series is reindexed onto a regular grid spanning
//! its own observed `[min, max]` window, then small gaps are repaired:
//! short runs by carrying a neighboring known value, slightly longer runs
//! by linear interpolation between the bracketing known values. Nothing is
//! ever extrapolated past a span's observed window, and long gaps stay
//! missing so downstream statistics see them as such.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, TelemetryError};
use crate::model::Sample;

/// Configuration for the temporal resampler.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig {
    /// Fixed sampling interval of the regularized grid.
    pub cadence: Duration,
    /// Longest run of missing slots repaired by carrying a neighbor value.
    pub carry_limit: usize,
    /// Longest run repaired by linear interpolation; longer runs stay missing.
    pub interpolate_limit: usize,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::minutes(15),
            carry_limit: 2,
            interpolate_limit: 4,
        }
    }
}

impl ResampleConfig {
    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.cadence <= Duration::zero() {
            return Err(TelemetryError::InvalidParameter {
                name: "cadence".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Resample all spans onto the configured cadence.
///
/// Rows with no valid timestamp are dropped. A span with no valid
/// timestamps produces no output rows at all; a span with a single
/// distinct timestamp produces a degenerate single-point grid. Duplicate
/// timestamps within a span collapse, last value wins.
///
/// The output is a fresh batch of samples in span order, grid order within
/// each span; the input batch is left untouched.
pub fn resample(samples: &[Sample], config: &ResampleConfig) -> Result<Vec<Sample>> {
    config.validate()?;

    // Span -> timestamp -> sample values, sorted and deduplicated.
    let mut groups: BTreeMap<&str, BTreeMap<NaiveDateTime, &Sample>> = BTreeMap::new();
    for sample in samples {
        if let Some(ts) = sample.timestamp {
            groups
                .entry(sample.span.as_str())
                .or_default()
                .insert(ts, sample);
        }
    }

    let mut out = Vec::new();
    for (span, by_ts) in groups {
        let columns: BTreeSet<&str> = by_ts
            .values()
            .flat_map(|s| s.values.keys().map(String::as_str))
            .collect();
        let grid = build_grid(&by_ts, config.cadence);
        debug!(
            span,
            observed = by_ts.len(),
            slots = grid.len(),
            "resampling span"
        );

        let mut grid_samples: Vec<Sample> = grid
            .iter()
            .map(|&ts| Sample::new(span, Some(ts)))
            .collect();

        for column in columns {
            let mut series: Vec<Option<f64>> = grid
                .iter()
                .map(|ts| by_ts.get(ts).and_then(|s| s.value(column)))
                .collect();
            fill_gaps(&mut series, config.carry_limit, config.interpolate_limit);
            for (sample, value) in grid_samples.iter_mut().zip(series) {
                sample.set_value(column, value);
            }
        }
        out.extend(grid_samples);
    }
    Ok(out)
}

/// Regular grid from the group's min to max observed timestamp, stepping
/// the cadence. The max is included only when it lands on the grid.
fn build_grid(by_ts: &BTreeMap<NaiveDateTime, &Sample>, cadence: Duration) -> Vec<NaiveDateTime> {
    let (Some(&min), Some(&max)) = (by_ts.keys().next(), by_ts.keys().next_back()) else {
        return Vec::new();
    };
    let mut grid = Vec::new();
    let mut t = min;
    while t <= max {
        grid.push(t);
        t += cadence;
    }
    grid
}

/// Repair runs of missing slots in place.
///
/// A run bracketed by known values: carried from the preceding value when
/// it is no longer than `carry_limit`, linearly interpolated when no longer
/// than `interpolate_limit`, otherwise left missing. Leading runs carry the
/// following value and trailing runs the preceding one, both only within
/// `carry_limit` — interpolation never runs off the observed window.
fn fill_gaps(series: &mut [Option<f64>], carry_limit: usize, interpolate_limit: usize) {
    let n = series.len();
    let mut i = 0;
    while i < n {
        if series[i].is_some() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end < n && series[end].is_none() {
            end += 1;
        }
        let run = end - start;
        let prev = if start > 0 { series[start - 1] } else { None };
        let next = if end < n { series[end] } else { None };

        match (prev, next) {
            (Some(p), Some(nx)) => {
                if run <= carry_limit {
                    series[start..end].iter_mut().for_each(|v| *v = Some(p));
                } else if run <= interpolate_limit {
                    let steps = (run + 1) as f64;
                    for (k, slot) in series[start..end].iter_mut().enumerate() {
                        let ratio = (k + 1) as f64 / steps;
                        *slot = Some(p + ratio * (nx - p));
                    }
                }
            }
            (Some(p), None) if run <= carry_limit => {
                series[start..end].iter_mut().for_each(|v| *v = Some(p));
            }
            (None, Some(nx)) if run <= carry_limit => {
                series[start..end].iter_mut().for_each(|v| *v = Some(nx));
            }
            _ => {}
        }
        i = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    fn sample(span: &str, minute: i64, column: &str, value: Option<f64>) -> Sample {
        let mut s = Sample::new(span, Some(ts(minute)));
        s.set_value(column, value);
        s
    }

    #[test]
    fn empty_input_produces_no_grid() {
        let out = resample(&[], &ResampleConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn span_without_valid_timestamps_produces_no_rows() {
        let mut s = Sample::new("S1", None);
        s.set_value("CDR", Some(1.0));
        let out = resample(&[s], &ResampleConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn single_timestamp_is_a_degenerate_grid() {
        let out = resample(
            &[sample("S1", 0, "CDR", Some(1.0))],
            &ResampleConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, Some(ts(0)));
        assert_eq!(out[0].value("CDR"), Some(1.0));
    }

    #[test]
    fn grid_never_leaves_observed_window() {
        let out = resample(
            &[
                sample("S1", 0, "CDR", Some(1.0)),
                sample("S1", 50, "CDR", Some(2.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        let min = ts(0);
        let max = ts(50);
        assert!(out
            .iter()
            .all(|s| s.timestamp.unwrap() >= min && s.timestamp.unwrap() <= max));
        // 50 is off-grid, so the last slot is 45.
        assert_eq!(out.last().unwrap().timestamp, Some(ts(45)));
    }

    #[test]
    fn short_gap_is_carry_filled() {
        // t0, t0+15m, t0+60m: slots at 30m and 45m are a two-slot gap.
        let out = resample(
            &[
                sample("S1", 0, "QFACTOR-AVG", Some(10.0)),
                sample("S1", 15, "QFACTOR-AVG", Some(11.0)),
                sample("S1", 60, "QFACTOR-AVG", Some(12.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out[2].timestamp, Some(ts(30)));
        assert_eq!(out[2].value("QFACTOR-AVG"), Some(11.0));
        assert_eq!(out[3].timestamp, Some(ts(45)));
        assert_eq!(out[3].value("QFACTOR-AVG"), Some(11.0));
    }

    #[test]
    fn medium_gap_interpolates_between_brackets() {
        // Three missing slots: beyond the carry limit, within interpolation.
        let out = resample(
            &[
                sample("S1", 0, "CDR", Some(100.0)),
                sample("S1", 60, "CDR", Some(500.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        let values: Vec<_> = out.iter().map(|s| s.value("CDR")).collect();
        assert_eq!(
            values,
            vec![Some(100.0), Some(200.0), Some(300.0), Some(400.0), Some(500.0)]
        );
        // No overshoot: every filled value lies between the brackets.
        for v in values.into_iter().flatten() {
            assert!((100.0..=500.0).contains(&v));
        }
    }

    #[test]
    fn long_gap_stays_missing() {
        // Seven missing slots: beyond both limits.
        let out = resample(
            &[
                sample("S1", 0, "CDR", Some(1.0)),
                sample("S1", 120, "CDR", Some(2.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 9);
        assert!(out[1..8].iter().all(|s| s.value("CDR").is_none()));
    }

    #[test]
    fn leading_gap_carries_following_value_within_limit() {
        let out = resample(
            &[
                sample("S1", 0, "CDR", None),
                sample("S1", 15, "CDR", None),
                sample("S1", 30, "CDR", Some(7.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        assert_eq!(out[0].value("CDR"), Some(7.0));
        assert_eq!(out[1].value("CDR"), Some(7.0));
    }

    #[test]
    fn duplicate_timestamps_collapse_last_wins() {
        let out = resample(
            &[
                sample("S1", 0, "CDR", Some(1.0)),
                sample("S1", 0, "CDR", Some(9.0)),
                sample("S1", 15, "CDR", Some(2.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value("CDR"), Some(9.0));
    }

    #[test]
    fn spans_are_resampled_independently() {
        let out = resample(
            &[
                sample("S1", 0, "CDR", Some(1.0)),
                sample("S1", 30, "CDR", Some(2.0)),
                sample("S2", 0, "CDR", Some(5.0)),
            ],
            &ResampleConfig::default(),
        )
        .unwrap();
        let s1: Vec<_> = out.iter().filter(|s| s.span == "S1").collect();
        let s2: Vec<_> = out.iter().filter(|s| s.span == "S2").collect();
        assert_eq!(s1.len(), 3);
        assert_eq!(s2.len(), 1);
    }

    #[test]
    fn nonpositive_cadence_is_rejected() {
        let config = ResampleConfig::default().with_cadence(Duration::zero());
        let err = resample(&[sample("S1", 0, "CDR", Some(1.0))], &config).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidParameter { .. }));
    }
}
