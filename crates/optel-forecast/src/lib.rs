//! # optel-forecast
//!
//! Linear-trend extrapolation over one span's cleaned KPI series.
//!
//! Intentionally lightweight: an ordinary-least-squares line over a
//! trailing window of observations, extended a fixed number of cadence
//! steps past the last observed timestamp. Input is expected already
//! resampled (sorted, gaps handled); fewer than three observations is
//! insufficient history and yields an empty forecast, not an error.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use optel_core::model::KpiSeries;

/// Configuration for the linear-trend forecaster.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Number of future points to emit.
    pub periods: usize,
    /// Spacing of the future points; matches the resampler cadence.
    pub cadence: Duration,
    /// Trailing observation window the line is fitted on.
    pub window: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            periods: 24,
            cadence: Duration::minutes(15),
            window: 96,
        }
    }
}

/// One forecasted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub forecast: f64,
}

/// Forecast future values by fitting a line to the recent window.
///
/// The fit regresses value on epoch seconds, so irregular spacing inside
/// the window is weighted by real elapsed time. Future timestamps start
/// one cadence after the last observed point. Pure and deterministic.
pub fn forecast_linear_trend(series: &KpiSeries, config: &ForecastConfig) -> Vec<ForecastPoint> {
    let observed: Vec<(NaiveDateTime, f64)> = series.observed().collect();
    if observed.len() < 3 || config.periods == 0 || config.cadence <= Duration::zero() {
        return Vec::new();
    }
    let window_start = observed.len().saturating_sub(config.window);
    let window = &observed[window_start..];

    let (Some((slope, intercept)), Some(&(last, _))) = (fit_line(window), window.last()) else {
        return Vec::new();
    };
    (1..=config.periods)
        .map(|k| {
            let timestamp = last + config.cadence * k as i32;
            let x = timestamp.and_utc().timestamp() as f64;
            ForecastPoint {
                timestamp,
                forecast: intercept + slope * x,
            }
        })
        .collect()
}

/// OLS fit of value on epoch seconds; `None` when the window has no time
/// spread to regress over.
fn fit_line(points: &[(NaiveDateTime, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    let xs: Vec<f64> = points
        .iter()
        .map(|(ts, _)| ts.and_utc().timestamp() as f64)
        .collect();
    let ys: Vec<f64> = points.iter().map(|&(_, v)| v).collect();

    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxx += (x - x_mean) * (x - x_mean);
        sxy += (x - x_mean) * (y - y_mean);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}
