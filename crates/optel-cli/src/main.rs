//! # optel-cli
//!
//! Batch entrypoint for the optical telemetry analyzer: load CSV exports,
//! repair the sampling grid, compute per-span baselines, flag deviations
//! and threshold breaches, and write the run artifacts.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use optel_core::prelude::*;
use optel_export::{write_json_summary, write_prometheus, write_records_csv};
use optel_forecast::{forecast_linear_trend, ForecastConfig};
use optel_ingest::{find_csvs_in_dir, load_csv_files, IngestConfig};

/// At most this many raw rows feed the Prometheus exposition, mirroring a
/// debugging artifact rather than a full export.
const PROMETHEUS_ROW_CAP: usize = 1000;

#[derive(Parser)]
#[command(name = "optel")]
#[command(about = "Optical-network telemetry analyzer", long_about = None)]
struct Cli {
    /// Directory with CSV files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,

    /// Explicit CSV paths (overrides --input-dir)
    #[arg(long, num_args = 1..)]
    input_files: Vec<PathBuf>,

    /// Output directory for run artifacts
    #[arg(long, default_value = "./output")]
    output_dir: PathBuf,

    /// Logging filter (e.g. info, debug, optel_core=debug)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Resampling cadence in minutes
    #[arg(long, default_value_t = 15)]
    cadence_minutes: i64,

    /// Cap on spans selected for forecasting
    #[arg(long, default_value_t = 6)]
    forecast_spans: usize,
}

/// Flat forecast row for the CSV artifact.
#[derive(Debug, Serialize)]
struct ForecastRow {
    span: String,
    column: String,
    timestamp: chrono::NaiveDateTime,
    forecast: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    info!("starting optical telemetry analyzer");

    let paths = if cli.input_files.is_empty() {
        find_csvs_in_dir(&cli.input_dir)
            .with_context(|| format!("scanning {}", cli.input_dir.display()))?
    } else {
        cli.input_files.clone()
    };
    info!(files = paths.len(), "discovered CSV inputs");
    if paths.is_empty() {
        warn!("no input files; writing empty artifacts");
    }

    let table = load_csv_files(&paths, &IngestConfig::default()).context("loading CSV inputs")?;
    info!(rows = table.samples.len(), "rows loaded");

    let columns = KpiColumnMap::default();
    let kpis = infer_kpis_present(&table.samples, &columns);
    info!(?kpis, "KPIs detected");

    let time_range = compute_time_range(&table.samples);
    let cadence = Duration::minutes(cli.cadence_minutes);

    let gap_reports = detect_gaps(&table.samples, cadence).context("gap detection")?;

    let resample_config = ResampleConfig::default().with_cadence(cadence);
    let resampled = resample(&table.samples, &resample_config).context("resampling")?;
    info!(rows = resampled.len(), "resampled onto cadence grid");

    // Baselines over the raw coerced table: interpolated values would bias
    // the dispersion estimate.
    let baselines = compute_baselines(&table.samples, &BaselineConfig::default());
    info!(entries = baselines.len(), "baselines computed");

    let detector = DeviationDetector::new(DeviationConfig::default(), columns.clone());
    let anomalies = detector.detect(&table.samples, &baselines);
    let alerts = evaluate_thresholds(&table.samples, &columns, &ThresholdConfig::default());
    let span_summaries = summarize_by_span(&table.samples, &columns);
    info!(
        anomalies = anomalies.len(),
        alerts = alerts.len(),
        "detection complete"
    );

    let forecasts = build_forecasts(&cli, &resampled, &anomalies, &span_summaries, cadence);

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating {}", cli.output_dir.display()))?;

    let summary = RunSummary {
        time_range,
        kpis,
        gap_reports: gap_reports.clone(),
        alert_count: alerts.len(),
        anomaly_count: anomalies.len(),
    };
    let out = |name: &str| cli.output_dir.join(name);

    write_json_summary(&summary, &out("summary.json")).context("writing summary.json")?;
    write_records_csv(&span_summaries, &out("span_summary.csv"))
        .context("writing span_summary.csv")?;
    write_records_csv(&gap_reports, &out("gap_report.csv")).context("writing gap_report.csv")?;
    write_records_csv(&alerts, &out("alerts.csv")).context("writing alerts.csv")?;
    write_records_csv(&anomalies, &out("anomalies.csv")).context("writing anomalies.csv")?;
    write_records_csv(&forecasts, &out("forecasts.csv")).context("writing forecasts.csv")?;

    let prom_rows = &table.samples[..table.samples.len().min(PROMETHEUS_ROW_CAP)];
    write_prometheus(prom_rows, "optel_telemetry", &out("prom_metrics.txt"))
        .context("writing prom_metrics.txt")?;

    info!(output = %cli.output_dir.display(), "outputs written");
    Ok(())
}

/// Forecast the default KPI columns for the most interesting spans:
/// those with anomalies first, falling back to the first summarized spans.
fn build_forecasts(
    cli: &Cli,
    resampled: &[Sample],
    anomalies: &[AnomalyRecord],
    span_summaries: &[SpanSummary],
    cadence: Duration,
) -> Vec<ForecastRow> {
    let mut spans: Vec<&str> = Vec::new();
    let mut seen = BTreeSet::new();
    for record in anomalies {
        if spans.len() >= cli.forecast_spans {
            break;
        }
        if seen.insert(record.span.as_str()) {
            spans.push(&record.span);
        }
    }
    if spans.is_empty() {
        for summary in span_summaries {
            if spans.len() >= cli.forecast_spans {
                break;
            }
            if seen.insert(summary.span.as_str()) {
                spans.push(&summary.span);
            }
        }
    }

    let present = columns_present(resampled);
    let kpi_columns = BaselineConfig::default().kpi_columns;
    let config = ForecastConfig {
        cadence,
        ..ForecastConfig::default()
    };
    let mut rows = Vec::new();
    for span in spans {
        for column in &kpi_columns {
            if !present.contains(column) {
                continue;
            }
            let series = kpi_series(resampled, span, column);
            for point in forecast_linear_trend(&series, &config) {
                rows.push(ForecastRow {
                    span: span.to_string(),
                    column: column.clone(),
                    timestamp: point.timestamp,
                    forecast: point.forecast,
                });
            }
        }
    }
    rows
}
