//! # optel-export
//!
//! Run-artifact writers for the export/visualization collaborators: a JSON
//! run summary, serde-backed CSV record files and a naive Prometheus text
//! exposition. All outputs are plain structured records — the field names
//! on the core model types are the wire contract.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use optel_core::model::Sample;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while writing run artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write any serializable value as pretty-printed JSON.
pub fn write_json_summary<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Write a slice of records as CSV with a header row.
///
/// Nothing is written for an empty slice — absent artifacts signal absent
/// results, matching the rest of the pipeline.
pub fn write_records_csv<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render samples as Prometheus text exposition lines.
///
/// One line per non-missing cell:
/// `<prefix>_<sanitized_column>{tp="<span>"} <value>`. Missing values are
/// skipped entirely rather than encoded as zero or NaN.
pub fn prometheus_lines(samples: &[Sample], metric_prefix: &str) -> String {
    let mut lines = Vec::new();
    for sample in samples {
        for (column, value) in &sample.values {
            let Some(v) = value else { continue };
            lines.push(format!(
                "{}_{}{{tp=\"{}\"}} {}",
                metric_prefix,
                sanitize_metric_name(column),
                sample.span,
                v
            ));
        }
    }
    lines.join("\n")
}

/// Write the Prometheus exposition to a file; skipped when empty.
pub fn write_prometheus(samples: &[Sample], metric_prefix: &str, path: &Path) -> Result<()> {
    let body = prometheus_lines(samples, metric_prefix);
    if body.is_empty() {
        return Ok(());
    }
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(body.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Lowercase, non-alphanumerics mapped to underscores.
fn sanitize_metric_name(column: &str) -> String {
    column
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use optel_core::model::{AnomalyRecord, ReasonCode};

    fn sample(span: &str, column: &str, value: Option<f64>) -> Sample {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut s = Sample::new(span, Some(ts));
        s.set_value(column, value);
        s
    }

    #[test]
    fn prometheus_lines_skip_missing_and_label_spans() {
        let samples = vec![
            sample("S1", "QFACTOR-AVG", Some(9.5)),
            sample("S1", "CDR", None),
        ];
        let body = prometheus_lines(&samples, "optel_telemetry");
        assert_eq!(body, "optel_telemetry_qfactor_avg{tp=\"S1\"} 9.5");
    }

    #[test]
    fn metric_names_are_sanitized() {
        assert_eq!(sanitize_metric_name("PRE-FEC-AVG"), "pre_fec_avg");
        assert_eq!(sanitize_metric_name("ESNR_AVG"), "esnr_avg");
    }

    #[test]
    fn records_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anomalies.csv");
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let records = vec![AnomalyRecord {
            timestamp: ts,
            span: "S1".to_string(),
            kpi: "qfactor".to_string(),
            column: "QFACTOR-AVG".to_string(),
            value: 8.5,
            baseline: Some(10.0),
            reason: ReasonCode::QDrop,
        }];

        write_records_csv(&records, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,span,kpi,column,value,baseline,reason"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("q_drop"));
        assert!(row.contains("8.5"));
    }

    #[test]
    fn empty_record_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let records: Vec<Sample> = Vec::new();
        write_records_csv(&records, &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn json_summary_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        #[derive(Serialize)]
        struct Summary {
            rows: usize,
        }
        write_json_summary(&Summary { rows: 42 }, &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["rows"], 42);
    }
}
