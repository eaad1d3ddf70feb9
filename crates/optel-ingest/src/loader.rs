//! CSV discovery and loading.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use optel_core::coerce::{coerce_value, CoercionConfig};
use optel_core::model::Sample;

use crate::error::{IngestError, Result};

/// Timestamp layouts seen across vendor exports, tried in order after
/// RFC 3339.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Configuration for CSV ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Header of the raw time column.
    pub time_column: String,
    /// Candidate group-identifier columns, in preference order.
    pub group_columns: Vec<String>,
    /// Sentinel mapping applied to every KPI cell.
    pub coercion: CoercionConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            time_column: "Time".to_string(),
            group_columns: vec!["TP".to_string(), "NE".to_string()],
            coercion: CoercionConfig::default(),
        }
    }
}

/// The loaded batch plus what ingestion resolved along the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub samples: Vec<Sample>,
    /// Group column actually used (first candidate present in the data).
    pub group_column: String,
    /// All KPI columns seen across the loaded files.
    pub columns: BTreeSet<String>,
}

/// CSV file paths in a directory, non-recursive, sorted.
pub fn find_csvs_in_dir(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|source| IngestError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load and concatenate one or more CSV exports into a sample batch.
///
/// Headers are trimmed before matching. A file without the time column or
/// without any candidate group column fails the load; everything else
/// degrades per cell: unparseable timestamps leave the row timestamp-less,
/// sentinel and unparseable KPI cells become missing values.
pub fn load_csv_files(paths: &[PathBuf], config: &IngestConfig) -> Result<LoadedTable> {
    let mut table = LoadedTable::default();
    for path in paths {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.clone()));
        }
        load_one(path, config, &mut table)?;
    }
    info!(
        files = paths.len(),
        rows = table.samples.len(),
        group_column = %table.group_column,
        "CSV load complete"
    );
    Ok(table)
}

fn load_one(path: &Path, config: &IngestConfig, table: &mut LoadedTable) -> Result<()> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h == &config.time_column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: config.time_column.clone(),
        })?;

    let group_idx = config
        .group_columns
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: config.group_columns.join(" or "),
        })?;

    let group_column = headers[group_idx].clone();
    if table.group_column.is_empty() {
        table.group_column = group_column;
    } else if table.group_column != group_column {
        warn!(
            previous = %table.group_column,
            current = %group_column,
            file = %path.display(),
            "group column differs between input files"
        );
    }

    // Everything that is neither the time column nor a group key is a KPI
    // column; non-numeric metadata columns simply coerce to missing.
    let kpi_indices: Vec<usize> = (0..headers.len())
        .filter(|&i| i != time_idx && !config.group_columns.contains(&headers[i]))
        .collect();
    for &i in &kpi_indices {
        table.columns.insert(headers[i].clone());
    }

    let mut unparseable = 0usize;
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let timestamp = record.get(time_idx).and_then(parse_timestamp);
        if timestamp.is_none() {
            unparseable += 1;
        }
        let span = record.get(group_idx).unwrap_or("").trim();
        let mut sample = Sample::new(span, timestamp);
        for &i in &kpi_indices {
            let raw = record.get(i).unwrap_or("");
            sample.set_value(headers[i].clone(), coerce_value(raw, &config.coercion));
        }
        table.samples.push(sample);
    }

    if unparseable > 0 {
        warn!(
            file = %path.display(),
            rows = unparseable,
            "rows with unparseable timestamps"
        );
    }
    debug!(file = %path.display(), "file loaded");
    Ok(())
}

/// Parse one raw time cell to naive UTC.
///
/// Offset-carrying forms are converted to UTC before the offset is
/// dropped, so mixed-zone exports align on one reference timeline.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_rows_and_maps_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "spans.csv",
            "Time,TP,QFACTOR-AVG,ESNR-AVG\n\
             2024-03-01 08:00:00,S1,9.5,NS\n\
             2024-03-01 08:15:00,S1,-99.95,18.2\n",
        );

        let table = load_csv_files(&[path], &IngestConfig::default()).unwrap();
        assert_eq!(table.group_column, "TP");
        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.samples[0].span, "S1");
        assert_eq!(table.samples[0].value("QFACTOR-AVG"), Some(9.5));
        assert_eq!(table.samples[0].value("ESNR-AVG"), None);
        assert_eq!(table.samples[1].value("QFACTOR-AVG"), None);
        assert_eq!(table.samples[1].value("ESNR-AVG"), Some(18.2));
    }

    #[test]
    fn rfc3339_offsets_normalize_to_utc() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "tz.csv",
            "Time,TP,CDR\n2024-03-01T10:00:00+02:00,S1,120\n",
        );
        let table = load_csv_files(&[path], &IngestConfig::default()).unwrap();
        let ts = table.samples[0].timestamp.unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-03-01 08:00:00");
    }

    #[test]
    fn unparseable_timestamp_keeps_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "bad_ts.csv",
            "Time,TP,CDR\nnot-a-time,S1,120\n",
        );
        let table = load_csv_files(&[path], &IngestConfig::default()).unwrap();
        assert_eq!(table.samples.len(), 1);
        assert_eq!(table.samples[0].timestamp, None);
        assert_eq!(table.samples[0].value("CDR"), Some(120.0));
    }

    #[test]
    fn missing_time_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "no_time.csv", "TP,CDR\nS1,120\n");
        let err = load_csv_files(&[path], &IngestConfig::default()).unwrap_err();
        match err {
            IngestError::MissingColumn { column, .. } => assert_eq!(column, "Time"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn missing_group_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "no_group.csv",
            "Time,CDR\n2024-03-01 08:00:00,120\n",
        );
        let err = load_csv_files(&[path], &IngestConfig::default()).unwrap_err();
        match err {
            IngestError::MissingColumn { column, .. } => assert_eq!(column, "TP or NE"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_second_group_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "ne_only.csv",
            "Time,NE,CDR\n2024-03-01 08:00:00,NODE-7,120\n",
        );
        let table = load_csv_files(&[path], &IngestConfig::default()).unwrap();
        assert_eq!(table.group_column, "NE");
        assert_eq!(table.samples[0].span, "NODE-7");
    }

    #[test]
    fn multiple_files_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(
            dir.path(),
            "a.csv",
            "Time,TP,CDR\n2024-03-01 08:00:00,S1,100\n",
        );
        let b = write_csv(
            dir.path(),
            "b.csv",
            "Time,TP,CDR\n2024-03-01 08:15:00,S2,200\n",
        );
        let table = load_csv_files(&[a, b], &IngestConfig::default()).unwrap();
        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.samples[1].span, "S2");
    }

    #[test]
    fn discovery_is_sorted_and_csv_only() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "b.csv", "x\n");
        write_csv(dir.path(), "a.CSV", "x\n");
        write_csv(dir.path(), "notes.txt", "x\n");

        let found = find_csvs_in_dir(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn missing_input_file_is_reported() {
        let err = load_csv_files(
            &[PathBuf::from("/nonexistent/spans.csv")],
            &IngestConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound(_)));
    }
}
