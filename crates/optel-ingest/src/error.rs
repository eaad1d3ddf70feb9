//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while loading telemetry CSV files.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input path not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Structural failure: the dataset cannot be grouped or time-aligned.
    #[error("required column '{column}' missing from {path}")]
    MissingColumn { path: PathBuf, column: String },
}
