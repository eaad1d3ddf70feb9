//! # optel-ingest
//!
//! CSV ingestion for vendor telemetry exports: file discovery, header
//! normalization, timestamp parsing to a timezone-naive UTC representation
//! and sentinel-aware numeric coercion into [`optel_core::model::Sample`]
//! batches.
//!
//! Malformed cells degrade to missing values; a dataset missing its time
//! column or every candidate group column is a structural failure and
//! aborts the load.

mod error;
mod loader;

pub use error::{IngestError, Result};
pub use loader::{find_csvs_in_dir, load_csv_files, IngestConfig, LoadedTable};
