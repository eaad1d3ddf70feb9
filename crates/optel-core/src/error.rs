//! Telemetry error types
//!
//! Defines the standardized error type for core pipeline operations.

use thiserror::Error;

/// Result type alias for core pipeline operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors that can occur during telemetry processing.
///
/// Malformed values and insufficient history are recovered locally (missing
/// values, absent output rows) and never surface here; only structural
/// problems that make a stage impossible are errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// A column the stage cannot proceed without is absent from the dataset.
    #[error("required column '{column}' missing from input")]
    MissingColumn { column: String },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_the_column() {
        let error = TelemetryError::MissingColumn {
            column: "Time".to_string(),
        };
        assert_eq!(error.to_string(), "required column 'Time' missing from input");
    }

    #[test]
    fn invalid_parameter_display() {
        let error = TelemetryError::InvalidParameter {
            name: "cadence".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "invalid parameter 'cadence': must be positive"
        );
    }
}
