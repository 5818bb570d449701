//! Error types for the ganttline-core crate

use crate::metadata::ValidationMetadata;
use miette::Diagnostic;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Fatal conditions that abort a transformation.
///
/// Row-level problems never surface here; they are counted in
/// [`ValidationMetadata`] instead.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// One or more required columns are absent from the record schema
    #[error(
        "Required columns not found: {}. Available columns: {}",
        missing.join(", "),
        available.join(", ")
    )]
    #[diagnostic(
        code(ganttline::column_not_found),
        help("Check the id, start and end column names in your configuration")
    )]
    ColumnNotFound {
        /// Required column names that were not found
        missing: Vec<String>,
        /// Every column the record set provides
        available: Vec<String>,
    },

    /// The record set has no rows
    #[error("Dataset is empty")]
    #[diagnostic(
        code(ganttline::empty_dataset),
        help("Provide at least one record to transform")
    )]
    EmptyDataset,

    /// Every row was skipped
    #[error(
        "No valid tasks found: all {} rows were skipped",
        metadata.total_rows
    )]
    #[diagnostic(
        code(ganttline::no_valid_tasks),
        help("Check that the date columns hold valid dates and that start dates are not after end dates")
    )]
    NoValidTasks {
        /// Counts describing why each row was skipped
        metadata: Box<ValidationMetadata>,
    },

    /// The transformer configuration is unusable
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(ganttline::config::invalid))]
    InvalidConfiguration {
        /// What is wrong with the configuration
        message: String,
    },
}

/// Stable machine-readable identifier for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// See [`Error::ColumnNotFound`]
    ColumnNotFound,
    /// See [`Error::EmptyDataset`]
    EmptyDataset,
    /// See [`Error::NoValidTasks`]
    NoValidTasks,
    /// See [`Error::InvalidConfiguration`]
    InvalidConfiguration,
}

impl ErrorCode {
    /// The code as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColumnNotFound => "COLUMN_NOT_FOUND",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::NoValidTasks => "NO_VALID_TASKS",
            Self::InvalidConfiguration => "INVALID_CONFIGURATION",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Machine-readable code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::EmptyDataset => ErrorCode::EmptyDataset,
            Self::NoValidTasks { .. } => ErrorCode::NoValidTasks,
            Self::InvalidConfiguration { .. } => ErrorCode::InvalidConfiguration,
        }
    }

    /// Structured details for the error, suitable for a JSON error body.
    #[must_use]
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::ColumnNotFound { missing, available } => json!({
                "missingColumns": missing,
                "availableColumns": available,
            }),
            Self::NoValidTasks { metadata } => {
                serde_json::to_value(metadata.as_ref()).unwrap_or(serde_json::Value::Null)
            }
            Self::EmptyDataset | Self::InvalidConfiguration { .. } => serde_json::Value::Null,
        }
    }
}

/// Result type for ganttline-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_not_found_message() {
        let err = Error::ColumnNotFound {
            missing: vec!["start".to_string()],
            available: vec!["id".to_string(), "end".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Required columns not found: start. Available columns: id, end"
        );
        assert_eq!(err.code(), ErrorCode::ColumnNotFound);
        assert_eq!(err.details()["missingColumns"][0], "start");
    }

    #[test]
    fn test_codes_serialize_screaming() {
        let json = serde_json::to_string(&ErrorCode::NoValidTasks).unwrap();
        assert_eq!(json, "\"NO_VALID_TASKS\"");
        assert_eq!(ErrorCode::EmptyDataset.to_string(), "EMPTY_DATASET");
    }

    #[test]
    fn test_no_valid_tasks_details_carry_metadata() {
        let metadata = ValidationMetadata {
            total_rows: 2,
            skipped_rows: 2,
            ..ValidationMetadata::default()
        };
        let err = Error::NoValidTasks {
            metadata: Box::new(metadata),
        };
        assert_eq!(err.details()["totalRows"], 2);
        assert!(err.to_string().contains("all 2 rows"));
    }

    #[test]
    fn test_invalid_configuration_has_no_details() {
        let err = Error::invalid_configuration("idColumn must not be empty");
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
        assert!(err.details().is_null());
    }
}
