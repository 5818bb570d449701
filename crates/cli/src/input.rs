//! Loading record sets and transformer configuration from disk.

use crate::cli::CliError;
use ganttline_core::{RawRecord, RecordSet, TaskTransformerConfig};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Accepted shapes of a record file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordDocument {
    /// A bare array of row objects
    Rows(Vec<RawRecord>),
    /// `{"columns": [...], "rows": [...]}` with an explicit schema
    Table {
        columns: Vec<String>,
        rows: Vec<RawRecord>,
    },
}

impl From<RecordDocument> for RecordSet {
    fn from(document: RecordDocument) -> Self {
        match document {
            RecordDocument::Rows(rows) => Self::from_rows(rows),
            RecordDocument::Table { columns, rows } => Self::new(columns, rows),
        }
    }
}

/// Parse a JSON record document.
///
/// # Errors
///
/// Returns an input error when the text is not a JSON array of objects or a
/// `{columns, rows}` table.
pub fn parse_records(text: &str) -> Result<RecordSet, CliError> {
    let document: RecordDocument = serde_json::from_str(text).map_err(|e| {
        CliError::input_with_help(
            format!("Failed to parse records: {e}"),
            "Records must be a JSON array of objects or an object with 'columns' and 'rows'",
        )
    })?;
    Ok(document.into())
}

/// Read records from `path`, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an input error when the source cannot be read or parsed.
pub fn load_records(path: &Path) -> Result<RecordSet, CliError> {
    let text = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CliError::input(format!("Failed to read records from stdin: {e}")))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            CliError::input_with_help(
                format!("Failed to read records from {}: {e}", path.display()),
                "Check that the file exists and is readable",
            )
        })?
    };

    let records = parse_records(&text)?;
    debug!(
        source = %path.display(),
        rows = records.len(),
        columns = records.columns().len(),
        "Loaded records"
    );
    Ok(records)
}

/// Read a transformer configuration; the format follows the file extension.
///
/// # Errors
///
/// Returns a configuration error when the file cannot be read, has an
/// unknown extension, or does not describe a configuration.
pub fn load_config(path: &Path) -> Result<TaskTransformerConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::config(format!(
            "Failed to read configuration from {}: {e}",
            path.display()
        ))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parsed = match extension.as_deref() {
        Some("toml") => toml::from_str(&text).map_err(|e| e.to_string()),
        Some("json") => serde_json::from_str(&text).map_err(|e| e.to_string()),
        _ => {
            return Err(CliError::config_with_help(
                format!("Unsupported configuration format: {}", path.display()),
                "Use a .toml or .json file",
            ));
        }
    };

    parsed.map_err(|e| {
        CliError::config_with_help(
            format!("Invalid configuration in {}: {e}", path.display()),
            "idColumn, startColumn and endColumn are required",
        )
    })
}
