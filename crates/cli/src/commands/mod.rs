//! Command implementations.
//!
//! Each command returns the text to print on stdout; the binary decides how
//! to report failures.

pub mod palettes;
pub mod transform;

use crate::cli::{CliError, OkEnvelope};
use serde::Serialize;

/// Serialize `data` inside an `ok` envelope.
///
/// # Errors
///
/// Returns an unexpected error if `data` cannot be serialized.
pub fn render_ok<T: Serialize>(data: T, pretty: bool) -> Result<String, CliError> {
    let envelope = OkEnvelope::new(data);
    let rendered = if pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    rendered.map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
}
