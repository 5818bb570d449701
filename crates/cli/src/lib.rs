//! ganttline - the command-line driver for `ganttline-core`
//!
//! Loads a record file and a transformer configuration, runs one
//! transformation and prints the result as a JSON envelope:
//!
//! ```text
//! ganttline transform --records tasks.json --config gantt.toml --sort-by start_asc
//! {"status":"ok","data":{"tasks":[...],"metadata":{...},"colorMapping":{...}}}
//! ```
//!
//! Failures exit with code 2 (configuration or input) or 3 (transformation)
//! and are rendered either as a `miette` report or, with `--json`, as an
//! error envelope.

/// CLI argument parsing, errors and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// Record and configuration loading.
pub mod input;
/// Tracing and logging configuration.
pub mod tracing;

pub use cli::{CliError, exit_code_for};
