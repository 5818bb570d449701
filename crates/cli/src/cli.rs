use crate::tracing::{LogLevel, TracingFormat};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ganttline_core::{DuplicateIdHandling, ErrorCode, PaletteName, SortCriterion};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// Configuration or input error exit code
pub const EXIT_CLI: i32 = 2;
/// Transformation or unexpected error exit code
pub const EXIT_TRANSFORM: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Bad flags or an unusable configuration file (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(ganttline::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The record file could not be read or parsed (exit code 2)
    #[error("Input error: {message}")]
    #[diagnostic(code(ganttline::cli::input))]
    Input {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The transformation aborted (exit code 3)
    #[error("Transformation failed: {message}")]
    #[diagnostic(code(ganttline::cli::transform))]
    Transform {
        /// Machine-readable code of the underlying failure
        code: ErrorCode,
        /// The error message
        message: String,
        /// Structured context for the JSON error body
        details: serde_json::Value,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(ganttline::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new input error with help text
    #[must_use]
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// The message without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Config { message, .. }
            | Self::Input { message, .. }
            | Self::Transform { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    /// Code used in the JSON error envelope.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Input { .. } => "input",
            Self::Transform { code, .. } => code.as_str(),
            Self::Other { .. } => "other",
        }
    }
}

/// Convert `ganttline_core::Error` to the matching `CliError` variant.
///
/// An invalid configuration is a configuration error (exit code 2);
/// everything else aborted the transformation itself (exit code 3).
impl From<ganttline_core::Error> for CliError {
    fn from(err: ganttline_core::Error) -> Self {
        if let ganttline_core::Error::InvalidConfiguration { message } = err {
            return Self::config(message);
        }

        let help = err.help().map(|h| h.to_string());
        Self::Transform {
            code: err.code(),
            message: err.to_string(),
            details: err.details(),
            help,
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Input { .. } => EXIT_CLI,
        CliError::Transform { .. } | CliError::Other { .. } => EXIT_TRANSFORM,
    }
}

/// Body of a JSON error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Structured context, `null` when there is none
    pub details: serde_json::Value,
}

impl From<&CliError> for ErrorBody {
    fn from(err: &CliError) -> Self {
        let details = match err {
            CliError::Transform { details, .. } => details.clone(),
            CliError::Config { .. } | CliError::Input { .. } | CliError::Other { .. } => {
                serde_json::Value::Null
            }
        };
        Self {
            code: err.code().to_string(),
            message: err.message().to_string(),
            details,
        }
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(ErrorBody::from(err));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Turn tabular records into render-ready Gantt tasks.
#[derive(Parser, Debug)]
#[command(name = "ganttline")]
#[command(about = "Turn tabular records into render-ready Gantt tasks")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Filter directive such as `ganttline_core=debug`; overrides `RUST_LOG` and `--level`.
    #[arg(long, global = true, help = "Tracing filter directive, overriding RUST_LOG and --level")]
    pub log_filter: Option<String>,

    /// Emit errors as a JSON envelope on stdout.
    #[arg(long, global = true, help = "Emit errors as a JSON envelope on stdout")]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform a record file into tasks.
    #[command(about = "Transform a record file into tasks")]
    Transform(TransformArgs),

    /// List the built-in colour palettes.
    #[command(about = "List the built-in colour palettes and their classes")]
    Palettes,
}

/// Arguments of `ganttline transform`.
///
/// Every column and option flag overrides the value read from `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct TransformArgs {
    /// Record file (JSON); `-` reads stdin.
    #[arg(long, short = 'r', help = "Record file (JSON array or {columns, rows}); '-' reads stdin")]
    pub records: PathBuf,

    /// Transformer configuration file (TOML or JSON).
    #[arg(long, short = 'c', help = "Configuration file (.toml or .json)")]
    pub config: Option<PathBuf>,

    /// Identifier column.
    #[arg(long, help = "Column holding the task identifier")]
    pub id_column: Option<String>,

    /// Start date column.
    #[arg(long, help = "Column holding the start date")]
    pub start_column: Option<String>,

    /// End date column.
    #[arg(long, help = "Column holding the end date")]
    pub end_column: Option<String>,

    /// Name column.
    #[arg(long, help = "Column holding the display name")]
    pub name_column: Option<String>,

    /// Progress column.
    #[arg(long, help = "Column holding completion percentage")]
    pub progress_column: Option<String>,

    /// Dependencies column.
    #[arg(long, help = "Column holding comma-separated prerequisite ids")]
    pub dependencies_column: Option<String>,

    /// Colour column.
    #[arg(long, help = "Categorical column driving bar colours")]
    pub color_column: Option<String>,

    /// Tooltip columns.
    #[arg(long = "tooltip-column", help = "Column copied into tooltips (repeatable)")]
    pub tooltip_columns: Vec<String>,

    /// Grouping columns.
    #[arg(long = "group-by", help = "Grouping column, outermost first (repeatable)")]
    pub group_by: Vec<String>,

    /// Sort criterion.
    #[arg(long, help = "Sort criterion (none, start_asc, name_desc, dependencies, ...)")]
    pub sort_by: Option<SortCriterion>,

    /// Task cap.
    #[arg(long, help = "Maximum tasks in the output; 0 means unlimited")]
    pub max_tasks: Option<usize>,

    /// Palette.
    #[arg(long, help = "Palette: classic, pastel, dark, vibrant or custom")]
    pub palette: Option<PaletteName>,

    /// Custom colours.
    #[arg(long = "custom-color", help = "Hex colour for the custom palette (repeatable)")]
    pub custom_colors: Vec<String>,

    /// Duplicate identifier handling.
    #[arg(long = "duplicate-ids", help = "Duplicate id handling: rename or skip")]
    pub duplicate_ids: Option<DuplicateIdHandling>,

    /// Reference date for expected progress.
    #[arg(long, help = "Reference date (YYYY-MM-DD) for expected progress")]
    pub reference_date: Option<NaiveDate>,

    /// Use today's date as reference date.
    #[arg(long, conflicts_with = "reference_date", help = "Use today's date as reference date")]
    pub today: bool,

    /// Pretty-print the JSON output.
    #[arg(long, help = "Pretty-print the JSON output")]
    pub pretty: bool,
}

/// Parse command line arguments into a CLI structure.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["ganttline", "palettes"]).unwrap();

        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.log_format, TracingFormat::Compact);
        assert!(!cli.json);
        assert_eq!(cli.log_filter, None);
        assert!(matches!(cli.command, Commands::Palettes));
    }

    #[test]
    fn test_cli_log_filter() {
        let cli = Cli::try_parse_from([
            "ganttline",
            "palettes",
            "--log-filter",
            "ganttline_core=debug",
        ])
        .unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("ganttline_core=debug"));
    }

    #[test]
    fn test_cli_log_level_parsing() {
        let cli = Cli::try_parse_from(["ganttline", "--level", "debug", "palettes"]).unwrap();
        assert_eq!(cli.level, LogLevel::Debug);

        let cli = Cli::try_parse_from(["ganttline", "-L", "error", "palettes"]).unwrap();
        assert_eq!(cli.level, LogLevel::Error);

        let cli = Cli::try_parse_from(["ganttline", "palettes", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, TracingFormat::Json);
    }

    #[test]
    fn test_transform_args() {
        let cli = Cli::try_parse_from([
            "ganttline",
            "transform",
            "--records",
            "tasks.json",
            "--id-column",
            "id",
            "--tooltip-column",
            "owner",
            "--tooltip-column",
            "team",
            "--sort-by",
            "start-asc",
            "--palette",
            "dark",
            "--duplicate-ids",
            "skip",
            "--reference-date",
            "2024-03-01",
        ])
        .unwrap();

        let Commands::Transform(args) = cli.command else {
            panic!("Expected Transform command");
        };
        assert_eq!(args.records, PathBuf::from("tasks.json"));
        assert_eq!(args.id_column.as_deref(), Some("id"));
        assert_eq!(args.tooltip_columns, ["owner", "team"]);
        assert_eq!(args.sort_by, Some(SortCriterion::StartAsc));
        assert_eq!(args.palette, Some(PaletteName::Dark));
        assert_eq!(args.duplicate_ids, Some(DuplicateIdHandling::Skip));
        assert_eq!(args.reference_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_today_conflicts_with_reference_date() {
        let result = Cli::try_parse_from([
            "ganttline",
            "transform",
            "-r",
            "tasks.json",
            "--today",
            "--reference-date",
            "2024-03-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_sort_rejected() {
        let result = Cli::try_parse_from([
            "ganttline",
            "transform",
            "-r",
            "tasks.json",
            "--sort-by",
            "sideways",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_error_types() {
        let config_err = CliError::config("bad flag");
        assert_eq!(exit_code_for(&config_err), EXIT_CLI);
        assert_eq!(config_err.code(), "config");

        let input_err = CliError::input_with_help("unreadable", "check the path");
        assert_eq!(exit_code_for(&input_err), EXIT_CLI);
        assert_eq!(input_err.message(), "unreadable");

        let transform_err = CliError::from(ganttline_core::Error::EmptyDataset);
        assert_eq!(exit_code_for(&transform_err), EXIT_TRANSFORM);
        assert_eq!(transform_err.code(), "EMPTY_DATASET");

        let other_err = CliError::other("serialization failed");
        assert_eq!(exit_code_for(&other_err), EXIT_TRANSFORM);
        assert_eq!(other_err.code(), "other");
    }

    #[test]
    fn test_invalid_configuration_maps_to_config() {
        let err = CliError::from(ganttline_core::Error::invalid_configuration("idColumn is empty"));
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.message(), "idColumn is empty");
    }

    #[test]
    fn test_error_body_carries_details() {
        let err = CliError::from(ganttline_core::Error::ColumnNotFound {
            missing: vec!["start".to_string()],
            available: vec!["id".to_string(), "begin".to_string()],
        });
        let body = ErrorBody::from(&err);
        assert_eq!(body.code, "COLUMN_NOT_FOUND");
        assert_eq!(body.details["availableColumns"][1], "begin");

        let json = serde_json::to_value(ErrorEnvelope::new(body)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["code"], "COLUMN_NOT_FOUND");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(EXIT_CLI, 2);
        assert_eq!(EXIT_TRANSFORM, 3);
    }
}
