//! `ganttline transform`: run one transformation and print the envelope.

use super::render_ok;
use crate::cli::{CliError, TransformArgs};
use crate::input::{load_config, load_records};
use chrono::{Local, NaiveDate};
use ganttline_core::{TaskTransformer, TaskTransformerConfig};
use tracing::{info, instrument};

/// Build the transformer configuration from `--config` and the flags.
///
/// Flags win over the file. Without a file, the three required column
/// flags must all be given. `today` supplies the date for `--today`.
///
/// # Errors
///
/// Returns a configuration error when the file cannot be loaded or a
/// required column is not named anywhere.
pub fn build_config(
    args: &TransformArgs,
    today: impl FnOnce() -> NaiveDate,
) -> Result<TaskTransformerConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => required_from_flags(args)?,
    };

    if let Some(column) = &args.id_column {
        config.id_column.clone_from(column);
    }
    if let Some(column) = &args.start_column {
        config.start_column.clone_from(column);
    }
    if let Some(column) = &args.end_column {
        config.end_column.clone_from(column);
    }
    if let Some(column) = &args.name_column {
        config = config.with_name_column(column);
    }
    if let Some(column) = &args.progress_column {
        config = config.with_progress_column(column);
    }
    if let Some(column) = &args.dependencies_column {
        config = config.with_dependencies_column(column);
    }
    if let Some(column) = &args.color_column {
        config = config.with_color_column(column);
    }
    if !args.custom_colors.is_empty() {
        config = config.with_custom_colors(&args.custom_colors);
    }
    if let Some(palette) = args.palette {
        config = config.with_palette(palette);
    }
    if !args.tooltip_columns.is_empty() {
        config = config.with_tooltip_columns(&args.tooltip_columns);
    }
    if !args.group_by.is_empty() {
        config = config.with_group_by(&args.group_by);
    }
    if let Some(sort_by) = args.sort_by {
        config = config.with_sort_by(sort_by);
    }
    if let Some(max_tasks) = args.max_tasks {
        config = config.with_max_tasks(max_tasks);
    }
    if let Some(handling) = args.duplicate_ids {
        config = config.with_duplicate_id_handling(handling);
    }
    if let Some(date) = args.reference_date {
        config = config.with_reference_date(date);
    } else if args.today {
        config = config.with_reference_date(today());
    }

    Ok(config)
}

fn required_from_flags(args: &TransformArgs) -> Result<TaskTransformerConfig, CliError> {
    match (&args.id_column, &args.start_column, &args.end_column) {
        (Some(id), Some(start), Some(end)) => Ok(TaskTransformerConfig::new(id, start, end)),
        _ => {
            let missing: Vec<&str> = [
                ("--id-column", &args.id_column),
                ("--start-column", &args.start_column),
                ("--end-column", &args.end_column),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(flag, _)| flag)
            .collect();

            Err(CliError::config_with_help(
                format!("Missing required column flags: {}", missing.join(", ")),
                "Pass the column flags or a --config file naming idColumn, startColumn and endColumn",
            ))
        }
    }
}

/// Execute the transform command.
///
/// # Errors
///
/// Returns a configuration or input error before the transformation starts,
/// or the transformation's own error if it aborts.
#[instrument(skip_all, fields(records = %args.records.display()))]
pub fn execute_transform(args: &TransformArgs) -> Result<String, CliError> {
    let config = build_config(args, || Local::now().date_naive())?;
    let records = load_records(&args.records)?;

    let output = TaskTransformer::new(config).transform(&records)?;
    info!(
        tasks = output.tasks.len(),
        warnings = output.metadata.warnings.len(),
        "Transform command finished"
    );

    render_ok(&output, args.pretty)
}
