//! The transformation pipeline.
//!
//! [`TaskTransformer::transform`] turns a [`RecordSet`] into render-ready
//! tasks in one pass:
//!
//! 1. check the configuration and the record schema
//! 2. build the colour mapping from every row
//! 3. extract one task per valid row and de-duplicate identifiers
//! 4. repair dependencies (dangling references, self references, cycles)
//! 5. sort, optionally within groups
//! 6. resolve dependency names and apply the task cap
//!
//! Row-level problems are counted in [`ValidationMetadata`]; only the
//! conditions in [`Error`] abort the pipeline.

mod ids;
mod row;

pub use ids::normalize_id;
pub use row::{extract_progress, split_dependencies, tooltip_value};

use crate::color::{ColorMapping, Palette, create_mapping};
use crate::config::TaskTransformerConfig;
use crate::error::{Error, Result};
use crate::metadata::{SkipReason, ValidationMetadata};
use crate::record::RecordSet;
use crate::sort::{group_and_sort, sort_tasks};
use crate::task::Task;
use ganttline_task_graph::validate_dependencies;
use ids::{Assignment, IdRegistry};
use row::RowExtractor;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// Result of a successful transformation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    /// Tasks in display order
    pub tasks: Vec<Task>,
    /// What was skipped, repaired or warned about
    pub metadata: ValidationMetadata,
    /// Category to class; empty without a colour column
    pub color_mapping: ColorMapping,
    /// Class to hex colour, for the custom palette only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_palette: Option<BTreeMap<String, String>>,
}

/// Stateless driver for one configuration.
///
/// A transformer may be reused; each call to [`transform`](Self::transform)
/// is independent.
#[derive(Debug, Clone)]
pub struct TaskTransformer {
    config: TaskTransformerConfig,
}

impl TaskTransformer {
    /// Create a transformer for `config`.
    #[must_use]
    pub const fn new(config: TaskTransformerConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &TaskTransformerConfig {
        &self.config
    }

    /// Transform `records` into tasks.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] if the configuration fails validation
    /// - [`Error::EmptyDataset`] if `records` has no rows
    /// - [`Error::ColumnNotFound`] if a required column is not in the schema
    /// - [`Error::NoValidTasks`] if every row was skipped
    #[instrument(skip_all, fields(rows = records.len()))]
    pub fn transform(&self, records: &RecordSet) -> Result<TransformOutput> {
        let config = &self.config;
        config.validate()?;
        self.check_schema(records)?;

        let mut metadata = ValidationMetadata::new(records.len());
        for column in config
            .optional_columns()
            .chain(config.tooltip_columns.iter().map(String::as_str))
            .filter(|c| !records.has_column(c))
        {
            warn!(column, "Optional column not found");
            metadata.warn(format!(
                "Optional column '{column}' not found. Its values are treated as empty."
            ));
        }

        let (color_mapping, custom_palette) = match config.color_column() {
            Some(column) => {
                let (palette, palette_warnings) =
                    Palette::resolve(config.color_palette, &config.custom_colors);
                metadata.warnings.extend(palette_warnings);
                let outcome = create_mapping(records, column, &palette);
                metadata.warnings.extend(outcome.warnings);
                (outcome.mapping, palette.custom_colors())
            }
            None => (ColorMapping::default(), None),
        };

        let extractor = RowExtractor::new(config, &color_mapping, |c| records.has_column(c));
        let mut registry = IdRegistry::new(config.duplicate_id_handling);
        let mut tasks: Vec<Task> = Vec::with_capacity(records.len());

        for (row_index, record) in records.rows().iter().enumerate() {
            let mut task = match extractor.extract(row_index, record) {
                Ok(task) => task,
                Err(reason) => {
                    metadata.record_skip(reason);
                    continue;
                }
            };

            match registry.assign(task.id.clone(), row_index) {
                Assignment::Unique(_) => {}
                Assignment::Renamed { original, assigned } => {
                    metadata.warn(format!(
                        "Duplicate task ID '{original}' in row {row_index}. Renamed to '{assigned}'."
                    ));
                    task.id = assigned;
                }
                Assignment::Skipped { original } => {
                    metadata.warn(format!(
                        "Duplicate task ID '{original}' in row {row_index}. Row skipped."
                    ));
                    metadata.record_skip(SkipReason::DuplicateId);
                    continue;
                }
            }

            tasks.push(task);
        }

        warn_ambiguous_references(&tasks, &registry, &mut metadata);
        metadata.duplicate_ids = registry.into_duplicates();

        if tasks.is_empty() {
            metadata.finish(0);
            warn!(
                skipped = metadata.skipped_rows,
                "No valid tasks after row filtering"
            );
            return Err(Error::NoValidTasks {
                metadata: Box::new(metadata),
            });
        }

        let validated = validate_dependencies(tasks);
        metadata
            .warnings
            .extend(validated.warnings.iter().map(ToString::to_string));
        metadata.dependency_stats = validated.stats.into();

        let mut tasks = if config.group_by_columns.is_empty() {
            sort_tasks(validated.tasks, config.sort_by)
        } else {
            group_and_sort(validated.tasks, &config.group_by_columns, config.sort_by)
        };

        resolve_display_dependencies(&mut tasks);

        if config.max_tasks > 0 && tasks.len() > config.max_tasks {
            let available = tasks.len();
            let truncated = available - config.max_tasks;
            tasks.truncate(config.max_tasks);
            metadata.record_skips(SkipReason::MaxTasksExceeded, truncated);
            metadata.warn(format!(
                "Dataset has {available} tasks. Displaying first {} due to maxTasks limit. Consider filtering the data or increasing maxTasks.",
                config.max_tasks
            ));
        }

        metadata.finish(tasks.len());
        info!(
            total = metadata.total_rows,
            displayed = metadata.displayed_rows,
            skipped = metadata.skipped_rows,
            warnings = metadata.warnings.len(),
            "Transformation completed"
        );

        Ok(TransformOutput {
            tasks,
            metadata,
            color_mapping,
            custom_palette,
        })
    }

    fn check_schema(&self, records: &RecordSet) -> Result<()> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let missing: Vec<String> = self
            .config
            .required_columns()
            .into_iter()
            .filter(|c| !records.has_column(c))
            .map(ToString::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::ColumnNotFound {
                missing,
                available: records.columns().to_vec(),
            })
        }
    }
}

/// Warn once per task reference that targets a repeated identifier.
fn warn_ambiguous_references(
    tasks: &[Task],
    registry: &IdRegistry,
    metadata: &mut ValidationMetadata,
) {
    for task in tasks {
        for dep in task.dependencies.iter().filter(|d| registry.has_duplicates(d)) {
            debug!(task = %task.id, dependency = %dep, "Ambiguous dependency reference");
            metadata.warn(format!(
                "Task '{}' depends on '{dep}' which has duplicates. The reference binds to the first occurrence.",
                task.id
            ));
        }
    }
}

fn resolve_display_dependencies(tasks: &mut [Task]) {
    let names: HashMap<String, String> = tasks
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();

    for task in tasks.iter_mut() {
        if task.dependencies.is_empty() {
            continue;
        }
        let resolved: Vec<&str> = task
            .dependencies
            .iter()
            .map(|dep| names.get(dep).map_or(dep.as_str(), String::as_str))
            .collect();
        task.display_dependencies = Some(resolved.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PaletteName;
    use crate::config::DuplicateIdHandling;
    use crate::error::ErrorCode;
    use crate::record::{CellValue, RawRecord};
    use crate::sort::SortCriterion;

    fn records(columns: &[&str], rows: &[&[CellValue]]) -> RecordSet {
        let columns: Vec<String> = columns.iter().map(ToString::to_string).collect();
        let rows = rows
            .iter()
            .map(|values| {
                columns
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect::<RawRecord>()
            })
            .collect();
        RecordSet::new(columns, rows)
    }

    fn transformer() -> TaskTransformer {
        TaskTransformer::new(TaskTransformerConfig::new("id", "start", "end"))
    }

    fn ids(output: &TransformOutput) -> Vec<&str> {
        output.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_empty_dataset() {
        let set = RecordSet::new(vec!["id".into(), "start".into(), "end".into()], vec![]);
        let err = transformer().transform(&set).unwrap_err();
        assert_eq!(err.code(), ErrorCode::EmptyDataset);
    }

    #[test]
    fn test_missing_required_columns() {
        let set = records(&["id", "begin"], &[&["a".into(), "2024-01-01".into()]]);
        match transformer().transform(&set).unwrap_err() {
            Error::ColumnNotFound { missing, available } => {
                assert_eq!(missing, ["start", "end"]);
                assert_eq!(available, ["id", "begin"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_config_checked_first() {
        let set = RecordSet::default();
        let err = TaskTransformer::new(TaskTransformerConfig::new("", "start", "end"))
            .transform(&set)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfiguration);
    }

    #[test]
    fn test_no_valid_tasks_carries_metadata() {
        let set = records(
            &["id", "start", "end"],
            &[
                &["a".into(), "bad".into(), "2024-01-01".into()],
                &["b".into(), "2024-02-01".into(), "2024-01-01".into()],
            ],
        );
        match transformer().transform(&set).unwrap_err() {
            Error::NoValidTasks { metadata } => {
                assert_eq!(metadata.total_rows, 2);
                assert_eq!(metadata.skipped_rows, 2);
                assert_eq!(metadata.skipped_for(SkipReason::InvalidDates), 1);
                assert_eq!(metadata.skipped_for(SkipReason::StartAfterEnd), 1);
                assert!(metadata.is_consistent());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dependencies_repaired_and_resolved() {
        let set = records(
            &["id", "name", "start", "end", "deps"],
            &[
                &["A".into(), "Alpha".into(), "2024-01-01".into(), "2024-01-02".into(), "B".into()],
                &["B".into(), "Beta".into(), "2024-01-01".into(), "2024-01-02".into(), "C, ghost".into()],
                &["C".into(), "Gamma".into(), "2024-01-01".into(), "2024-01-02".into(), "A".into()],
            ],
        );
        let config = TaskTransformerConfig::new("id", "start", "end")
            .with_name_column("name")
            .with_dependencies_column("deps");
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(output.metadata.dependency_stats.dependency_edges, 2);
        assert_eq!(output.metadata.warnings.len(), 2);
        assert!(output.metadata.warnings[0].contains("'ghost'"));
        assert!(output.metadata.warnings[1].starts_with("Circular dependency detected"));
        assert_eq!(output.tasks[0].display_dependencies.as_deref(), Some("Beta"));
        assert_eq!(output.tasks[2].display_dependencies, None);
    }

    #[test]
    fn test_duplicate_rename_and_ambiguity_warning() {
        let set = records(
            &["id", "start", "end", "deps"],
            &[
                &["X".into(), "2024-01-01".into(), "2024-01-02".into(), CellValue::Null],
                &["X".into(), "2024-01-01".into(), "2024-01-02".into(), CellValue::Null],
                &["Y".into(), "2024-01-01".into(), "2024-01-02".into(), "X".into()],
            ],
        );
        let config =
            TaskTransformerConfig::new("id", "start", "end").with_dependencies_column("deps");
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(ids(&output), ["X", "X_1", "Y"]);
        assert_eq!(output.metadata.duplicate_ids.len(), 1);
        assert!(output.metadata.warnings.iter().any(|w| w.contains("has duplicates")));
        assert_eq!(output.tasks[2].dependencies, ["X"]);
    }

    #[test]
    fn test_duplicate_skip_mode_counts_reason() {
        let set = records(
            &["id", "start", "end"],
            &[
                &["X".into(), "2024-01-01".into(), "2024-01-02".into()],
                &["X".into(), "2024-01-03".into(), "2024-01-04".into()],
            ],
        );
        let config = TaskTransformerConfig::new("id", "start", "end")
            .with_duplicate_id_handling(DuplicateIdHandling::Skip);
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(ids(&output), ["X"]);
        assert_eq!(output.metadata.skipped_for(SkipReason::DuplicateId), 1);
        assert!(output.metadata.is_consistent());
    }

    #[test]
    fn test_cap_applied_after_sort() {
        let set = records(
            &["id", "start", "end"],
            &[
                &["late".into(), "2024-03-01".into(), "2024-03-02".into()],
                &["early".into(), "2024-01-01".into(), "2024-01-02".into()],
                &["mid".into(), "2024-02-01".into(), "2024-02-02".into()],
            ],
        );
        let config = TaskTransformerConfig::new("id", "start", "end")
            .with_sort_by(SortCriterion::StartAsc)
            .with_max_tasks(2);
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(ids(&output), ["early", "mid"]);
        assert_eq!(output.metadata.skipped_for(SkipReason::MaxTasksExceeded), 1);
        assert_eq!(output.metadata.displayed_rows, 2);
        assert!(output.metadata.is_consistent());
    }

    #[test]
    fn test_zero_max_tasks_is_unlimited() {
        let rows: Vec<Vec<CellValue>> = (0..5)
            .map(|i| vec![format!("t{i}").into(), "2024-01-01".into(), "2024-01-02".into()])
            .collect();
        let row_refs: Vec<&[CellValue]> = rows.iter().map(Vec::as_slice).collect();
        let set = records(&["id", "start", "end"], &row_refs);
        let config = TaskTransformerConfig::new("id", "start", "end").with_max_tasks(0);
        let output = TaskTransformer::new(config).transform(&set).unwrap();
        assert_eq!(output.tasks.len(), 5);
    }

    #[test]
    fn test_color_mapping_uses_all_rows() {
        let set = records(
            &["id", "start", "end", "team"],
            &[
                &["a".into(), "bad".into(), "2024-01-02".into(), "Alpha".into()],
                &["b".into(), "2024-01-01".into(), "2024-01-02".into(), "Beta".into()],
            ],
        );
        let config = TaskTransformerConfig::new("id", "start", "end").with_color_column("team");
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(output.color_mapping.len(), 2);
        assert_eq!(output.tasks[0].color_class, "bar-green");
        assert!(output.custom_palette.is_none());
    }

    #[test]
    fn test_custom_palette_in_output() {
        let set = records(
            &["id", "start", "end", "team"],
            &[&["a".into(), "2024-01-01".into(), "2024-01-02".into(), "Alpha".into()]],
        );
        let config = TaskTransformerConfig::new("id", "start", "end")
            .with_color_column("team")
            .with_custom_colors(["#111", "#222", "#333", "#444", "#555", "#666"]);
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert_eq!(output.tasks[0].color_class, "bar-custom-0");
        assert_eq!(output.custom_palette.unwrap()["bar-custom-0"], "#111");
    }

    #[test]
    fn test_missing_optional_column_warns() {
        let set = records(
            &["id", "start", "end"],
            &[&["a".into(), "2024-01-01".into(), "2024-01-02".into()]],
        );
        let config = TaskTransformerConfig::new("id", "start", "end")
            .with_color_column("team")
            .with_palette(PaletteName::Dark);
        let output = TaskTransformer::new(config).transform(&set).unwrap();

        assert!(output.color_mapping.is_empty());
        assert_eq!(output.tasks[0].color_class, "bar-gray");
        assert!(output.metadata.warnings.iter().any(|w| w.contains("'team'")));
    }

    #[test]
    fn test_output_serialization() {
        let set = records(
            &["id", "start", "end"],
            &[&["a".into(), "2024-01-01".into(), "2024-01-02".into()]],
        );
        let output = transformer().transform(&set).unwrap();
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["tasks"][0]["id"], "a");
        assert_eq!(json["metadata"]["totalRows"], 1);
        assert!(json["colorMapping"].as_object().unwrap().is_empty());
        assert!(json.get("customPalette").is_none());
    }
}
