//! Per-row extraction: one raw record to one provisional task.

use super::ids::normalize_id;
use crate::color::ColorMapping;
use crate::config::TaskTransformerConfig;
use crate::date::parse_date;
use crate::metadata::SkipReason;
use crate::record::{CellValue, RawRecord, cell};
use crate::task::{COMPLETE_PROGRESS, Task, expected_progress, progress_tier_class};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Turns rows into tasks under one configuration.
pub struct RowExtractor<'a> {
    config: &'a TaskTransformerConfig,
    color_mapping: &'a ColorMapping,
    tooltip_columns: Vec<&'a str>,
}

impl<'a> RowExtractor<'a> {
    /// `available` lists the tooltip columns present in the record schema.
    pub fn new(
        config: &'a TaskTransformerConfig,
        color_mapping: &'a ColorMapping,
        available: impl Fn(&str) -> bool,
    ) -> Self {
        let tooltip_columns = config
            .tooltip_columns
            .iter()
            .map(String::as_str)
            .filter(|c| available(c))
            .collect();
        Self {
            config,
            color_mapping,
            tooltip_columns,
        }
    }

    /// Build the task for `row`, or the reason the row is skipped.
    ///
    /// The identifier is normalised but not yet de-duplicated.
    pub fn extract(&self, row_index: usize, row: &RawRecord) -> Result<Task, SkipReason> {
        let config = self.config;
        let start_cell = cell(row, &config.start_column);
        let end_cell = cell(row, &config.end_column);

        let (start, end) = match (parse_date(start_cell), parse_date(end_cell)) {
            (Ok(start), Ok(end)) => (start, end),
            (start, end) => {
                debug!(
                    row = row_index,
                    start_error = start.err().map(|e| e.code.as_str()),
                    end_error = end.err().map(|e| e.code.as_str()),
                    "Skipping row with invalid dates"
                );
                return Err(SkipReason::InvalidDates);
            }
        };

        if start > end {
            warn!(
                row = row_index,
                %start,
                %end,
                "Start date is after end date, skipping row"
            );
            return Err(SkipReason::StartAfterEnd);
        }

        let (id, display_id) = match cell(row, &config.id_column).non_blank_text() {
            Some(text) => (normalize_id(&text, config.css_safe_ids), text),
            None => {
                let generated = format!("task_{row_index}");
                (generated.clone(), generated)
            }
        };

        let name = match config.name_column() {
            Some(column) => cell(row, column)
                .non_blank_text()
                .unwrap_or_else(|| format!("Task {row_index}")),
            None => display_id.clone(),
        };

        let progress = config
            .progress_column()
            .and_then(|column| extract_progress(cell(row, column)));

        let dependencies = config
            .dependencies_column()
            .map(|column| split_dependencies(cell(row, column), config.css_safe_ids))
            .unwrap_or_default();

        let color_class = match config.color_column() {
            Some(column) => self.color_mapping.color_class(cell(row, column)).to_string(),
            None => progress_tier_class(progress),
        };

        let tooltip_fields = self
            .tooltip_columns
            .iter()
            .map(|column| ((*column).to_string(), tooltip_value(cell(row, column))))
            .collect();

        let group_values = (!config.group_by_columns.is_empty()).then(|| {
            config
                .group_by_columns
                .iter()
                .map(|column| (column.clone(), cell(row, column).non_blank_text()))
                .collect::<IndexMap<_, _>>()
        });

        Ok(Task {
            id,
            display_id,
            name,
            start,
            end,
            progress,
            expected_progress: config
                .reference_date
                .and_then(|today| expected_progress(start, end, today)),
            is_complete: progress == Some(COMPLETE_PROGRESS),
            dependencies,
            display_dependencies: None,
            color_class,
            tooltip_fields,
            group_values,
            row_index,
        })
    }
}

/// Completion percentage, clamped to 0-100 and truncated toward zero.
///
/// Non-numeric cells yield `None`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn extract_progress(value: &CellValue) -> Option<u8> {
    let number = match value {
        CellValue::Int(i) => Some((*i).clamp(0, 100) as f64),
        CellValue::Float(f) => Some(*f),
        CellValue::Str(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => Some(n.trunc().clamp(0.0, 100.0) as u8),
        _ => {
            if !value.is_null() {
                warn!(value = ?value, "Invalid progress value, omitting");
            }
            None
        }
    }
}

/// Split a comma-separated dependency cell into normalised identifiers.
///
/// Blank entries are dropped and repeats keep their first position.
pub fn split_dependencies(value: &CellValue, css_safe: bool) -> Vec<String> {
    let Some(text) = value.non_blank_text() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| normalize_id(part, css_safe))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Value shown in a tooltip: numbers stay numeric, dates are formatted,
/// text is trimmed.
pub fn tooltip_value(value: &CellValue) -> CellValue {
    match value {
        v if v.is_null() => CellValue::Null,
        CellValue::Str(s) => CellValue::Str(s.trim().to_string()),
        CellValue::Date(d) => CellValue::Str(d.format("%Y-%m-%d").to_string()),
        CellValue::DateTime(dt) => CellValue::Str(dt.format("%Y-%m-%d").to_string()),
        CellValue::Timestamp(ts) => CellValue::Str(ts.format("%Y-%m-%d").to_string()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(pairs: &[(&str, CellValue)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn config() -> TaskTransformerConfig {
        TaskTransformerConfig::new("id", "start", "end")
    }

    fn extract(config: &TaskTransformerConfig, record: &RawRecord) -> Result<Task, SkipReason> {
        let mapping = ColorMapping::default();
        RowExtractor::new(config, &mapping, |_| true).extract(3, record)
    }

    #[test]
    fn test_progress_clamps_and_truncates() {
        assert_eq!(extract_progress(&CellValue::Int(-10)), Some(0));
        assert_eq!(extract_progress(&CellValue::Int(150)), Some(100));
        assert_eq!(extract_progress(&CellValue::Float(99.9)), Some(99));
        assert_eq!(extract_progress(&" 42 ".into()), Some(42));
        assert_eq!(extract_progress(&"done".into()), None);
        assert_eq!(extract_progress(&CellValue::Null), None);
        assert_eq!(extract_progress(&CellValue::Float(f64::INFINITY)), None);
    }

    #[test]
    fn test_split_dependencies() {
        assert_eq!(
            split_dependencies(&"a, b,,c , a".into(), true),
            ["a", "b", "c"]
        );
        assert_eq!(split_dependencies(&"1.0, 2.0".into(), true), ["1", "2"]);
        assert_eq!(split_dependencies(&CellValue::Float(5.0), true), ["5"]);
        assert!(split_dependencies(&"  ".into(), true).is_empty());
        assert!(split_dependencies(&CellValue::Null, true).is_empty());
    }

    #[test]
    fn test_tooltip_values() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(tooltip_value(&date.into()), CellValue::from("2024-01-02"));
        assert_eq!(tooltip_value(&" x ".into()), CellValue::from("x"));
        assert_eq!(tooltip_value(&CellValue::Int(3)), CellValue::Int(3));
        assert_eq!(tooltip_value(&CellValue::Float(f64::NAN)), CellValue::Null);
    }

    #[test]
    fn test_invalid_dates_skip() {
        let record = row(&[("id", "a".into()), ("start", "nope".into()), ("end", "2024-01-01".into())]);
        assert_eq!(extract(&config(), &record), Err(SkipReason::InvalidDates));

        let record = row(&[("id", "a".into()), ("end", "2024-01-01".into())]);
        assert_eq!(extract(&config(), &record), Err(SkipReason::InvalidDates));
    }

    #[test]
    fn test_start_after_end_skip() {
        let record = row(&[
            ("id", "a".into()),
            ("start", "2024-01-10".into()),
            ("end", "2024-01-05".into()),
        ]);
        assert_eq!(extract(&config(), &record), Err(SkipReason::StartAfterEnd));
    }

    #[test]
    fn test_generated_id_and_name() {
        let record = row(&[
            ("id", "  ".into()),
            ("name", CellValue::Null),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-02".into()),
        ]);
        let task = extract(&config().with_name_column("name"), &record).unwrap();
        assert_eq!(task.id, "task_3");
        assert_eq!(task.display_id, "task_3");
        assert_eq!(task.name, "Task 3");
    }

    #[test]
    fn test_name_defaults_to_display_id() {
        let record = row(&[
            ("id", CellValue::Float(61.0)),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-02".into()),
        ]);
        let task = extract(&config(), &record).unwrap();
        assert_eq!(task.id, "61");
        assert_eq!(task.name, "61");
    }

    #[test]
    fn test_css_safe_id_keeps_display_form() {
        let record = row(&[
            ("id", "task 1".into()),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-02".into()),
        ]);
        let task = extract(&config(), &record).unwrap();
        assert_eq!(task.id, "task_x20_1");
        assert_eq!(task.display_id, "task 1");
    }

    #[test]
    fn test_tier_class_without_color_column() {
        let record = row(&[
            ("id", "a".into()),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-02".into()),
            ("pct", CellValue::Int(100)),
        ]);
        let task = extract(&config().with_progress_column("pct"), &record).unwrap();
        assert_eq!(task.color_class, "bar-default-tier-100");
        assert!(task.is_complete);
    }

    #[test]
    fn test_group_values_and_tooltips() {
        let record = row(&[
            ("id", "a".into()),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-02".into()),
            ("Region", " EMEA ".into()),
            ("Owner", "ann".into()),
        ]);
        let config = config()
            .with_group_by(["Region", "Team"])
            .with_tooltip_columns(["Owner"]);
        let task = extract(&config, &record).unwrap();

        let groups = task.group_values.as_ref().unwrap();
        assert_eq!(groups["Region"].as_deref(), Some("EMEA"));
        assert_eq!(groups["Team"], None);
        assert_eq!(task.tooltip_fields["Owner"], CellValue::from("ann"));
    }

    #[test]
    fn test_expected_progress_needs_reference_date() {
        let record = row(&[
            ("id", "a".into()),
            ("start", "2024-01-01".into()),
            ("end", "2024-01-11".into()),
        ]);
        assert_eq!(extract(&config(), &record).unwrap().expected_progress, None);

        let today = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let task = extract(&config().with_reference_date(today), &record).unwrap();
        assert_eq!(task.expected_progress, Some(50.0));
    }
}
