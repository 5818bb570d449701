//! Render-ready timeline tasks.

use crate::date::duration_days;
use crate::record::CellValue;
use chrono::NaiveDate;
use ganttline_task_graph::TaskNodeData;
use indexmap::IndexMap;
use serde::Serialize;

/// Progress at which a task counts as complete.
pub const COMPLETE_PROGRESS: u8 = 100;

/// One bar on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier within the output
    pub id: String,
    /// Identifier as written in the source
    pub display_id: String,
    /// Display name, never empty
    pub name: String,
    /// First day, inclusive
    pub start: NaiveDate,
    /// Last day, inclusive; never before `start`
    pub end: NaiveDate,
    /// Completion percentage, 0-100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Linear progress expected at the reference date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_progress: Option<f64>,
    /// Progress is 100
    pub is_complete: bool,
    /// Identifiers of prerequisite tasks
    pub dependencies: Vec<String>,
    /// Names of prerequisite tasks, comma separated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_dependencies: Option<String>,
    /// Palette class for the bar
    pub color_class: String,
    /// Extra columns shown in the tooltip, in configured order
    pub tooltip_fields: IndexMap<String, CellValue>,
    /// Value of each grouping column; present only when grouping is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_values: Option<IndexMap<String, Option<String>>>,
    /// Zero-based input row the task came from
    #[serde(skip)]
    pub row_index: usize,
}

impl Task {
    /// Days from start to end.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        duration_days(self.start, self.end)
    }

    /// Value of a grouping column, `None` when null, blank or not grouped.
    #[must_use]
    pub fn group_value(&self, column: &str) -> Option<&str> {
        self.group_values
            .as_ref()?
            .get(column)?
            .as_deref()
            .filter(|v| !v.is_empty())
    }
}

impl TaskNodeData for Task {
    fn task_id(&self) -> &str {
        &self.id
    }

    fn depends_on(&self) -> &[String] {
        &self.dependencies
    }

    fn depends_on_mut(&mut self) -> &mut Vec<String> {
        &mut self.dependencies
    }
}

/// Default colour class for a task when no colour column is configured.
///
/// Tasks are bucketed by progress: `0`, `1` (started), `25`, `50`, `75`
/// and `100`.
#[must_use]
pub fn progress_tier_class(progress: Option<u8>) -> String {
    let tier = match progress.unwrap_or(0) {
        0 => 0,
        1..=24 => 1,
        25..=49 => 25,
        50..=74 => 50,
        75..=99 => 75,
        _ => 100,
    };
    format!("bar-default-tier-{tier}")
}

/// Percentage of `start..=end` elapsed at `today`.
///
/// `None` when `today` falls outside the span. A single-day span that
/// contains `today` is fully expected.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn expected_progress(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Option<f64> {
    if today < start || today > end {
        return None;
    }
    let total = duration_days(start, end);
    if total == 0 {
        return Some(100.0);
    }
    let elapsed = duration_days(start, today);
    Some((elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}
