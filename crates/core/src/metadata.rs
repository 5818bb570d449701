//! Diagnostics accumulated during a transformation.

use ganttline_task_graph::DependencyStats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a row did not become a displayed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Start or end did not parse
    InvalidDates,
    /// Start is after end
    StartAfterEnd,
    /// Identifier already used, in skip mode
    DuplicateId,
    /// Cut by the task cap
    MaxTasksExceeded,
}

impl SkipReason {
    /// Wire form of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidDates => "invalid_dates",
            Self::StartAfterEnd => "start_after_end",
            Self::DuplicateId => "duplicate_id",
            Self::MaxTasksExceeded => "max_tasks_exceeded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one occurrence of a repeated identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    /// First occurrence, identifier unchanged
    Kept,
    /// Later occurrence given a suffixed identifier
    Renamed,
    /// Later occurrence dropped
    Skipped,
}

/// One row carrying a repeated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateOccurrence {
    /// Zero-based input row
    pub row_index: usize,
    /// Identifier the row ended up with; absent for skipped rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<String>,
    /// Outcome for this row
    pub status: OccurrenceStatus,
}

/// Every occurrence of an input identifier that appeared more than once or
/// collided with an identifier generated by a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateId {
    /// Identifier as it appeared in the input (after normalisation)
    pub original_id: String,
    /// Occurrences in row order
    pub occurrences: Vec<DuplicateOccurrence>,
}

/// Dependency edge counts after validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySummary {
    /// Tasks with at least one prerequisite
    pub tasks_with_dependencies: usize,
    /// Total prerequisite references
    pub dependency_edges: usize,
    /// Longest prerequisite list
    pub max_dependencies_per_task: usize,
}

impl From<DependencyStats> for DependencySummary {
    fn from(stats: DependencyStats) -> Self {
        Self {
            tasks_with_dependencies: stats.tasks_with_dependencies,
            dependency_edges: stats.dependency_edges,
            max_dependencies_per_task: stats.max_dependencies_per_task,
        }
    }
}

/// Counts, reasons and warnings for one transformation.
///
/// `total_rows == displayed_rows + skipped_rows` and the skip reason counts
/// sum to `skipped_rows` once [`ValidationMetadata::finish`] has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetadata {
    /// Rows in the input
    pub total_rows: usize,
    /// Tasks in the output
    pub displayed_rows: usize,
    /// Rows that did not become displayed tasks
    pub skipped_rows: usize,
    /// Skipped rows by reason
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    /// Human-readable notices, in the order they were raised
    pub warnings: Vec<String>,
    /// Identifiers seen more than once
    pub duplicate_ids: Vec<DuplicateId>,
    /// Edge counts after dependency repair
    pub dependency_stats: DependencySummary,
}

impl ValidationMetadata {
    /// Empty metadata for `total_rows` input rows.
    #[must_use]
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    /// Count `count` rows skipped for `reason`.
    pub fn record_skips(&mut self, reason: SkipReason, count: usize) {
        if count > 0 {
            *self.skip_reasons.entry(reason).or_default() += count;
        }
    }

    /// Count one row skipped for `reason`.
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.record_skips(reason, 1);
    }

    /// Append a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Number of rows skipped for `reason`.
    #[must_use]
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skip_reasons.get(&reason).copied().unwrap_or(0)
    }

    /// Fix the displayed and skipped counts.
    pub fn finish(&mut self, displayed_rows: usize) {
        self.displayed_rows = displayed_rows;
        self.skipped_rows = self.total_rows.saturating_sub(displayed_rows);
        debug_assert_eq!(
            self.skip_reasons.values().sum::<usize>(),
            self.skipped_rows,
            "skip reasons must account for every skipped row"
        );
    }

    /// Whether the row counts add up.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.total_rows == self.displayed_rows + self.skipped_rows
            && self.skip_reasons.values().sum::<usize>() == self.skipped_rows
    }
}
