//! Task ordering: single-criterion sorts and hierarchical grouping.
//!
//! Every sort is stable. Descending sorts compare in reverse rather than
//! reversing the result, so tasks with equal keys keep their input order in
//! both directions.

use crate::task::Task;
use ganttline_task_graph::topological_order;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How to order tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// Keep input order
    #[default]
    None,
    /// Earliest start first
    StartAsc,
    /// Latest start first
    StartDesc,
    /// Earliest end first
    EndAsc,
    /// Latest end first
    EndDesc,
    /// Case-insensitive name, A to Z
    NameAsc,
    /// Case-insensitive name, Z to A
    NameDesc,
    /// Shortest span first
    DurationAsc,
    /// Longest span first
    DurationDesc,
    /// Every task after its prerequisites
    #[serde(alias = "dependency_topological", alias = "topological")]
    Dependencies,
}

impl SortCriterion {
    /// Every criterion, in documentation order.
    pub const ALL: [Self; 10] = [
        Self::None,
        Self::StartAsc,
        Self::StartDesc,
        Self::EndAsc,
        Self::EndDesc,
        Self::NameAsc,
        Self::NameDesc,
        Self::DurationAsc,
        Self::DurationDesc,
        Self::Dependencies,
    ];

    /// Wire form of the criterion.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::StartAsc => "start_asc",
            Self::StartDesc => "start_desc",
            Self::EndAsc => "end_asc",
            Self::EndDesc => "end_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::DurationAsc => "duration_asc",
            Self::DurationDesc => "duration_desc",
            Self::Dependencies => "dependencies",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if matches!(normalized.as_str(), "dependency_topological" | "topological") {
            return Ok(Self::Dependencies);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                let expected: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("Invalid sort: {s}. Expected one of: {}", expected.join(", "))
            })
    }
}

/// Order `tasks` by a single criterion.
///
/// For [`SortCriterion::Dependencies`] the tasks are placed in topological
/// order, ties broken by input position. References to tasks outside
/// `tasks` are ignored. If the dependencies still contain a cycle the input
/// order is kept.
#[must_use]
pub fn sort_tasks(mut tasks: Vec<Task>, criterion: SortCriterion) -> Vec<Task> {
    if tasks.len() < 2 {
        return tasks;
    }

    debug!(count = tasks.len(), criterion = %criterion, "Sorting tasks");

    match criterion {
        SortCriterion::None => {}
        SortCriterion::StartAsc => tasks.sort_by_key(|t| t.start),
        SortCriterion::StartDesc => tasks.sort_by_key(|t| Reverse(t.start)),
        SortCriterion::EndAsc => tasks.sort_by_key(|t| t.end),
        SortCriterion::EndDesc => tasks.sort_by_key(|t| Reverse(t.end)),
        SortCriterion::NameAsc => tasks.sort_by_cached_key(|t| t.name.to_lowercase()),
        SortCriterion::NameDesc => tasks.sort_by_cached_key(|t| Reverse(t.name.to_lowercase())),
        SortCriterion::DurationAsc => tasks.sort_by_key(Task::duration_days),
        SortCriterion::DurationDesc => tasks.sort_by_key(|t| Reverse(t.duration_days())),
        SortCriterion::Dependencies => return dependency_order(tasks),
    }

    tasks
}

fn dependency_order(tasks: Vec<Task>) -> Vec<Task> {
    let order = match topological_order(&tasks) {
        Ok(order) => order,
        Err(e) => {
            warn!(error = %e, "Topological sort incomplete, keeping input order");
            return tasks;
        }
    };

    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|position| slots.get_mut(position).and_then(Option::take))
        .collect()
}

/// Partition by each grouping column in turn, then sort each leaf group.
///
/// Named groups come in ascending lexicographic order; tasks with a null or
/// empty value form a final group after them. The result is the leaf groups
/// concatenated in group order. No task is added or removed.
#[must_use]
pub fn group_and_sort(tasks: Vec<Task>, group_columns: &[String], criterion: SortCriterion) -> Vec<Task> {
    let Some((column, rest)) = group_columns.split_first() else {
        return sort_tasks(tasks, criterion);
    };

    let total = tasks.len();
    let mut named: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    let mut unnamed: Vec<Task> = Vec::new();
    for task in tasks {
        match task.group_value(column).map(ToString::to_string) {
            Some(key) => named.entry(key).or_default().push(task),
            None => unnamed.push(task),
        }
    }

    debug!(
        column = %column,
        groups = named.len(),
        ungrouped = unnamed.len(),
        "Grouped tasks"
    );

    let mut ordered = Vec::with_capacity(total);
    for bucket in named.into_values() {
        ordered.extend(group_and_sort(bucket, rest, criterion));
    }
    if !unnamed.is_empty() {
        ordered.extend(group_and_sort(unnamed, rest, criterion));
    }
    ordered
}
