//! Dependency validation for task lists.
//!
//! Validation runs in two passes. The first drops references to unknown
//! tasks and self-references. The second breaks every remaining cycle by
//! removing the back edge found during a depth-first search. Neither pass
//! fails: every repair is reported as a [`DependencyWarning`].

use crate::{DependencyGraph, TaskNodeData};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// A repair made to a task's dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyWarning {
    /// The task listed itself as a prerequisite.
    SelfReference {
        /// The task that referenced itself.
        task: String,
    },

    /// The task referenced an identifier that no task carries.
    MissingReference {
        /// The task holding the reference.
        task: String,
        /// The identifier that could not be resolved.
        reference: String,
    },

    /// A cycle was broken by removing one edge.
    CycleBroken {
        /// Task identifiers along the cycle, first and last equal.
        cycle: Vec<String>,
        /// Task whose dependency was removed.
        dependent: String,
        /// The prerequisite that was removed.
        prerequisite: String,
    },
}

impl fmt::Display for DependencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference { task } => {
                write!(f, "Task '{task}' has self-dependency. Removed.")
            }
            Self::MissingReference { task, reference } => {
                write!(
                    f,
                    "Task '{task}' references non-existent task '{reference}'. Removed."
                )
            }
            Self::CycleBroken {
                cycle,
                dependent,
                prerequisite,
            } => {
                write!(
                    f,
                    "Circular dependency detected: {}. Removing edge {dependent} -> {prerequisite}.",
                    cycle.join(" -> ")
                )
            }
        }
    }
}

/// Summary of the dependency edges in a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyStats {
    /// Number of tasks examined.
    pub total_tasks: usize,
    /// Number of tasks with at least one dependency.
    pub tasks_with_dependencies: usize,
    /// Total number of dependency references.
    pub dependency_edges: usize,
    /// Largest dependency list on a single task.
    pub max_dependencies_per_task: usize,
}

impl DependencyStats {
    /// Count the dependency references of a task list.
    #[must_use]
    pub fn from_tasks<T: TaskNodeData>(tasks: &[T]) -> Self {
        tasks.iter().fold(
            Self {
                total_tasks: tasks.len(),
                ..Self::default()
            },
            |mut stats, task| {
                let count = task.depends_on().len();
                if count > 0 {
                    stats.tasks_with_dependencies += 1;
                    stats.dependency_edges += count;
                    stats.max_dependencies_per_task = stats.max_dependencies_per_task.max(count);
                }
                stats
            },
        )
    }
}

/// A task list whose dependency graph is guaranteed to be acyclic.
#[derive(Debug, Clone)]
pub struct ValidatedTasks<T> {
    /// The tasks, in their original order, with invalid edges removed.
    pub tasks: Vec<T>,
    /// Every repair that was made, in the order it was made.
    pub warnings: Vec<DependencyWarning>,
    /// Edge statistics after repair.
    pub stats: DependencyStats,
}

/// Drop self-references and references to identifiers not in `tasks`.
///
/// One warning is produced for each dropped reference.
pub fn prune_references<T: TaskNodeData>(tasks: &mut [T]) -> Vec<DependencyWarning> {
    let known: HashSet<String> = tasks.iter().map(|t| t.task_id().to_string()).collect();
    let mut warnings = Vec::new();

    for task in tasks.iter_mut() {
        if task.depends_on().is_empty() {
            continue;
        }

        let id = task.task_id().to_string();
        task.depends_on_mut().retain(|dep| {
            if *dep == id {
                warnings.push(DependencyWarning::SelfReference { task: id.clone() });
                false
            } else if known.contains(dep) {
                true
            } else {
                warnings.push(DependencyWarning::MissingReference {
                    task: id.clone(),
                    reference: dep.clone(),
                });
                false
            }
        });
    }

    if !warnings.is_empty() {
        debug!(count = warnings.len(), "Pruned invalid dependency references");
    }

    warnings
}

/// Validate and repair the dependency lists of `tasks`.
///
/// Takes ownership so callers never observe a half-repaired list: the
/// returned tasks are in input order, reference only tasks in the list, and
/// form an acyclic graph.
#[must_use]
pub fn validate_dependencies<T: TaskNodeData>(mut tasks: Vec<T>) -> ValidatedTasks<T> {
    let mut warnings = prune_references(&mut tasks);

    let mut graph = DependencyGraph::from_tasks(&tasks);
    let broken = graph.break_cycles();

    for cycle in broken {
        if let Some(task) = tasks.get_mut(cycle.dependent_index) {
            task.depends_on_mut()
                .retain(|dep| *dep != cycle.prerequisite);
        }
        warnings.push(DependencyWarning::CycleBroken {
            cycle: cycle.cycle,
            dependent: cycle.dependent,
            prerequisite: cycle.prerequisite,
        });
    }

    let cycles = warnings
        .iter()
        .filter(|w| matches!(w, DependencyWarning::CycleBroken { .. }))
        .count();
    info!(
        tasks = tasks.len(),
        cycles_broken = cycles,
        "Dependency validation completed"
    );

    let stats = DependencyStats::from_tasks(&tasks);
    ValidatedTasks {
        tasks,
        warnings,
        stats,
    }
}
