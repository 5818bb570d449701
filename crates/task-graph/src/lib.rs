//! Dependency graph algorithms for ganttline task lists.
//!
//! Tasks reference their prerequisites by identifier. Those references come
//! straight from user data, so they may point at tasks that do not exist, at
//! the task itself, or form loops. This crate repairs such lists rather than
//! rejecting them, and orders repaired lists so that prerequisites come first.
//!
//! # Key Types
//!
//! - [`TaskNodeData`]: Trait that task types implement to take part in validation
//! - [`DependencyGraph`]: petgraph-backed graph with cycle breaking and Kahn ordering
//! - [`ValidatedTasks`]: Output of [`validate_dependencies`], guaranteed acyclic
//!
//! # Example
//!
//! ```ignore
//! use ganttline_task_graph::{TaskNodeData, validate_dependencies};
//!
//! struct Row {
//!     id: String,
//!     depends_on: Vec<String>,
//! }
//!
//! impl TaskNodeData for Row {
//!     fn task_id(&self) -> &str {
//!         &self.id
//!     }
//!     fn depends_on(&self) -> &[String] {
//!         &self.depends_on
//!     }
//!     fn depends_on_mut(&mut self) -> &mut Vec<String> {
//!         &mut self.depends_on
//!     }
//! }
//!
//! let validated = validate_dependencies(rows);
//! for warning in &validated.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

mod error;
mod graph;
mod traversal;
mod validation;

pub use error::{Error, Result};
pub use graph::{BrokenCycle, DependencyGraph};
pub use traversal::{TopologicalOrder, topological_order};
pub use validation::{
    DependencyStats, DependencyWarning, ValidatedTasks, prune_references, validate_dependencies,
};

/// Trait for task data that can take part in dependency validation.
///
/// Dependencies are stored by value as identifiers of other tasks. The
/// validator only ever removes entries from the list returned by
/// [`TaskNodeData::depends_on_mut`]; it never adds or reorders them.
pub trait TaskNodeData {
    /// Returns the identifier other tasks use to reference this one.
    fn task_id(&self) -> &str;

    /// Returns the identifiers of the tasks this task depends on.
    fn depends_on(&self) -> &[String];

    /// Mutable access to the dependency list, used to drop invalid edges.
    fn depends_on_mut(&mut self) -> &mut Vec<String>;
}
