//! Error types for task graph operations.

use thiserror::Error;

/// Result type for task graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during task graph operations.
///
/// Validation itself never fails: malformed references are repaired and
/// reported as warnings. These errors only surface from lower-level graph
/// queries that are called on graphs which were never validated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("Cycle detected in task graph: {message}")]
    CycleDetected {
        /// Human-readable description of the cycle.
        message: String,
    },

    /// A task identifier was not found in the graph.
    #[error("Task '{id}' is not part of the graph")]
    UnknownTask {
        /// The identifier that was looked up.
        id: String,
    },
}
