//! Topological ordering for dependency graphs.

use crate::{DependencyGraph, Error, Result, TaskNodeData};
use petgraph::stable_graph::NodeIndex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Input positions of tasks, ordered so that every task comes after all of
/// its prerequisites.
pub type TopologicalOrder = Vec<usize>;

impl DependencyGraph {
    /// Order tasks with Kahn's algorithm.
    ///
    /// Among the tasks whose prerequisites are all placed, the one that came
    /// first in the input is placed next, so independent tasks keep their
    /// relative input order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] if some tasks could not be placed
    /// because the graph still contains a cycle.
    pub fn topological_order(&self) -> Result<TopologicalOrder> {
        let count = self.task_count();
        let mut remaining: Vec<usize> = (0..count)
            .map(|i| self.prerequisite_count(NodeIndex::new(i)))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|(_, pending)| **pending == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(count);
        while let Some(Reverse(position)) = ready.pop() {
            order.push(position);
            for dependent in self.dependents(NodeIndex::new(position)) {
                let pending = &mut remaining[dependent.index()];
                *pending -= 1;
                if *pending == 0 {
                    ready.push(Reverse(dependent.index()));
                }
            }
        }

        if order.len() < count {
            return Err(Error::CycleDetected {
                message: format!(
                    "{} of {count} tasks could not be ordered",
                    count - order.len()
                ),
            });
        }

        Ok(order)
    }
}

/// Topological order of a task slice.
///
/// References to tasks outside the slice are ignored, which lets callers
/// order a subset (such as one group) of a validated list.
///
/// # Errors
///
/// Returns [`Error::CycleDetected`] if the dependencies in `tasks` form a cycle.
pub fn topological_order<T: TaskNodeData>(tasks: &[T]) -> Result<TopologicalOrder> {
    DependencyGraph::from_tasks(tasks).topological_order()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct TestTask {
        id: String,
        depends_on: Vec<String>,
    }

    impl TaskNodeData for TestTask {
        fn task_id(&self) -> &str {
            &self.id
        }

        fn depends_on(&self) -> &[String] {
            &self.depends_on
        }

        fn depends_on_mut(&mut self) -> &mut Vec<String> {
            &mut self.depends_on
        }
    }

    fn task(id: &str, deps: &[&str]) -> TestTask {
        TestTask {
            id: id.to_string(),
            depends_on: deps.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_order() {
        let order = topological_order::<TestTask>(&[]).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_independent_tasks_keep_input_order() {
        let tasks = vec![task("c", &[]), task("a", &[]), task("b", &[])];
        assert_eq!(topological_order(&tasks).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_prerequisites_come_first() {
        let tasks = vec![
            task("deploy", &["test", "build"]),
            task("test", &["build"]),
            task("build", &[]),
        ];
        assert_eq!(topological_order(&tasks).unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_tie_break_prefers_earlier_input() {
        // y and x both become ready after root; y comes first in the input.
        let tasks = vec![
            task("y", &["root"]),
            task("root", &[]),
            task("x", &["root"]),
        ];
        assert_eq!(topological_order(&tasks).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn test_references_outside_slice_ignored() {
        let tasks = vec![task("a", &["elsewhere"]), task("b", &["a"])];
        assert_eq!(topological_order(&tasks).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_cycle_reported() {
        let tasks = vec![task("a", &["b"]), task("b", &["a"]), task("c", &[])];
        let err = topological_order(&tasks).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
        assert!(err.to_string().contains("2 of 3"));
    }
}
