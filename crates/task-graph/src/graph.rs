//! Dependency graph builder using petgraph.
//!
//! Nodes are added in input order, so the node index of a task equals its
//! position in the slice the graph was built from. Edges point from a
//! dependent task to its prerequisite.

use crate::{Error, Result, TaskNodeData};
use petgraph::algo::is_cyclic_directed;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::debug;

/// An edge removed to break a dependency cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenCycle {
    /// Task identifiers along the cycle, starting and ending at the same task.
    pub cycle: Vec<String>,
    /// Input position of the task whose dependency was removed.
    pub dependent_index: usize,
    /// Identifier of the task whose dependency was removed.
    pub dependent: String,
    /// Identifier of the prerequisite that was dropped.
    pub prerequisite: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// A single frame of the iterative depth-first search.
struct Frame {
    node: NodeIndex,
    prerequisites: Vec<NodeIndex>,
    cursor: usize,
}

/// Dependency graph over a task list.
///
/// The graph holds identifiers only; the tasks themselves stay with the
/// caller. Build it with [`DependencyGraph::from_tasks`].
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Directed graph, one node per task, edges dependent -> prerequisite.
    graph: StableDiGraph<String, ()>,
    /// Map from task identifiers to node indices (first occurrence wins).
    id_to_node: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for a task list.
    ///
    /// References to identifiers that are not in the list are ignored, and
    /// repeated references to the same prerequisite collapse into one edge.
    #[must_use]
    pub fn from_tasks<T: TaskNodeData>(tasks: &[T]) -> Self {
        let mut graph = Self::new();

        for task in tasks {
            let node = graph.graph.add_node(task.task_id().to_string());
            graph
                .id_to_node
                .entry(task.task_id().to_string())
                .or_insert(node);
        }

        for (position, task) in tasks.iter().enumerate() {
            let from = NodeIndex::new(position);
            for dep in task.depends_on() {
                if let Some(&to) = graph.id_to_node.get(dep) {
                    graph.graph.update_edge(from, to, ());
                }
            }
        }

        debug!(
            tasks = graph.task_count(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );

        graph
    }

    /// Get the number of tasks in the graph.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a task exists in the graph.
    #[must_use]
    pub fn contains_task(&self, id: &str) -> bool {
        self.id_to_node.contains_key(id)
    }

    /// Identifiers of the prerequisites of `id`, in the order they were declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTask`] if `id` is not in the graph.
    pub fn prerequisites_of(&self, id: &str) -> Result<Vec<&str>> {
        let node = self
            .id_to_node
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownTask { id: id.to_string() })?;

        Ok(self
            .prerequisites(node)
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect())
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Outgoing neighbours of `node` in edge insertion order.
    ///
    /// petgraph yields adjacency in reverse insertion order, so edges are
    /// re-sorted by index. Edge indices only stay ordered because no edge is
    /// added after the first removal.
    pub(crate) fn prerequisites(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges(node)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Tasks that directly depend on `node`.
    pub(crate) fn dependents(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
    }

    /// Number of prerequisites of `node`.
    pub(crate) fn prerequisite_count(&self, node: NodeIndex) -> usize {
        self.graph.edges(node).count()
    }

    /// Remove every back edge found by a three-colour depth-first search.
    ///
    /// Roots are visited in input order and prerequisites in declaration
    /// order, so the edges chosen for removal are deterministic. Each task is
    /// finished exactly once, which keeps the search at O(V + E). Once the
    /// search completes no back edge remains, so the graph is acyclic.
    pub fn break_cycles(&mut self) -> Vec<BrokenCycle> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];
        let mut broken = Vec::new();
        let roots: Vec<NodeIndex> = self.graph.node_indices().collect();

        for root in roots {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }

            marks[root.index()] = Mark::OnPath;
            let mut stack = vec![Frame {
                node: root,
                prerequisites: self.prerequisites(root),
                cursor: 0,
            }];

            loop {
                let Some(frame) = stack.last_mut() else {
                    break;
                };

                let Some(&next) = frame.prerequisites.get(frame.cursor) else {
                    marks[frame.node.index()] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.cursor += 1;
                let node = frame.node;

                match marks[next.index()] {
                    Mark::Unvisited => {
                        marks[next.index()] = Mark::OnPath;
                        stack.push(Frame {
                            node: next,
                            prerequisites: self.prerequisites(next),
                            cursor: 0,
                        });
                    }
                    Mark::OnPath => {
                        let start = stack.iter().position(|f| f.node == next).unwrap_or(0);
                        let mut cycle: Vec<String> = stack[start..]
                            .iter()
                            .map(|f| self.graph[f.node].clone())
                            .collect();
                        cycle.push(self.graph[next].clone());

                        if let Some(edge) = self.graph.find_edge(node, next) {
                            self.graph.remove_edge(edge);
                        }

                        debug!(
                            dependent = %self.graph[node],
                            prerequisite = %self.graph[next],
                            "Removed back edge"
                        );

                        broken.push(BrokenCycle {
                            cycle,
                            dependent_index: node.index(),
                            dependent: self.graph[node].clone(),
                            prerequisite: self.graph[next].clone(),
                        });
                    }
                    Mark::Done => {}
                }
            }
        }

        broken
    }
}
