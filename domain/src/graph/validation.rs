//! Structural validation of execution graphs.
//!
//! Deserialization already enforces field presence and enum membership; this
//! module enforces the invariants serde cannot see. Validation is a hard
//! correctness gate: a graph that fails here must never reach the coordinator.

use crate::graph::entities::{ExecutionGraph, InformationNode};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Structural errors in a decomposed execution graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no information needs")]
    Empty,

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("node {node} depends on unknown node {dependency}")]
    UnknownDependency { node: String, dependency: String },

    #[error("node {node} declares type {node_type} but strategy method {method}")]
    InconsistentStrategy {
        node: String,
        node_type: String,
        method: String,
    },

    #[error("dependency cycle involving nodes: {0}")]
    Cycle(String),

    #[error("node {node} (group {group}) depends on {dependency} in group {dependency_group}")]
    GroupOrderViolation {
        node: String,
        group: u32,
        dependency: String,
        dependency_group: u32,
    },
}

impl ExecutionGraph {
    /// Validate all structural invariants.
    ///
    /// Checks, in order: non-emptiness, id uniqueness, dependency existence,
    /// type/method agreement, group ordering (a dependency must live in a
    /// strictly earlier `parallel_group`), and acyclicity via Kahn's
    /// algorithm. The group-ordering check subsumes most cycles, but
    /// same-group self-references still need the topological pass.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.information_needs.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut ids = HashSet::new();
        for node in &self.information_needs {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
        }

        let by_id: HashMap<&str, &InformationNode> = self
            .information_needs
            .iter()
            .map(|n| (n.id.as_str(), n))
            .collect();

        for node in &self.information_needs {
            if node.node_type != node.strategy.method {
                return Err(GraphError::InconsistentStrategy {
                    node: node.id.clone(),
                    node_type: node.node_type.to_string(),
                    method: node.strategy.method.to_string(),
                });
            }
            for dep in &node.depends_on {
                let Some(target) = by_id.get(dep.as_str()) else {
                    return Err(GraphError::UnknownDependency {
                        node: node.id.clone(),
                        dependency: dep.clone(),
                    });
                };
                if target.parallel_group >= node.parallel_group {
                    return Err(GraphError::GroupOrderViolation {
                        node: node.id.clone(),
                        group: node.parallel_group,
                        dependency: dep.clone(),
                        dependency_group: target.parallel_group,
                    });
                }
            }
        }

        self.check_acyclic()
    }

    /// Kahn's algorithm over the `depends_on` edges.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for node in &self.information_needs {
            in_degree.entry(node.id.as_str()).or_insert(0);
            for dep in &node.depends_on {
                *in_degree.entry(node.id.as_str()).or_insert(0) += 1;
                dependents
                    .entry(dep.as_str())
                    .or_default()
                    .push(node.id.as_str());
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0usize;

        while let Some(id) = queue.pop_front() {
            visited += 1;
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        if visited == self.information_needs.len() {
            Ok(())
        } else {
            let mut remaining: Vec<&str> = in_degree
                .iter()
                .filter(|(_, d)| **d > 0)
                .map(|(id, _)| *id)
                .collect();
            remaining.sort_unstable();
            Err(GraphError::Cycle(remaining.join(", ")))
        }
    }
}
