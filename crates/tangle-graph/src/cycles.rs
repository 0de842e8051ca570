//! Circular dependency detection.

use crate::index::AdjacencyIndex;
use petgraph::algo::tarjan_scc;
use serde::{Deserialize, Serialize};

/// A set of nodes that can all reach each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularDependency {
    /// Sorted ids of the members.
    pub nodes: Vec<String>,
}

impl CircularDependency {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl AdjacencyIndex {
    /// Strongly connected components that form cycles.
    ///
    /// A single node counts only when it imports itself.
    pub fn cycles(&self) -> Vec<CircularDependency> {
        let mut cycles: Vec<CircularDependency> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.has_edge(*single, *single),
                members => members.len() > 1,
            })
            .map(|component| {
                let mut nodes: Vec<String> = component
                    .into_iter()
                    .map(|idx| self.id_of(idx).to_string())
                    .collect();
                nodes.sort();
                CircularDependency { nodes }
            })
            .collect();

        cycles.sort_by(|a, b| a.nodes.cmp(&b.nodes));
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::{Edge, ImportSubtype, Node, NodeKind};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> AdjacencyIndex {
        AdjacencyIndex::from_parts(
            ids.iter().map(|id| Node::new(*id, NodeKind::File)).collect(),
            edges
                .iter()
                .map(|(s, t)| Edge::import(*s, *t, ImportSubtype::Named))
                .collect(),
        )
    }

    #[test]
    fn test_acyclic_graph() {
        let index = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(index.cycles().is_empty());
    }

    #[test]
    fn test_finds_and_sorts_cycles() {
        let index = graph(
            &["z", "y", "b", "a", "c", "free"],
            &[("z", "y"), ("y", "z"), ("c", "b"), ("b", "a"), ("a", "c"), ("a", "free")],
        );

        let cycles = index.cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].nodes, vec!["a", "b", "c"]);
        assert_eq!(cycles[1].nodes, vec!["y", "z"]);
    }

    #[test]
    fn test_self_loop() {
        let index = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        let cycles = index.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["a"]);
    }
}
