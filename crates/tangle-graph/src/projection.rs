//! Size-bounded projection for visualization.
//!
//! Large graphs are unreadable when drawn in full, so the projection
//! keeps the most connected nodes and only the edges between them.

use crate::index::AdjacencyIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tangle_core::{Edge, Node};
use tracing::debug;

/// A node together with its projection weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedNode {
    #[serde(flatten)]
    pub node: Node,
    /// In-degree plus out-degree, counted per edge.
    pub weight: usize,
}

/// An induced subgraph ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub nodes: Vec<ProjectedNode>,
    pub edges: Vec<Edge>,
    pub total_nodes: usize,
    pub total_edges: usize,
    /// True when nodes were dropped to fit the bound.
    pub truncated: bool,
}

impl AdjacencyIndex {
    /// Projects the graph down to at most `max_nodes` nodes.
    ///
    /// `None` keeps everything. Otherwise the heaviest nodes are kept
    /// (ties by id) and only edges with both endpoints kept survive.
    pub fn project(&self, max_nodes: Option<usize>) -> Projection {
        let mut weights = vec![0usize; self.node_count()];
        for edge in self.graph.edge_references() {
            weights[edge.source().index()] += 1;
            weights[edge.target().index()] += 1;
        }

        let mut ranked: Vec<_> = self.node_indexes().collect();
        let limit = max_nodes.unwrap_or(ranked.len());
        let truncated = limit < ranked.len();
        if truncated {
            ranked.sort_by(|&a, &b| {
                weights[b.index()]
                    .cmp(&weights[a.index()])
                    .then_with(|| self.id_of(a).cmp(self.id_of(b)))
            });
            ranked.truncate(limit);
        }

        let kept: HashSet<_> = ranked.iter().copied().collect();

        let nodes = ranked
            .iter()
            .filter_map(|&idx| {
                Some(ProjectedNode {
                    node: self.get(idx)?.clone(),
                    weight: weights[idx.index()],
                })
            })
            .collect();

        let edges: Vec<Edge> = self
            .graph
            .edge_references()
            .filter(|edge| kept.contains(&edge.source()) && kept.contains(&edge.target()))
            .map(|edge| edge.weight().clone())
            .collect();

        debug!(
            "projection: {} of {} nodes, {} of {} edges",
            kept.len(),
            self.node_count(),
            edges.len(),
            self.edge_count()
        );

        Projection {
            nodes,
            edges,
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::{ImportSubtype, NodeKind};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> AdjacencyIndex {
        AdjacencyIndex::from_parts(
            ids.iter().map(|id| Node::new(*id, NodeKind::File)).collect(),
            edges
                .iter()
                .map(|(s, t)| Edge::import(*s, *t, ImportSubtype::Named))
                .collect(),
        )
    }

    fn star() -> AdjacencyIndex {
        graph(
            &["hub", "a", "b", "c", "lonely"],
            &[("a", "hub"), ("b", "hub"), ("c", "hub"), ("a", "b")],
        )
    }

    #[test]
    fn test_unbounded_is_identity() {
        let index = star();
        let projection = index.project(None);
        assert_eq!(projection.nodes.len(), 5);
        assert_eq!(projection.edges.len(), 4);
        assert!(!projection.truncated);

        let bigger = index.project(Some(50));
        assert_eq!(bigger.nodes.len(), 5);
        assert!(!bigger.truncated);
    }

    #[test]
    fn test_keeps_heaviest_and_induced_edges() {
        let projection = star().project(Some(3));

        let ids: Vec<&str> = projection.nodes.iter().map(|n| n.node.id.as_str()).collect();
        assert_eq!(ids, vec!["hub", "a", "b"]);
        assert_eq!(projection.nodes[0].weight, 3);
        assert!(projection.truncated);

        // c → hub is dropped along with c
        assert_eq!(projection.edges.len(), 3);
        assert!(projection.edges.iter().all(|e| e.source != "c"));
    }

    #[test]
    fn test_zero_bound_is_empty() {
        let projection = star().project(Some(0));
        assert!(projection.nodes.is_empty());
        assert!(projection.edges.is_empty());
        assert_eq!(projection.total_nodes, 5);
    }

    #[test]
    fn test_weight_counts_every_edge() {
        let index = AdjacencyIndex::from_parts(
            vec![Node::new("a", NodeKind::File), Node::new("b", NodeKind::File)],
            vec![
                Edge::import("a", "b", ImportSubtype::Named),
                Edge::import("a", "b", ImportSubtype::SideEffect),
            ],
        );
        let projection = index.project(None);
        assert!(projection.nodes.iter().all(|n| n.weight == 2));
    }

    #[test]
    fn test_serializes_flat_nodes() {
        let json = serde_json::to_value(star().project(Some(1))).unwrap();
        assert_eq!(json["nodes"][0]["id"], "hub");
        assert_eq!(json["nodes"][0]["weight"], 3);
    }
}
