//! Degree rankings and isolated nodes.

use crate::index::AdjacencyIndex;
use crate::traversal::TraversalDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A node with its distinct-neighbour count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    pub name: String,
    pub count: usize,
}

impl AdjacencyIndex {
    /// Nodes imported by the most distinct files.
    ///
    /// Several imports from the same source count once. Sorted by count
    /// descending, then id ascending, truncated to `limit`.
    pub fn most_referenced(&self, limit: usize) -> Vec<RankedNode> {
        self.rank(limit, TraversalDirection::Upstream)
    }

    /// Nodes importing the most distinct files. Same ordering rules as
    /// [`Self::most_referenced`].
    pub fn most_dependencies(&self, limit: usize) -> Vec<RankedNode> {
        self.rank(limit, TraversalDirection::Downstream)
    }

    fn rank(&self, limit: usize, direction: TraversalDirection) -> Vec<RankedNode> {
        if limit == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<RankedNode> = self
            .node_indexes()
            .filter_map(|idx| {
                let node = self.get(idx)?;
                Some(RankedNode {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    count: self.distinct_neighbors(idx, direction).len(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
        ranked.truncate(limit);
        ranked
    }

    /// Nodes with no incoming and no outgoing edges.
    pub fn isolated(&self) -> BTreeSet<String> {
        self.node_indexes()
            .filter(|&idx| self.forward(idx).is_empty() && self.reverse(idx).is_empty())
            .map(|idx| self.id_of(idx).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_core::{Edge, ImportSubtype, Node, NodeKind};

    fn file(id: &str) -> Node {
        Node::new(id, NodeKind::File)
    }

    fn named(s: &str, t: &str) -> Edge {
        Edge::import(s, t, ImportSubtype::Named)
    }

    #[test]
    fn test_duplicate_sources_count_once() {
        let index = AdjacencyIndex::from_parts(
            vec![file("a"), file("b"), file("c"), file("util")],
            vec![
                named("a", "util"),
                Edge::import("a", "util", ImportSubtype::SideEffect),
                named("b", "util"),
                named("c", "b"),
            ],
        );

        let top = index.most_referenced(2);
        assert_eq!(top[0].id, "util");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].id, "b");
        assert_eq!(top[1].count, 1);
    }

    #[test]
    fn test_ties_break_by_id() {
        let index = AdjacencyIndex::from_parts(
            vec![file("z"), file("m"), file("a"), file("root")],
            vec![named("root", "z"), named("root", "m"), named("root", "a")],
        );

        let ids: Vec<String> = index.most_referenced(3).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_limit_bounds() {
        let index = AdjacencyIndex::from_parts(vec![file("a"), file("b")], vec![named("a", "b")]);
        assert!(index.most_referenced(0).is_empty());
        assert_eq!(index.most_referenced(10).len(), 2);
        assert_eq!(index.most_referenced(1), index.most_referenced(1));
    }

    #[test]
    fn test_most_dependencies() {
        let index = AdjacencyIndex::from_parts(
            vec![file("hub"), file("a"), file("b")],
            vec![named("hub", "a"), named("hub", "b"), named("a", "b")],
        );

        let top = index.most_dependencies(1);
        assert_eq!(top[0].id, "hub");
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_isolated_nodes() {
        let lonely = AdjacencyIndex::from_parts(
            vec![file("a"), file("b"), file("lonely")],
            vec![named("a", "b")],
        );
        assert_eq!(
            lonely.isolated().into_iter().collect::<Vec<_>>(),
            vec!["lonely".to_string()]
        );

        let linked = AdjacencyIndex::from_parts(
            vec![file("a"), file("b"), file("lonely")],
            vec![named("a", "b"), named("lonely", "a")],
        );
        assert!(linked.isolated().is_empty());
    }
}
