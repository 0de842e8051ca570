//! Bounded dependency chains.
//!
//! Level-by-level BFS from a root in one direction. Each reachable node
//! is reported once, at the shallowest depth it was found, so a node's
//! depth is always its shortest hop distance from the root.

use crate::index::{AdjacencyIndex, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Instant;
use tracing::debug;

/// Direction of a traversal from the root node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    /// Nodes that depend on the root (incoming edges).
    /// These break if the root changes.
    Upstream,
    /// Nodes the root depends on (outgoing edges).
    Downstream,
}

impl std::fmt::Display for TraversalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalDirection::Upstream => write!(f, "upstream"),
            TraversalDirection::Downstream => write!(f, "downstream"),
        }
    }
}

/// Result of a bounded traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyChain {
    pub root: String,
    pub direction: TraversalDirection,
    pub max_depth: usize,
    /// Depth (1-based) to the ids first reached at that depth.
    pub levels: BTreeMap<usize, BTreeSet<String>>,
}

impl DependencyChain {
    fn empty(root: &str, direction: TraversalDirection, max_depth: usize) -> Self {
        Self {
            root: root.to_string(),
            direction,
            max_depth,
            levels: BTreeMap::new(),
        }
    }

    /// Total number of nodes reached.
    pub fn total(&self) -> usize {
        self.levels.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Ids first reached at `depth`.
    pub fn at(&self, depth: usize) -> Option<&BTreeSet<String>> {
        self.levels.get(&depth)
    }

    /// Depth at which an id was reached, if at all.
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        self.levels
            .iter()
            .find(|(_, ids)| ids.contains(id))
            .map(|(depth, _)| *depth)
    }
}

impl AdjacencyIndex {
    /// Walks up to `max_depth` hops from `root`.
    ///
    /// A zero depth or an unknown root gives an empty chain; a missing
    /// node simply has no recorded relationships.
    pub fn chain(
        &self,
        root: &str,
        direction: TraversalDirection,
        max_depth: usize,
    ) -> DependencyChain {
        let start = Instant::now();
        let mut chain = DependencyChain::empty(root, direction, max_depth);

        let Some(root_idx) = self.get_index(root) else {
            return chain;
        };

        let mut seen: HashSet<NodeId> = HashSet::new();
        seen.insert(root_idx);
        let mut frontier = vec![root_idx];

        for depth in 1..=max_depth {
            let mut next = Vec::new();
            for &current in &frontier {
                for adj in self.neighbors(current, direction) {
                    if seen.insert(adj.node) {
                        next.push(adj.node);
                    }
                }
            }

            if next.is_empty() {
                break;
            }

            chain.levels.insert(
                depth,
                next.iter().map(|&n| self.id_of(n).to_string()).collect(),
            );
            frontier = next;
        }

        debug!(
            "chain {} {} (depth {}): {} nodes in {:?}",
            direction,
            root,
            max_depth,
            chain.total(),
            start.elapsed()
        );
        chain
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

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_graph() {
        let index = AdjacencyIndex::default();
        let chain = index.chain("a", TraversalDirection::Downstream, 5);
        assert!(chain.is_empty());
        assert_eq!(chain.total(), 0);
    }

    #[test]
    fn test_zero_depth_is_empty() {
        let index = graph(&["a", "b"], &[("a", "b")]);
        assert!(index.chain("a", TraversalDirection::Downstream, 0).is_empty());
    }

    #[test]
    fn test_linear_chain_both_directions() {
        // A → B → C
        let index = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);

        let down = index.chain("b", TraversalDirection::Downstream, 5);
        assert_eq!(down.at(1), Some(&set(&["c"])));
        assert_eq!(down.total(), 1);

        let up = index.chain("c", TraversalDirection::Upstream, 5);
        assert_eq!(up.at(1), Some(&set(&["b"])));
        assert_eq!(up.at(2), Some(&set(&["a"])));
    }

    #[test]
    fn test_shortest_depth_wins() {
        // a → b → c → d and a shortcut a → d
        let index = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
        );

        let chain = index.chain("a", TraversalDirection::Downstream, 5);
        assert_eq!(chain.depth_of("d"), Some(1));
        assert_eq!(chain.depth_of("c"), Some(2));
        assert_eq!(chain.total(), 3);
    }

    #[test]
    fn test_cycle_no_infinite_loop() {
        // A → B → C → A (cycle)
        let index = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);

        let chain = index.chain("a", TraversalDirection::Downstream, 10);
        assert_eq!(chain.total(), 2);
        assert_eq!(chain.depth_of("a"), None);
    }

    #[test]
    fn test_max_depth_limit() {
        // A → B → C → D → E
        let index = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")],
        );

        let chain = index.chain("a", TraversalDirection::Downstream, 2);
        assert_eq!(chain.levels.len(), 2);
        assert_eq!(chain.depth_of("c"), Some(2));
        assert_eq!(chain.depth_of("d"), None);
    }
}
