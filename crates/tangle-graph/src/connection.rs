//! Connection classification between two specific nodes.
//!
//! Used for impact questions like "does touching A affect B?". Which
//! file is the nominal root does not matter, so both directions count;
//! the direction is reported as metadata next to the result.

use crate::index::{AdjacencyIndex, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Which way the link runs relative to the `(a, b)` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// a → … → b
    Forward,
    /// b → … → a
    Backward,
}

impl std::fmt::Display for LinkDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkDirection::Forward => write!(f, "forward"),
            LinkDirection::Backward => write!(f, "backward"),
        }
    }
}

/// How two nodes are related.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Connection {
    /// An edge links the two nodes.
    Direct { direction: LinkDirection },
    /// A longer path links them. `path` runs in `direction`.
    Indirect {
        direction: LinkDirection,
        path: Vec<String>,
        hops: usize,
    },
    /// No path within the hop budget.
    None,
}

impl Connection {
    /// Hop distance, if connected.
    pub fn hops(&self) -> Option<usize> {
        match self {
            Connection::Direct { .. } => Some(1),
            Connection::Indirect { hops, .. } => Some(*hops),
            Connection::None => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        !matches!(self, Connection::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connection::Direct { .. } => "direct",
            Connection::Indirect { .. } => "indirect",
            Connection::None => "none",
        }
    }
}

impl AdjacencyIndex {
    /// Classifies the relationship between `a` and `b` within `max_hops`.
    ///
    /// Order: edge a→b, edge b→a, then the shortest forward path either
    /// way. When both directions have a path the shorter one is
    /// reported (a→b on a tie), so swapping the arguments never changes
    /// the kind or the hop count.
    ///
    /// A zero budget, an unknown id, or `a == b` without a self-import
    /// gives `Connection::None`.
    pub fn connect(&self, a: &str, b: &str, max_hops: usize) -> Connection {
        if max_hops == 0 {
            return Connection::None;
        }
        let (Some(a_idx), Some(b_idx)) = (self.get_index(a), self.get_index(b)) else {
            return Connection::None;
        };

        if self.has_edge(a_idx, b_idx) {
            return Connection::Direct {
                direction: LinkDirection::Forward,
            };
        }
        if self.has_edge(b_idx, a_idx) {
            return Connection::Direct {
                direction: LinkDirection::Backward,
            };
        }
        if a_idx == b_idx {
            return Connection::None;
        }

        let forward = self.shortest_path(a_idx, b_idx, max_hops);
        let backward = self.shortest_path(b_idx, a_idx, max_hops);

        let (direction, path) = match (forward, backward) {
            (Some(f), Some(b)) if b.len() < f.len() => (LinkDirection::Backward, b),
            (Some(f), _) => (LinkDirection::Forward, f),
            (None, Some(b)) => (LinkDirection::Backward, b),
            (None, None) => return Connection::None,
        };

        let hops = path.len() - 1;
        debug!("connect {} {}: {} hops {}", a, b, hops, direction);

        Connection::Indirect {
            direction,
            path: path.into_iter().map(|n| self.id_of(n).to_string()).collect(),
            hops,
        }
    }

    /// Unweighted BFS over forward edges from `from` to `to`.
    ///
    /// Neighbours are visited in insertion order, so among equally short
    /// paths the same one is always returned.
    fn shortest_path(&self, from: NodeId, to: NodeId, max_hops: usize) -> Option<Vec<NodeId>> {
        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        seen.insert(from);
        let mut frontier = vec![from];

        for _ in 0..max_hops {
            let mut next = Vec::new();
            for &current in &frontier {
                for adj in self.forward(current) {
                    if !seen.insert(adj.node) {
                        continue;
                    }
                    parents.insert(adj.node, current);
                    if adj.node == to {
                        return Some(reconstruct(&parents, from, to));
                    }
                    next.push(adj.node);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        None
    }
}

fn reconstruct(parents: &HashMap<NodeId, NodeId>, from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        match parents.get(&current) {
            Some(&parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
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
    fn test_direct_both_ways() {
        let index = graph(&["a", "b"], &[("a", "b")]);

        assert_eq!(
            index.connect("a", "b", 3),
            Connection::Direct {
                direction: LinkDirection::Forward
            }
        );
        assert_eq!(
            index.connect("b", "a", 3),
            Connection::Direct {
                direction: LinkDirection::Backward
            }
        );
    }

    #[test]
    fn test_indirect_path() {
        let index = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);

        match index.connect("a", "d", 5) {
            Connection::Indirect {
                direction,
                path,
                hops,
            } => {
                assert_eq!(direction, LinkDirection::Forward);
                assert_eq!(path, vec!["a", "b", "c", "d"]);
                assert_eq!(hops, 3);
            }
            other => panic!("expected indirect, got {:?}", other),
        }

        match index.connect("d", "a", 5) {
            Connection::Indirect {
                direction, path, ..
            } => {
                assert_eq!(direction, LinkDirection::Backward);
                assert_eq!(path, vec!["a", "b", "c", "d"]);
            }
            other => panic!("expected indirect, got {:?}", other),
        }
    }

    #[test]
    fn test_hop_budget() {
        let index = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(index.connect("a", "d", 2), Connection::None);
        assert_eq!(index.connect("a", "d", 3).hops(), Some(3));
        assert_eq!(index.connect("a", "b", 0), Connection::None);
    }

    #[test]
    fn test_equal_length_paths_are_deterministic() {
        // a → b → d and a → c → d; b was inserted first.
        let index = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );

        for _ in 0..5 {
            match index.connect("a", "d", 4) {
                Connection::Indirect { path, .. } => assert_eq!(path, vec!["a", "b", "d"]),
                other => panic!("expected indirect, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_shorter_direction_wins() {
        // a → x → y → b (3 hops) and b → z → a (2 hops)
        let index = graph(
            &["a", "b", "x", "y", "z"],
            &[("a", "x"), ("x", "y"), ("y", "b"), ("b", "z"), ("z", "a")],
        );

        let ab = index.connect("a", "b", 5);
        let ba = index.connect("b", "a", 5);
        assert_eq!(ab.hops(), Some(2));
        assert_eq!(ba.hops(), Some(2));
        assert!(matches!(
            ab,
            Connection::Indirect {
                direction: LinkDirection::Backward,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_and_same_node() {
        let index = graph(&["a", "b"], &[("a", "b")]);
        assert_eq!(index.connect("a", "ghost", 5), Connection::None);
        assert_eq!(index.connect("a", "a", 5), Connection::None);

        let looped = graph(&["a"], &[("a", "a")]);
        assert!(matches!(looped.connect("a", "a", 5), Connection::Direct { .. }));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(Connection::None).unwrap();
        assert_eq!(json["kind"], "none");
    }
}
