//! Cycle-safe dependency trees.
//!
//! The tree is expanded depth-first along forward edges. The ancestor
//! path is threaded through the recursion: a child that is already one
//! of its own ancestors becomes a terminal `cyclic` marker instead of
//! being expanded again. Diamonds are not merged, each branch gets its
//! own copy.

use crate::index::{AdjacencyIndex, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One node of a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    /// Refers back to an ancestor; never has children.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cyclic: bool,
    /// Has dependencies that were cut off by the depth limit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of cyclic markers in this subtree.
    pub fn cycle_markers(&self) -> usize {
        usize::from(self.cyclic) + self.children.iter().map(TreeNode::cycle_markers).sum::<usize>()
    }

    /// Number of tree nodes, this one included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    /// Depth of the deepest leaf; a lone root has depth 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl AdjacencyIndex {
    /// Renders the dependency tree of `root` down to `max_depth` levels.
    ///
    /// Returns `None` for an unknown root or a zero depth. Children are
    /// listed once per distinct target, in edge insertion order.
    pub fn render_tree(&self, root: &str, max_depth: usize) -> Option<TreeNode> {
        if max_depth == 0 {
            return None;
        }
        let root_idx = self.get_index(root)?;
        let mut ancestors = HashSet::new();
        Some(self.expand(root_idx, 0, max_depth, &mut ancestors))
    }

    fn expand(
        &self,
        idx: NodeId,
        depth: usize,
        max_depth: usize,
        ancestors: &mut HashSet<NodeId>,
    ) -> TreeNode {
        let mut node = self.leaf(idx);
        let targets = self.distinct_neighbors(idx, crate::TraversalDirection::Downstream);

        if depth >= max_depth {
            node.truncated = !targets.is_empty();
            return node;
        }

        ancestors.insert(idx);
        for target in targets {
            if ancestors.contains(&target) {
                let mut marker = self.leaf(target);
                marker.cyclic = true;
                node.children.push(marker);
            } else {
                node.children
                    .push(self.expand(target, depth + 1, max_depth, ancestors));
            }
        }
        ancestors.remove(&idx);

        node
    }

    fn leaf(&self, idx: NodeId) -> TreeNode {
        let (id, name) = match self.get(idx) {
            Some(node) => (node.id.clone(), node.name.clone()),
            None => (String::new(), String::new()),
        };
        TreeNode {
            id,
            name,
            cyclic: false,
            truncated: false,
            children: Vec::new(),
        }
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
    fn test_three_cycle_has_one_marker() {
        // A → B → C → A
        let index = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);

        let tree = index.render_tree("a", 10).unwrap();
        assert_eq!(tree.cycle_markers(), 1);
        assert_eq!(tree.size(), 4);

        let c = &tree.children[0].children[0];
        assert_eq!(c.id, "c");
        assert!(c.children[0].cyclic);
        assert_eq!(c.children[0].id, "a");
    }

    #[test]
    fn test_diamond_is_duplicated() {
        let index = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );

        let tree = index.render_tree("a", 5).unwrap();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.cycle_markers(), 0);
        assert_eq!(tree.children[0].children[0].id, "d");
        assert_eq!(tree.children[1].children[0].id, "d");
    }

    #[test]
    fn test_depth_limit_marks_truncated() {
        let index = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);

        let tree = index.render_tree("a", 2).unwrap();
        assert_eq!(tree.depth(), 2);
        let c = &tree.children[0].children[0];
        assert_eq!(c.id, "c");
        assert!(c.truncated);
        assert!(c.children.is_empty());

        let full = index.render_tree("a", 3).unwrap();
        assert!(!full.children[0].children[0].children[0].truncated);
    }

    #[test]
    fn test_duplicate_edges_render_once() {
        let index = AdjacencyIndex::from_parts(
            vec![Node::new("a", NodeKind::File), Node::new("b", NodeKind::File)],
            vec![
                Edge::import("a", "b", ImportSubtype::Named),
                Edge::import("a", "b", ImportSubtype::SideEffect),
            ],
        );
        assert_eq!(index.render_tree("a", 3).unwrap().children.len(), 1);
    }

    #[test]
    fn test_zero_depth_and_unknown_root() {
        let index = graph(&["a", "b"], &[("a", "b")]);
        assert!(index.render_tree("a", 0).is_none());
        assert!(index.render_tree("ghost", 3).is_none());
    }

    #[test]
    fn test_self_import_is_cyclic() {
        let index = graph(&["a"], &[("a", "a")]);
        let tree = index.render_tree("a", 3).unwrap();
        assert_eq!(tree.cycle_markers(), 1);
    }
}
