//! Directory-level clustering.
//!
//! Nodes are grouped by a key derived from their id and edges crossing
//! groups are counted per ordered `(from, to)` pair. Groups with many
//! outgoing cross-group edges are the low-cohesion spots worth a look.

use crate::index::AdjacencyIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Derives a group name from a node id. `None` means "no group".
pub trait GroupKey {
    fn group_of(&self, id: &str) -> Option<String>;
}

impl<F> GroupKey for F
where
    F: Fn(&str) -> Option<String>,
{
    fn group_of(&self, id: &str) -> Option<String> {
        self(id)
    }
}

/// Built-in path-based group keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Directory containing the file: `src/app/main.ts` → `src/app`.
    #[default]
    Parent,
    /// First path segment: `src/app/main.ts` → `src`.
    TopLevel,
}

impl GroupKey for GroupBy {
    fn group_of(&self, id: &str) -> Option<String> {
        match self {
            GroupBy::Parent => parent_directory(id),
            GroupBy::TopLevel => top_level(id),
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" | "dir" => Ok(GroupBy::Parent),
            "top" | "top_level" | "top-level" => Ok(GroupBy::TopLevel),
            other => Err(format!("unknown grouping '{}'", other)),
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Directory part of a path id, `None` when there is no separator.
pub fn parent_directory(id: &str) -> Option<String> {
    let (dir, _) = id.rsplit_once(is_separator)?;
    (!dir.is_empty()).then(|| dir.to_string())
}

/// First segment of a path id, `None` when there is no separator.
pub fn top_level(id: &str) -> Option<String> {
    let trimmed = id.trim_start_matches("./");
    let (first, _) = trimmed.split_once(is_separator)?;
    (!first.is_empty()).then(|| first.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSize {
    pub group: String,
    pub nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCoupling {
    pub from: String,
    pub to: String,
    pub edges: usize,
}

/// Result of clustering one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterReport {
    /// Largest groups first, top-K.
    pub groups: Vec<GroupSize>,
    /// Busiest cross-group links first, top-K.
    pub couplings: Vec<GroupCoupling>,
    /// Groups before truncation.
    pub total_groups: usize,
    /// Nodes whose key could not be computed.
    pub ungrouped: usize,
}

impl AdjacencyIndex {
    /// Groups nodes by `key` and counts cross-group edges.
    ///
    /// Every edge occurrence counts. Edges with an ungroupable endpoint
    /// are skipped. Ties sort by group name.
    pub fn clusters<K: GroupKey + ?Sized>(&self, key: &K, top_k: usize) -> ClusterReport {
        let groups: Vec<Option<String>> = self
            .nodes()
            .map(|node| key.group_of(&node.id))
            .collect();

        let mut sizes: HashMap<&str, usize> = HashMap::new();
        let mut ungrouped = 0;
        for group in &groups {
            match group {
                Some(g) => *sizes.entry(g.as_str()).or_insert(0) += 1,
                None => ungrouped += 1,
            }
        }

        let mut couplings: HashMap<(&str, &str), usize> = HashMap::new();
        for from in self.node_indexes() {
            let Some(from_group) = groups[from.index()].as_deref() else {
                continue;
            };
            for adj in self.forward(from) {
                let Some(to_group) = groups[adj.node.index()].as_deref() else {
                    continue;
                };
                if from_group != to_group {
                    *couplings.entry((from_group, to_group)).or_insert(0) += 1;
                }
            }
        }

        let total_groups = sizes.len();

        let mut groups: Vec<GroupSize> = sizes
            .into_iter()
            .map(|(group, nodes)| GroupSize {
                group: group.to_string(),
                nodes,
            })
            .collect();
        groups.sort_by(|a, b| b.nodes.cmp(&a.nodes).then_with(|| a.group.cmp(&b.group)));
        groups.truncate(top_k);

        let mut couplings: Vec<GroupCoupling> = couplings
            .into_iter()
            .map(|((from, to), edges)| GroupCoupling {
                from: from.to_string(),
                to: to.to_string(),
                edges,
            })
            .collect();
        couplings.sort_by(|a, b| {
            b.edges
                .cmp(&a.edges)
                .then_with(|| a.from.cmp(&b.from))
                .then_with(|| a.to.cmp(&b.to))
        });
        couplings.truncate(top_k);

        ClusterReport {
            groups,
            couplings,
            total_groups,
            ungrouped,
        }
    }
}
