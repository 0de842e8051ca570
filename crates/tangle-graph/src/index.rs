//! The adjacency index.
//!
//! An AdjacencyIndex is one immutable snapshot of the dependency graph.
//! It wraps a petgraph DiGraph and adds an id lookup table plus forward
//! and reverse adjacency lists kept in edge insertion order, which is
//! what makes BFS results reproducible.
//!
//! Build one with [`crate::GraphBuilder`] or [`AdjacencyIndex::from_parts`].

use crate::traversal::TraversalDirection;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tangle_core::{Edge, EdgeKind, ImportSubtype, Node, UnresolvedImport};

/// Position of a node inside one index.
pub type NodeId = NodeIndex;

/// One entry of an adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    /// The node at the other end of the edge.
    pub node: NodeId,
    pub kind: EdgeKind,
    pub subtype: Option<ImportSubtype>,
}

/// An outgoing import as seen from its source, subtype included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRef {
    pub target: String,
    pub kind: EdgeKind,
    pub subtype: Option<ImportSubtype>,
}

/// Read-only snapshot of nodes and edges with O(1) neighbour lookup.
#[derive(Debug, Default)]
pub struct AdjacencyIndex {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<Node, Edge>,

    /// Maps string ids to graph node indexes.
    id_index: HashMap<String, NodeId>,

    /// Outgoing edges per node, in insertion order.
    forward: Vec<Vec<Adjacent>>,

    /// Incoming edges per node, in insertion order.
    reverse: Vec<Vec<Adjacent>>,

    /// Import specifiers that never resolved to a node, by source id.
    unresolved: HashMap<String, Vec<String>>,
}

impl AdjacencyIndex {
    /// Builds an index from raw parts, materializing placeholders for
    /// dangling edge endpoints.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut builder = crate::GraphBuilder::new();
        builder.add_nodes(nodes);
        builder.add_edges(edges);
        builder.build()
    }

    /// Assembles the index. Every edge endpoint must already be in `nodes`.
    pub(crate) fn assemble(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        unresolved: Vec<UnresolvedImport>,
    ) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut id_index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            let id = node.id.clone();
            let index = graph.add_node(node);
            id_index.insert(id, index);
        }

        let mut forward = vec![Vec::new(); graph.node_count()];
        let mut reverse = vec![Vec::new(); graph.node_count()];

        for edge in edges {
            let (Some(&from), Some(&to)) = (id_index.get(&edge.source), id_index.get(&edge.target))
            else {
                continue;
            };

            forward[from.index()].push(Adjacent {
                node: to,
                kind: edge.kind,
                subtype: edge.subtype,
            });
            reverse[to.index()].push(Adjacent {
                node: from,
                kind: edge.kind,
                subtype: edge.subtype,
            });
            graph.add_edge(from, to, edge);
        }

        let mut by_source: HashMap<String, Vec<String>> = HashMap::new();
        for import in unresolved {
            let specifiers = by_source.entry(import.source).or_default();
            if !specifiers.contains(&import.specifier) {
                specifiers.push(import.specifier);
            }
        }

        Self {
            graph,
            id_index,
            forward,
            reverse,
            unresolved: by_source,
        }
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges, duplicates included.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Gets the node index for a string id.
    pub fn get_index(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    /// Gets a node by its string id.
    pub fn get_by_id(&self, id: &str) -> Option<&Node> {
        let index = self.get_index(id)?;
        self.graph.node_weight(index)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&Node> {
        self.graph.node_weight(index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// The string id of an index. Empty for indexes from another snapshot.
    pub(crate) fn id_of(&self, index: NodeId) -> &str {
        self.graph
            .node_weight(index)
            .map(|node| node.id.as_str())
            .unwrap_or_default()
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_weights()
    }

    /// Iterates over all node indexes.
    pub fn node_indexes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// Outgoing adjacency list. Unknown indexes yield an empty slice.
    pub fn forward(&self, index: NodeId) -> &[Adjacent] {
        self.forward
            .get(index.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Incoming adjacency list. Unknown indexes yield an empty slice.
    pub fn reverse(&self, index: NodeId) -> &[Adjacent] {
        self.reverse
            .get(index.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adjacency list for a traversal direction.
    pub fn neighbors(&self, index: NodeId, direction: TraversalDirection) -> &[Adjacent] {
        match direction {
            TraversalDirection::Downstream => self.forward(index),
            TraversalDirection::Upstream => self.reverse(index),
        }
    }

    /// Distinct neighbours in first-seen order.
    pub(crate) fn distinct_neighbors(
        &self,
        index: NodeId,
        direction: TraversalDirection,
    ) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.neighbors(index, direction)
            .iter()
            .filter(|adj| seen.insert(adj.node))
            .map(|adj| adj.node)
            .collect()
    }

    /// True if at least one edge runs `from -> to`.
    pub(crate) fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.forward(from).iter().any(|adj| adj.node == to)
    }

    /// Nodes the given node depends on directly, deduplicated.
    pub fn dependencies(&self, id: &str) -> Vec<&Node> {
        self.direct(id, TraversalDirection::Downstream)
    }

    /// Nodes that depend on the given node directly, deduplicated.
    pub fn dependents(&self, id: &str) -> Vec<&Node> {
        self.direct(id, TraversalDirection::Upstream)
    }

    fn direct(&self, id: &str, direction: TraversalDirection) -> Vec<&Node> {
        match self.get_index(id) {
            Some(index) => self
                .distinct_neighbors(index, direction)
                .into_iter()
                .filter_map(|n| self.get(n))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every outgoing edge of a node with its subtype. Unlike
    /// [`Self::dependencies`] this keeps duplicate targets.
    pub fn imports_of(&self, id: &str) -> Vec<ImportRef> {
        let Some(index) = self.get_index(id) else {
            return Vec::new();
        };

        self.forward(index)
            .iter()
            .map(|adj| ImportRef {
                target: self.id_of(adj.node).to_string(),
                kind: adj.kind,
                subtype: adj.subtype,
            })
            .collect()
    }

    /// Import specifiers from `id` that the extractor could not resolve,
    /// in first-seen order. These are usually third-party packages.
    pub fn unresolved_of(&self, id: &str) -> &[String] {
        self.unresolved
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct unresolved imports across all sources.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.values().map(Vec::len).sum()
    }

    /// Searches for nodes whose id or name contains the query,
    /// case-insensitively. Results are sorted by id.
    pub fn search(&self, query: &str) -> Vec<&Node> {
        let query_lower = query.to_lowercase();
        let mut matches: Vec<&Node> = self
            .graph
            .node_weights()
            .filter(|node| {
                node.id.to_lowercase().contains(&query_lower)
                    || node.name.to_lowercase().contains(&query_lower)
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }
}

/// Graph statistics for the status command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub placeholders: usize,
    pub isolated: usize,
    pub cycles: usize,
    pub unresolved: usize,
    /// Mean number of distinct dependencies per node.
    pub average_dependencies: f64,
}

impl AdjacencyIndex {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let node_count = self.node_count();
        let distinct_dependencies: usize = self
            .node_indexes()
            .map(|idx| {
                self.distinct_neighbors(idx, TraversalDirection::Downstream)
                    .len()
            })
            .sum();

        GraphStats {
            node_count,
            edge_count: self.edge_count(),
            placeholders: self.nodes().filter(|n| n.placeholder).count(),
            isolated: self.isolated().len(),
            cycles: self.cycles().len(),
            unresolved: self.unresolved_count(),
            average_dependencies: if node_count == 0 {
                0.0
            } else {
                distinct_dependencies as f64 / node_count as f64
            },
        }
    }
}
