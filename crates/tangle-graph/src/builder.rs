//! Graph builder for constructing an adjacency index from extractor output.
//!
//! The builder takes nodes and edges in any order and handles the
//! two-pass process:
//! 1. Upsert nodes by id (later copies update earlier ones)
//! 2. Attach edges, materializing placeholders for ids nobody emitted

use crate::index::AdjacencyIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tangle_core::{Edge, ExtractionBatch, Node, UnresolvedImport};
use tracing::{debug, info, warn};

/// What happened while building one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Distinct nodes, placeholders included.
    pub nodes: usize,
    /// Node copies folded into an existing id.
    pub merged: usize,
    pub edges: usize,
    pub placeholders: usize,
    /// Imports the extractor could not resolve.
    pub unresolved: usize,
}

/// Builds an AdjacencyIndex from nodes and edges.
pub struct GraphBuilder {
    nodes: Vec<Node>,
    /// Maps ids to their position in `nodes`.
    positions: HashMap<String, usize>,
    edges: Vec<Edge>,
    unresolved: Vec<UnresolvedImport>,
    report: BuildReport,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            positions: HashMap::new(),
            edges: Vec::new(),
            unresolved: Vec::new(),
            report: BuildReport::default(),
        }
    }

    /// Creates a builder pre-loaded with one extraction pass.
    pub fn from_batch(batch: ExtractionBatch) -> Self {
        let mut builder = Self::new();
        builder.add_nodes(batch.nodes);
        builder.add_edges(batch.edges);
        builder.add_unresolved(batch.unresolved);
        builder
    }

    /// Adds or updates one node.
    pub fn add_node(&mut self, node: Node) {
        match self.positions.get(&node.id) {
            Some(&pos) => {
                self.nodes[pos].merge(node);
                self.report.merged += 1;
            }
            None => {
                self.positions.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    /// Adds or updates nodes.
    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.add_node(node);
        }
    }

    /// Adds edges. Endpoints that do not exist yet become placeholders;
    /// a real node added later replaces its placeholder.
    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        for edge in edges {
            self.ensure_node(&edge.source);
            self.ensure_node(&edge.target);
            self.edges.push(edge);
        }
    }

    /// Records imports the extractor could not resolve. They never
    /// become edges.
    pub fn add_unresolved(&mut self, imports: impl IntoIterator<Item = UnresolvedImport>) {
        for import in imports {
            debug!("Unresolved import '{}' in {}", import.specifier, import.source);
            self.unresolved.push(import);
        }
    }

    fn ensure_node(&mut self, id: &str) {
        if self.positions.contains_key(id) {
            return;
        }
        warn!("Edge references unknown node '{}', adding placeholder", id);
        self.positions.insert(id.to_string(), self.nodes.len());
        self.nodes.push(Node::placeholder(id));
    }

    /// The report so far.
    pub fn report(&self) -> BuildReport {
        let mut report = self.report.clone();
        report.nodes = self.nodes.len();
        report.edges = self.edges.len();
        report.unresolved = self.unresolved.len();
        report.placeholders = self.nodes.iter().filter(|n| n.placeholder).count();
        report
    }

    /// Finishes building and returns the index.
    pub fn build(self) -> AdjacencyIndex {
        self.build_with_report().0
    }

    /// Finishes building and returns the index with its report.
    pub fn build_with_report(self) -> (AdjacencyIndex, BuildReport) {
        let report = self.report();
        let index = AdjacencyIndex::assemble(self.nodes, self.edges, self.unresolved);

        info!(
            "Built index: {} nodes ({} placeholders), {} edges",
            report.nodes, report.placeholders, report.edges
        );
        (index, report)
    }
}
