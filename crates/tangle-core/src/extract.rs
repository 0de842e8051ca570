//! The extractor boundary.
//!
//! An extraction pass produces one [`ExtractionBatch`]: every node it
//! visited, every edge it could resolve, and the import specifiers it
//! could not. The batch is read from JSON; defaults keep hand-written
//! batches short.

use crate::edge::{Edge, EdgeKind, ImportClause, ImportSubtype};
use crate::error::{CoreError, Result};
use crate::node::{basename, Attributes, Node, NodeKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// An import the extractor saw but could not resolve to a node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedImport {
    pub source: String,
    pub specifier: String,
}

/// The full output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionBatch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub unresolved: Vec<UnresolvedImport>,
}

#[derive(Deserialize)]
struct RawBatch {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
    #[serde(default)]
    unresolved: Vec<UnresolvedImport>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    kind: NodeKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Deserialize)]
struct RawEdge {
    source: String,
    target: String,
    #[serde(default)]
    kind: EdgeKind,
    #[serde(default)]
    subtype: Option<ImportSubtype>,
    #[serde(default)]
    clause: Option<ImportClause>,
    #[serde(default)]
    attributes: Attributes,
}

impl ExtractionBatch {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            unresolved: Vec::new(),
        }
    }

    /// Parses a batch from a JSON string.
    ///
    /// Edges with an empty endpoint are rejected: the extractor must
    /// drop imports it cannot resolve rather than emit them half-empty.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawBatch = serde_json::from_str(json)?;

        let nodes = raw
            .nodes
            .into_iter()
            .map(|raw| {
                let name = raw
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| basename(&raw.id).to_string());
                Node {
                    id: raw.id,
                    kind: raw.kind,
                    name,
                    attributes: raw.attributes,
                    placeholder: false,
                }
            })
            .collect();

        let mut edges = Vec::with_capacity(raw.edges.len());
        for (index, raw) in raw.edges.into_iter().enumerate() {
            if raw.source.trim().is_empty() || raw.target.trim().is_empty() {
                return Err(CoreError::MalformedEdge {
                    index,
                    reason: "empty source or target".to_string(),
                });
            }

            let subtype = match (raw.subtype, raw.clause) {
                (Some(subtype), _) => Some(subtype),
                (None, Some(clause)) if raw.kind == EdgeKind::Imports => {
                    Some(ImportSubtype::classify(&clause))
                }
                _ => None,
            };

            edges.push(Edge {
                source: raw.source,
                target: raw.target,
                kind: raw.kind,
                subtype,
                attributes: raw.attributes,
            });
        }

        let batch = Self {
            nodes,
            edges,
            unresolved: raw.unresolved,
        };
        debug!(
            "Parsed batch: {} nodes, {} edges, {} unresolved",
            batch.nodes.len(),
            batch.edges.len(),
            batch.unresolved.len()
        );
        Ok(batch)
    }

    /// Reads a batch from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
