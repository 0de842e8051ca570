//! Persistent fact storage.
//!
//! The store is a dumb fact base: it upserts nodes and edges and hands
//! them back in bulk. Every query runs on an [`crate::AdjacencyIndex`]
//! built from its contents, never against the store itself.

mod disk;
mod memory;

pub use disk::SledStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tangle_core::{
    Attributes, Edge, EdgeKind, ImportSubtype, Node, NodeKind, Scalar, UnresolvedImport,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Whether an upsert inserted a new fact or touched an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upsert {
    Created,
    Updated,
}

/// A stored node with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub node: Node,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NodeRecord {
    pub(crate) fn new(node: Node) -> Self {
        let now = Utc::now();
        Self {
            node,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn update(&mut self, newer: Node) {
        self.node.merge(newer);
        self.updated_at = Utc::now();
    }
}

/// A stored edge with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub edge: Edge,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EdgeRecord {
    pub(crate) fn new(edge: Edge) -> Self {
        let now = Utc::now();
        Self {
            edge,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attributes are merged with the newer value winning. The subtype
    /// is part of the key, so it never changes here.
    pub(crate) fn update(&mut self, newer: Edge) {
        self.edge.attributes.extend(newer.attributes);
        self.updated_at = Utc::now();
    }
}

/// The primitives the engine needs from a backing store.
///
/// Edges are keyed by `(kind, source, target, subtype)`, so repeating an
/// upsert leaves exactly one fact behind while two import statements of
/// different shape between the same files stay distinct. Unresolved
/// imports are keyed by `(source, specifier)`. Fetches return facts in
/// key order.
pub trait FactStore {
    fn upsert_node(&mut self, node: Node) -> Result<Upsert, StoreError>;

    fn upsert_edge(&mut self, edge: Edge) -> Result<Upsert, StoreError>;

    fn upsert_unresolved(&mut self, import: UnresolvedImport) -> Result<Upsert, StoreError>;

    /// Removes every node, edge and unresolved import.
    fn clear(&mut self) -> Result<(), StoreError>;

    fn fetch_all_nodes(&self) -> Result<Vec<Node>, StoreError>;

    /// All edges of one kind.
    fn fetch_all_edges(&self, kind: EdgeKind) -> Result<Vec<Edge>, StoreError>;

    fn fetch_all_unresolved(&self) -> Result<Vec<UnresolvedImport>, StoreError>;

    /// One node with its timestamps.
    fn fetch_node(&self, id: &str) -> Result<Option<NodeRecord>, StoreError>;

    /// Makes pending writes durable. A no-op for volatile stores.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// On-disk layout. `Scalar` is untagged for JSON, which a non
// self-describing format like bincode cannot read back, so attributes
// go through an externally tagged mirror.

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StoredScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<Scalar> for StoredScalar {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Bool(b) => StoredScalar::Bool(b),
            Scalar::Int(n) => StoredScalar::Int(n),
            Scalar::Float(x) => StoredScalar::Float(x),
            Scalar::Str(s) => StoredScalar::Str(s),
        }
    }
}

impl From<StoredScalar> for Scalar {
    fn from(value: StoredScalar) -> Self {
        match value {
            StoredScalar::Bool(b) => Scalar::Bool(b),
            StoredScalar::Int(n) => Scalar::Int(n),
            StoredScalar::Float(x) => Scalar::Float(x),
            StoredScalar::Str(s) => Scalar::Str(s),
        }
    }
}

fn store_attributes(attributes: Attributes) -> Vec<(String, StoredScalar)> {
    attributes
        .into_iter()
        .map(|(key, value)| (key, value.into()))
        .collect()
}

fn load_attributes(attributes: Vec<(String, StoredScalar)>) -> Attributes {
    attributes
        .into_iter()
        .map(|(key, value)| (key, value.into()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredNode {
    id: String,
    kind: NodeKind,
    name: String,
    attributes: Vec<(String, StoredScalar)>,
    placeholder: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NodeRecord> for StoredNode {
    fn from(record: NodeRecord) -> Self {
        let node = record.node;
        Self {
            id: node.id,
            kind: node.kind,
            name: node.name,
            attributes: store_attributes(node.attributes),
            placeholder: node.placeholder,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<StoredNode> for NodeRecord {
    fn from(stored: StoredNode) -> Self {
        Self {
            node: Node {
                id: stored.id,
                kind: stored.kind,
                name: stored.name,
                attributes: load_attributes(stored.attributes),
                placeholder: stored.placeholder,
            },
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredEdge {
    source: String,
    target: String,
    kind: EdgeKind,
    subtype: Option<ImportSubtype>,
    attributes: Vec<(String, StoredScalar)>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EdgeRecord> for StoredEdge {
    fn from(record: EdgeRecord) -> Self {
        let edge = record.edge;
        Self {
            source: edge.source,
            target: edge.target,
            kind: edge.kind,
            subtype: edge.subtype,
            attributes: store_attributes(edge.attributes),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<StoredEdge> for EdgeRecord {
    fn from(stored: StoredEdge) -> Self {
        Self {
            edge: Edge {
                source: stored.source,
                target: stored.target,
                kind: stored.kind,
                subtype: stored.subtype,
                attributes: load_attributes(stored.attributes),
            },
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}
