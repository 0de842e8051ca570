use super::{EdgeRecord, FactStore, NodeRecord, StoreError, Upsert};
use std::collections::{BTreeMap, BTreeSet};
use tangle_core::{Edge, EdgeKind, ImportSubtype, Node, UnresolvedImport};

type EdgeKey = (EdgeKind, String, String, Option<ImportSubtype>);

/// Volatile store backed by ordered maps. Used in tests and for
/// one-shot analyses that never touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<String, NodeRecord>,
    edges: BTreeMap<EdgeKey, EdgeRecord>,
    /// Unresolved specifiers by source id.
    unresolved: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl FactStore for MemoryStore {
    fn upsert_node(&mut self, node: Node) -> Result<Upsert, StoreError> {
        match self.nodes.get_mut(&node.id) {
            Some(record) => {
                record.update(node);
                Ok(Upsert::Updated)
            }
            None => {
                self.nodes.insert(node.id.clone(), NodeRecord::new(node));
                Ok(Upsert::Created)
            }
        }
    }

    fn upsert_edge(&mut self, edge: Edge) -> Result<Upsert, StoreError> {
        let key = (
            edge.kind,
            edge.source.clone(),
            edge.target.clone(),
            edge.subtype,
        );
        match self.edges.get_mut(&key) {
            Some(record) => {
                record.update(edge);
                Ok(Upsert::Updated)
            }
            None => {
                self.edges.insert(key, EdgeRecord::new(edge));
                Ok(Upsert::Created)
            }
        }
    }

    fn upsert_unresolved(&mut self, import: UnresolvedImport) -> Result<Upsert, StoreError> {
        let inserted = self
            .unresolved
            .entry(import.source)
            .or_default()
            .insert(import.specifier);
        Ok(if inserted {
            Upsert::Created
        } else {
            Upsert::Updated
        })
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.nodes.clear();
        self.edges.clear();
        self.unresolved.clear();
        Ok(())
    }

    fn fetch_all_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.values().map(|r| r.node.clone()).collect())
    }

    fn fetch_all_edges(&self, kind: EdgeKind) -> Result<Vec<Edge>, StoreError> {
        Ok(self
            .edges
            .iter()
            .filter(|((k, _, _, _), _)| *k == kind)
            .map(|(_, r)| r.edge.clone())
            .collect())
    }

    fn fetch_all_unresolved(&self) -> Result<Vec<UnresolvedImport>, StoreError> {
        Ok(self
            .unresolved
            .iter()
            .flat_map(|(source, specifiers)| {
                specifiers.iter().map(move |specifier| UnresolvedImport {
                    source: source.clone(),
                    specifier: specifier.clone(),
                })
            })
            .collect())
    }

    fn fetch_node(&self, id: &str) -> Result<Option<NodeRecord>, StoreError> {
        Ok(self.nodes.get(id).cloned())
    }
}
