use super::{EdgeRecord, FactStore, NodeRecord, StoreError, StoredEdge, StoredNode, Upsert};
use sled::{Db, Tree};
use std::path::Path;
use tangle_core::{Edge, EdgeKind, Node, UnresolvedImport};
use tracing::debug;

/// Embedded on-disk store.
///
/// Nodes live in the `nodes` tree keyed by id. Edges live in the
/// `edges` tree keyed by `kind \0 source \0 target \0 subtype`, which
/// keeps each kind contiguous for prefix scans. Unresolved imports live
/// in the `unresolved` tree keyed by `source \0 specifier`.
pub struct SledStore {
    db: Db,
    nodes: Tree,
    edges: Tree,
    unresolved: Tree,
}

impl SledStore {
    /// Opens or creates a store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        debug!("Opening store at {}", path.as_ref().display());
        Self::from_db(sled::open(path)?)
    }

    /// A store that is deleted when dropped.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        let nodes = db.open_tree("nodes")?;
        let edges = db.open_tree("edges")?;
        let unresolved = db.open_tree("unresolved")?;
        Ok(Self {
            db,
            nodes,
            edges,
            unresolved,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn edge_prefix(kind: EdgeKind) -> String {
    format!("{}\0", kind)
}

fn edge_key(edge: &Edge) -> String {
    let subtype = edge.subtype.map(|s| s.as_str()).unwrap_or_default();
    format!(
        "{}{}\0{}\0{}",
        edge_prefix(edge.kind),
        edge.source,
        edge.target,
        subtype
    )
}

fn unresolved_key(import: &UnresolvedImport) -> String {
    format!("{}\0{}", import.source, import.specifier)
}

fn decode_node(bytes: &[u8]) -> Result<NodeRecord, StoreError> {
    let stored: StoredNode = bincode::deserialize(bytes)?;
    Ok(stored.into())
}

fn decode_edge(bytes: &[u8]) -> Result<EdgeRecord, StoreError> {
    let stored: StoredEdge = bincode::deserialize(bytes)?;
    Ok(stored.into())
}

impl FactStore for SledStore {
    fn upsert_node(&mut self, node: Node) -> Result<Upsert, StoreError> {
        let key = node.id.clone();
        let (record, outcome) = match self.nodes.get(&key)? {
            Some(bytes) => {
                let mut record = decode_node(&bytes)?;
                record.update(node);
                (record, Upsert::Updated)
            }
            None => (NodeRecord::new(node), Upsert::Created),
        };

        let bytes = bincode::serialize(&StoredNode::from(record))?;
        self.nodes.insert(key, bytes)?;
        Ok(outcome)
    }

    fn upsert_edge(&mut self, edge: Edge) -> Result<Upsert, StoreError> {
        let key = edge_key(&edge);
        let (record, outcome) = match self.edges.get(&key)? {
            Some(bytes) => {
                let mut record = decode_edge(&bytes)?;
                record.update(edge);
                (record, Upsert::Updated)
            }
            None => (EdgeRecord::new(edge), Upsert::Created),
        };

        let bytes = bincode::serialize(&StoredEdge::from(record))?;
        self.edges.insert(key, bytes)?;
        Ok(outcome)
    }

    fn upsert_unresolved(&mut self, import: UnresolvedImport) -> Result<Upsert, StoreError> {
        let key = unresolved_key(&import);
        let bytes = bincode::serialize(&import)?;
        Ok(match self.unresolved.insert(key, bytes)? {
            Some(_) => Upsert::Updated,
            None => Upsert::Created,
        })
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.nodes.clear()?;
        self.edges.clear()?;
        self.unresolved.clear()?;
        self.flush()
    }

    fn fetch_all_nodes(&self) -> Result<Vec<Node>, StoreError> {
        self.nodes
            .iter()
            .map(|entry| {
                let (_, bytes) = entry?;
                Ok(decode_node(&bytes)?.node)
            })
            .collect()
    }

    fn fetch_all_edges(&self, kind: EdgeKind) -> Result<Vec<Edge>, StoreError> {
        self.edges
            .scan_prefix(edge_prefix(kind))
            .map(|entry| {
                let (_, bytes) = entry?;
                Ok(decode_edge(&bytes)?.edge)
            })
            .collect()
    }

    fn fetch_all_unresolved(&self) -> Result<Vec<UnresolvedImport>, StoreError> {
        self.unresolved
            .iter()
            .map(|entry| {
                let (_, bytes) = entry?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    fn fetch_node(&self, id: &str) -> Result<Option<NodeRecord>, StoreError> {
        self.nodes
            .get(id)?
            .map(|bytes| decode_node(&bytes))
            .transpose()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::contract;
    use tangle_core::{ImportSubtype, NodeKind, Scalar};
    use tempfile::tempdir;

    #[test]
    fn test_upsert_is_idempotent() {
        let mut store = SledStore::temporary().unwrap();
        contract::upsert_is_idempotent(&mut store);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn test_update_merges_and_keeps_created_at() {
        contract::update_merges_and_keeps_created_at(&mut SledStore::temporary().unwrap());
    }

    #[test]
    fn test_edges_are_keyed_by_kind() {
        contract::edges_are_keyed_by_kind(&mut SledStore::temporary().unwrap());
    }

    #[test]
    fn test_subtypes_stay_distinct() {
        let mut store = SledStore::temporary().unwrap();
        contract::subtypes_stay_distinct(&mut store);
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn test_unresolved_round_trip() {
        contract::unresolved_round_trip(&mut SledStore::temporary().unwrap());
    }

    #[test]
    fn test_clear() {
        contract::clear_removes_everything(&mut SledStore::temporary().unwrap());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();

        {
            let mut store = SledStore::open(dir.path()).unwrap();
            store
                .upsert_node(
                    Node::new("src/a.ts", NodeKind::File)
                        .with_attribute("size", 120)
                        .with_attribute("generated", false),
                )
                .unwrap();
            store
                .upsert_edge(
                    Edge::import("src/a.ts", "src/b.ts", ImportSubtype::Namespace)
                        .with_attribute("specifier", "./b"),
                )
                .unwrap();
            store.flush().unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        let nodes = store.fetch_all_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].attributes.get("size"), Some(&Scalar::Int(120)));
        assert_eq!(nodes[0].attributes.get("generated"), Some(&Scalar::Bool(false)));

        let edges = store.fetch_all_edges(EdgeKind::Imports).unwrap();
        assert_eq!(edges[0].subtype, Some(ImportSubtype::Namespace));
        assert_eq!(edges[0].attributes.get("specifier"), Some(&Scalar::from("./b")));
    }
}
