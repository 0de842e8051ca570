//! Snapshot publication and store round-trips.
//!
//! Readers grab an `Arc` to the current index and query it without any
//! lock held. A reload builds a complete new index off to the side and
//! swaps the pointer, so a query never sees a half-built graph.

use crate::builder::GraphBuilder;
use crate::index::AdjacencyIndex;
use crate::store::{FactStore, StoreError, Upsert};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tangle_core::{EdgeKind, ExtractionBatch};
use tracing::{debug, info};

/// Shared handle to the current index.
#[derive(Debug, Default)]
pub struct SnapshotHandle {
    current: RwLock<Arc<AdjacencyIndex>>,
}

impl SnapshotHandle {
    pub fn new(index: AdjacencyIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// A handle over an empty graph.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The index current at the time of the call. Later publishes do
    /// not affect the returned snapshot.
    pub fn load(&self) -> Arc<AdjacencyIndex> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replaces the current index.
    pub fn publish(&self, index: AdjacencyIndex) {
        let next = Arc::new(index);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
        debug!("Published snapshot with {} nodes", guard.node_count());
    }
}

/// Counts from writing one batch to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub edges_created: usize,
    pub edges_updated: usize,
    pub unresolved: usize,
}

impl IngestReport {
    fn count_node(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Created => self.nodes_created += 1,
            Upsert::Updated => self.nodes_updated += 1,
        }
    }

    fn count_edge(&mut self, outcome: Upsert) {
        match outcome {
            Upsert::Created => self.edges_created += 1,
            Upsert::Updated => self.edges_updated += 1,
        }
    }
}

/// Writes an extraction batch to `store`.
///
/// With `replace` the store is cleared first, which is how a full
/// re-extraction is loaded. `progress` is called with the number of
/// facts written so far.
pub fn ingest_batch<S: FactStore + ?Sized>(
    store: &mut S,
    batch: ExtractionBatch,
    replace: bool,
    mut progress: impl FnMut(usize),
) -> Result<IngestReport, StoreError> {
    let start = Instant::now();
    if replace {
        store.clear()?;
    }

    let mut report = IngestReport {
        unresolved: batch.unresolved.len(),
        ..IngestReport::default()
    };
    let mut written = 0;

    for node in batch.nodes {
        report.count_node(store.upsert_node(node)?);
        written += 1;
        progress(written);
    }
    for edge in batch.edges {
        report.count_edge(store.upsert_edge(edge)?);
        written += 1;
        progress(written);
    }
    for unresolved in batch.unresolved {
        debug!(
            "Unresolved import '{}' in {}",
            unresolved.specifier, unresolved.source
        );
        store.upsert_unresolved(unresolved)?;
    }

    store.flush()?;

    info!(
        "Ingested {} nodes ({} new), {} edges ({} new) in {:?}",
        report.nodes_created + report.nodes_updated,
        report.nodes_created,
        report.edges_created + report.edges_updated,
        report.edges_created,
        start.elapsed()
    );
    Ok(report)
}

/// Builds an index from everything in `store` with edges of `kind`.
/// Unresolved imports are carried over regardless of `kind`.
pub fn load_index<S: FactStore + ?Sized>(
    store: &S,
    kind: EdgeKind,
) -> Result<AdjacencyIndex, StoreError> {
    let mut builder = GraphBuilder::new();
    builder.add_nodes(store.fetch_all_nodes()?);
    builder.add_edges(store.fetch_all_edges(kind)?);
    builder.add_unresolved(store.fetch_all_unresolved()?);
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::thread;
    use tangle_core::{Edge, ImportSubtype, Node, NodeKind, UnresolvedImport};

    fn batch() -> ExtractionBatch {
        let mut batch = ExtractionBatch::new(
            vec![
                Node::new("src/a.ts", NodeKind::File),
                Node::new("src/b.ts", NodeKind::File),
            ],
            vec![
                Edge::import("src/a.ts", "src/b.ts", ImportSubtype::Named),
                Edge::import("src/b.ts", "src/c.ts", ImportSubtype::SideEffect),
            ],
        );
        batch.unresolved.push(UnresolvedImport {
            source: "src/a.ts".into(),
            specifier: "react".into(),
        });
        batch
    }

    #[test]
    fn test_ingest_and_load() {
        let mut store = MemoryStore::new();
        let mut calls = 0;
        let report = ingest_batch(&mut store, batch(), true, |_| calls += 1).unwrap();

        assert_eq!(report.nodes_created, 2);
        assert_eq!(report.edges_created, 2);
        assert_eq!(report.unresolved, 1);
        assert_eq!(calls, 4);

        let index = load_index(&store, EdgeKind::Imports).unwrap();
        assert_eq!(index.node_count(), 3);
        assert!(index.get_by_id("src/c.ts").unwrap().placeholder);
        assert_eq!(index.unresolved_of("src/a.ts"), ["react"]);
        assert!(!index.contains("react"));
    }

    #[test]
    fn test_repeated_imports_survive_the_store() {
        let batch = ExtractionBatch::new(
            vec![Node::new("a.ts", NodeKind::File), Node::new("b.ts", NodeKind::File)],
            vec![
                Edge::import("a.ts", "b.ts", ImportSubtype::Named),
                Edge::import("a.ts", "b.ts", ImportSubtype::SideEffect),
            ],
        );
        let direct = crate::GraphBuilder::from_batch(batch.clone()).build();

        let mut store = MemoryStore::new();
        ingest_batch(&mut store, batch, true, |_| {}).unwrap();
        let stored = load_index(&store, EdgeKind::Imports).unwrap();

        assert_eq!(stored.imports_of("a.ts"), direct.imports_of("a.ts"));
        assert_eq!(stored.edge_count(), 2);
    }

    #[test]
    fn test_append_versus_replace() {
        let mut store = MemoryStore::new();
        ingest_batch(&mut store, batch(), true, |_| {}).unwrap();

        let again = ingest_batch(&mut store, batch(), false, |_| {}).unwrap();
        assert_eq!(again.nodes_created, 0);
        assert_eq!(again.nodes_updated, 2);
        assert_eq!(again.edges_updated, 2);

        let small = ExtractionBatch::new(vec![Node::new("x.py", NodeKind::File)], vec![]);
        ingest_batch(&mut store, small, true, |_| {}).unwrap();
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let handle = Arc::new(SnapshotHandle::empty());
        let before = handle.load();

        let mut store = MemoryStore::new();
        ingest_batch(&mut store, batch(), true, |_| {}).unwrap();
        handle.publish(load_index(&store, EdgeKind::Imports).unwrap());

        assert!(before.is_empty());
        assert_eq!(handle.load().node_count(), 3);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || {
                    let index = handle.load();
                    index
                        .chain("src/a.ts", crate::TraversalDirection::Downstream, 3)
                        .total()
                })
            })
            .collect();
        for reader in readers {
            assert_eq!(reader.join().unwrap(), 2);
        }
    }
}
