//! Tangle Graph - dependency graph queries
//!
//! This crate turns extractor output into an immutable adjacency index
//! and answers structural questions about it: dependency chains,
//! connections between two files, rankings, clustering, cycle-safe
//! trees and bounded projections for drawing.
//!
//! # Architecture
//!
//! The index wraps a petgraph `DiGraph` with:
//! - An id lookup table
//! - Forward and reverse adjacency lists in edge insertion order
//!
//! Facts are persisted through the [`FactStore`] trait, either in
//! memory or in an embedded sled database, and a [`SnapshotHandle`]
//! publishes freshly built indexes to concurrent readers.
//!
//! # Example
//!
//! ```no_run
//! use tangle_graph::{AdjacencyIndex, TraversalDirection};
//! use tangle_core::{Edge, ImportSubtype, Node, NodeKind};
//!
//! let index = AdjacencyIndex::from_parts(
//!     vec![Node::new("a.ts", NodeKind::File), Node::new("b.ts", NodeKind::File)],
//!     vec![Edge::import("a.ts", "b.ts", ImportSubtype::Named)],
//! );
//!
//! let chain = index.chain("a.ts", TraversalDirection::Downstream, 3);
//! let link = index.connect("a.ts", "b.ts", 4);
//! ```

mod builder;
mod cluster;
mod connection;
mod cycles;
mod index;
mod projection;
mod ranking;
mod snapshot;
pub mod store;
mod traversal;
mod tree;

pub use builder::{BuildReport, GraphBuilder};
pub use cluster::{
    parent_directory, top_level, ClusterReport, GroupBy, GroupCoupling, GroupKey, GroupSize,
};
pub use connection::{Connection, LinkDirection};
pub use cycles::CircularDependency;
pub use index::{AdjacencyIndex, Adjacent, GraphStats, ImportRef, NodeId};
pub use projection::{ProjectedNode, Projection};
pub use ranking::RankedNode;
pub use snapshot::{ingest_batch, load_index, IngestReport, SnapshotHandle};
pub use store::{FactStore, MemoryStore, SledStore, StoreError, Upsert};
pub use traversal::{DependencyChain, TraversalDirection};
pub use tree::TreeNode;
