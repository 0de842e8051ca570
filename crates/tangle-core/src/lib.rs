//! Tangle Core - Graph model for source dependency analysis
//!
//! This crate defines the vocabulary every other Tangle crate speaks:
//! typed nodes and edges, the open attribute map, the import subtype
//! rule, and the batch format the extractor hands us.
//!
//! Tangle does not parse source code. An external extractor walks the
//! tree and emits a flat list of nodes and edges; this crate is where
//! that output lands.
//!
//! # Example
//!
//! ```no_run
//! use tangle_core::{Edge, ImportSubtype, Node, NodeKind};
//!
//! let app = Node::new("src/app.ts", NodeKind::File).with_attribute("size", 120);
//! let util = Node::new("src/util.ts", NodeKind::File);
//! let edge = Edge::import(&app.id, &util.id, ImportSubtype::Named);
//!
//! assert_eq!(app.name, "app.ts");
//! assert_eq!(edge.subtype, Some(ImportSubtype::Named));
//! ```

pub mod edge;
pub mod error;
pub mod extract;
pub mod node;

pub use edge::{Edge, EdgeKind, ImportClause, ImportSubtype};
pub use error::{CoreError, Result};
pub use extract::{ExtractionBatch, UnresolvedImport};
pub use node::{basename, Attributes, Node, NodeKind, Scalar};
