//! Node types for the dependency graph.
//!
//! A node is a uniquely identified code entity. Today that is always a
//! file, but the kind enum leaves room for finer-grained entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open map of kind-specific properties. Never used for identity.
pub type Attributes = BTreeMap<String, Scalar>;

/// A single attribute value.
///
/// Written untagged in JSON, so `{"size": 120, "ext": "ts"}` reads as
/// an `Int` and a `Str`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

/// The kind of entity a node represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A source file.
    #[default]
    File,

    /// A package or module referenced by name rather than by path.
    Module,

    /// A function or method.
    Function,

    /// A class, struct or interface.
    Class,
}

impl NodeKind {
    /// Guesses a kind from an id alone.
    ///
    /// Used for placeholder nodes: anything that looks like a path is a
    /// file, a bare specifier such as `react` is a module.
    pub fn infer(id: &str) -> Self {
        let looks_like_path = id.contains('/') || id.contains('\\');
        let has_extension = basename(id)
            .rsplit_once('.')
            .map(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .unwrap_or(false);

        if looks_like_path || has_extension {
            NodeKind::File
        } else {
            NodeKind::Module
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
        };
        write!(f, "{}", s)
    }
}

/// A vertex in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable unique identifier, usually a normalized file path.
    pub id: String,

    /// What kind of entity this is.
    pub kind: NodeKind,

    /// Display label. Defaults to the basename of the id.
    pub name: String,

    /// Kind-specific properties such as extension or size.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,

    /// True when the node was materialized only to satisfy an edge.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl Node {
    /// Creates a node whose name is the basename of `id`.
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        let name = basename(&id).to_string();
        Self {
            id,
            kind,
            name,
            attributes: Attributes::new(),
            placeholder: false,
        }
    }

    /// Creates a minimal node for an id that an edge referenced but the
    /// extractor never emitted.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = NodeKind::infer(&id);
        Self {
            placeholder: true,
            ..Self::new(id, kind)
        }
    }

    /// Overrides the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a single attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Folds a newer copy of the same node into this one.
    ///
    /// Name and kind take the newer values, attributes are merged with
    /// the newer value winning per key. A placeholder never overwrites a
    /// real node, and a real node clears the placeholder flag.
    pub fn merge(&mut self, newer: Node) {
        debug_assert_eq!(self.id, newer.id);

        if newer.placeholder && !self.placeholder {
            return;
        }

        self.kind = newer.kind;
        self.name = newer.name;
        self.attributes.extend(newer.attributes);
        self.placeholder = newer.placeholder;
    }
}

/// Returns the last path segment of an id, accepting `/` and `\`.
pub fn basename(id: &str) -> &str {
    id.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(id)
}
