//! Edge types for the dependency graph.
//!
//! Edges are directed and typed. The graph is a multigraph: the same
//! pair of files can be linked by several import statements, each with
//! its own subtype.

use crate::node::{Attributes, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The type of relationship between two nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// File A imports from file B.
    #[default]
    Imports,

    /// Function A calls function B.
    Calls,

    /// Class A extends class B.
    Extends,

    /// Class implements interface/trait.
    Implements,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Imports => "imports",
            Self::Calls => "calls",
            Self::Extends => "extends",
            Self::Implements => "implements",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EdgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "imports" => Ok(Self::Imports),
            "calls" => Ok(Self::Calls),
            "extends" => Ok(Self::Extends),
            "implements" => Ok(Self::Implements),
            other => Err(format!("unknown edge kind '{}'", other)),
        }
    }
}

/// How an import statement binds the imported module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSubtype {
    /// `import foo from "./foo"`
    Default,
    /// `import { a, b } from "./foo"`
    Named,
    /// `import * as foo from "./foo"`
    Namespace,
    /// `import "./foo"`
    SideEffect,
}

impl ImportSubtype {
    /// Classifies an import clause. First match wins: default binding,
    /// then namespace binding, then named bindings, else side effect.
    pub fn classify(clause: &ImportClause) -> Self {
        if clause.default.is_some() {
            ImportSubtype::Default
        } else if clause.namespace.is_some() {
            ImportSubtype::Namespace
        } else if !clause.named.is_empty() {
            ImportSubtype::Named
        } else {
            ImportSubtype::SideEffect
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Named => "named",
            Self::Namespace => "namespace",
            Self::SideEffect => "side_effect",
        }
    }
}

impl fmt::Display for ImportSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The binding shape of an import statement, as seen by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportClause {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub named: Vec<String>,
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,

    /// Binding shape, only meaningful for imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<ImportSubtype>,

    /// Free-form metadata such as the unresolved import specifier.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Edge {
    /// Creates a new edge.
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            subtype: None,
            attributes: Attributes::new(),
        }
    }

    /// Creates an import edge with a subtype.
    pub fn import(
        source: impl Into<String>,
        target: impl Into<String>,
        subtype: ImportSubtype,
    ) -> Self {
        Self::new(source, target, EdgeKind::Imports).with_subtype(subtype)
    }

    pub fn with_subtype(mut self, subtype: ImportSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(default: Option<&str>, namespace: Option<&str>, named: &[&str]) -> ImportClause {
        ImportClause {
            default: default.map(String::from),
            namespace: namespace.map(String::from),
            named: named.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            ImportSubtype::classify(&clause(Some("React"), None, &["useState"])),
            ImportSubtype::Default
        );
        assert_eq!(
            ImportSubtype::classify(&clause(None, Some("path"), &[])),
            ImportSubtype::Namespace
        );
        assert_eq!(
            ImportSubtype::classify(&clause(None, None, &["a", "b"])),
            ImportSubtype::Named
        );
        assert_eq!(
            ImportSubtype::classify(&ImportClause::default()),
            ImportSubtype::SideEffect
        );
    }

    #[test]
    fn test_edge_kind_round_trips_through_str() {
        assert_eq!("imports".parse::<EdgeKind>(), Ok(EdgeKind::Imports));
        assert_eq!("Calls".parse::<EdgeKind>(), Ok(EdgeKind::Calls));
        assert!("requires".parse::<EdgeKind>().is_err());
        assert_eq!(EdgeKind::Implements.to_string(), "implements");
    }

    #[test]
    fn test_subtype_serializes_snake_case() {
        let edge = Edge::import("a.ts", "b.ts", ImportSubtype::SideEffect);
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["subtype"], "side_effect");
        assert_eq!(json["kind"], "imports");
        assert!(json.get("attributes").is_none());
    }
}
