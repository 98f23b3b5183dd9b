//! Compiled artifacts tracked by the dependency graph.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::facet::{Facet, Facets, KotlinMeta, NodeFacet};

/// Identity of a node: the JVM internal class name (`com/example/Foo`).
///
/// Serialized as a plain string. Dotted names read back in internal form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create an id, normalizing `.`-separated names to internal form.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.replace('.', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package part of the internal name (`com/example`), empty for the
    /// default package.
    pub fn package(&self) -> &str {
        self.0.rsplit_once('/').map(|(pkg, _)| pkg).unwrap_or("")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// An artifact produced by compiling a source: one compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Node {
    pub id: NodeId,
    /// Output path relative to the classes directory (`com/example/Foo.class`).
    pub out_file_path: String,
    /// Nodes this node depends on.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub usages: BTreeSet<NodeId>,
    #[serde(default, skip_serializing_if = "Facets::is_empty")]
    pub facets: Facets,
}

impl Node {
    /// A class node whose output path is derived from its internal name.
    pub fn class(id: impl Into<NodeId>) -> Self {
        let id = id.into();
        let out_file_path = format!("{}.class", id.as_str());
        Self {
            id,
            out_file_path,
            usages: BTreeSet::new(),
            facets: Facets::default(),
        }
    }

    pub fn with_usage(mut self, target: impl Into<NodeId>) -> Self {
        self.usages.insert(target.into());
        self
    }

    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.insert(facet);
        self
    }

    pub fn facet<T: NodeFacet>(&self) -> Option<&T> {
        self.facets.get::<T>()
    }

    /// Facade class name this node contributes to the Kotlin module index.
    pub fn facade_class_name(&self) -> Option<&str> {
        self.facet::<KotlinMeta>()?
            .facade_class_name(self.id.as_str())
    }

    pub fn is_kotlin(&self) -> bool {
        self.facet::<KotlinMeta>().is_some()
    }
}
