//! Typed metadata facets attached to compiled nodes.
//!
//! Facets keep language-specific knowledge out of the graph core: the graph
//! stores and persists them opaquely, and only the consumers that understand
//! a facet kind (the module metadata reconciler, the validator) look inside.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// One metadata attachment on a [`crate::node::Node`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Facet {
    /// Kotlin class metadata (`@kotlin.Metadata`).
    Kotlin(KotlinMeta),
}

impl Facet {
    /// Stable key of the facet kind; a node carries at most one facet per kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Facet::Kotlin(_) => "kotlin",
        }
    }
}

/// Implemented by facet payload types to allow typed lookup on a node.
pub trait NodeFacet {
    fn from_facet(facet: &Facet) -> Option<&Self>;
}

/// Kotlin metadata attached to a compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KotlinMeta {
    pub class_kind: KotlinClassKind,
}

/// The Kotlin metadata kind of a compiled class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KotlinClassKind {
    Class,
    /// Top-level declarations of one file (`FooKt`).
    FileFacade,
    /// Facade of a `@JvmMultifileClass`.
    MultiFileClassFacade,
    /// One file part of a multi-file facade.
    #[serde(rename_all = "kebab-case")]
    MultiFileClassPart { facade_class_name: NodeId },
    SyntheticClass,
}

impl KotlinClassKind {
    /// A multi-file part of `facade`, which may be given in dotted form.
    pub fn part_of(facade: impl Into<NodeId>) -> Self {
        KotlinClassKind::MultiFileClassPart {
            facade_class_name: facade.into(),
        }
    }
}

impl KotlinMeta {
    pub fn new(class_kind: KotlinClassKind) -> Self {
        Self { class_kind }
    }

    /// Name of the facade this class contributes to the module index, given
    /// the class's own internal name.
    pub fn facade_class_name<'a>(&'a self, class_name: &'a str) -> Option<&'a str> {
        match &self.class_kind {
            KotlinClassKind::FileFacade => Some(class_name),
            KotlinClassKind::MultiFileClassPart { facade_class_name } => {
                Some(facade_class_name.as_str())
            }
            _ => None,
        }
    }
}

impl NodeFacet for KotlinMeta {
    fn from_facet(facet: &Facet) -> Option<&Self> {
        match facet {
            Facet::Kotlin(meta) => Some(meta),
        }
    }
}

/// The facet set of a node, keyed by [`Facet::kind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facets(Vec<Facet>);

impl Facets {
    /// Attach a facet, replacing any existing facet of the same kind.
    pub fn insert(&mut self, facet: Facet) {
        self.0.retain(|f| f.kind() != facet.kind());
        self.0.push(facet);
        self.0.sort_by_key(|f| f.kind());
    }

    pub fn get<T: NodeFacet>(&self) -> Option<&T> {
        self.0.iter().find_map(T::from_facet)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facet> {
        self.0.iter()
    }
}
