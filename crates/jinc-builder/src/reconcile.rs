//! Kotlin module index (`META-INF/<module>.kotlin_module`).
//!
//! The index lists, per package, the file facades and multi-file class parts
//! of the module. It is derived from the committed graph every round and
//! never patched in place:
//!
//! ```json
//! { "module": "app",
//!   "package-parts": {
//!     "com.example": {
//!       "file-facades": ["UtilsKt"],
//!       "multi-file-class-parts": { "Multi__AKt": "Multi" } } } }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use jinc_core::facet::{KotlinClassKind, KotlinMeta};
use jinc_core::node::NodeId;
use jinc_core::paths::kotlin_module_entry;
use jinc_core::source::NodeSource;
use jinc_graph::DependencyGraph;
use jinc_util::errors::JincError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleIndex {
    pub module: String,
    pub package_parts: BTreeMap<String, PackageParts>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageParts {
    #[serde(default)]
    pub file_facades: BTreeSet<String>,
    /// Part short name -> facade short name.
    #[serde(default)]
    pub multi_file_class_parts: BTreeMap<String, String>,
}

fn split_name(id: &str) -> (String, String) {
    match id.rsplit_once('/') {
        Some((pkg, simple)) => (pkg.replace('/', "."), simple.to_string()),
        None => (String::new(), id.to_string()),
    }
}

fn join_name(package: &str, simple: &str) -> String {
    if package.is_empty() {
        simple.to_string()
    } else {
        format!("{}/{simple}", package.replace('.', "/"))
    }
}

impl ModuleIndex {
    /// Index of the Kotlin nodes in `graph` whose owner is not in `dirty`.
    ///
    /// `None` when the graph holds no Kotlin classes at all.
    pub fn from_graph(
        graph: &DependencyGraph,
        dirty: &BTreeSet<NodeSource>,
        module: &str,
    ) -> Option<Self> {
        let mut has_kotlin = false;
        let mut index = ModuleIndex {
            module: module.to_string(),
            package_parts: BTreeMap::new(),
        };
        for (owner, node) in graph.nodes() {
            let Some(meta) = node.facet::<KotlinMeta>() else {
                continue;
            };
            has_kotlin = true;
            if dirty.contains(owner) {
                continue;
            }
            let (package, simple) = split_name(node.id.as_str());
            match &meta.class_kind {
                KotlinClassKind::FileFacade => {
                    index
                        .package_parts
                        .entry(package)
                        .or_default()
                        .file_facades
                        .insert(simple);
                }
                KotlinClassKind::MultiFileClassPart { facade_class_name } => {
                    let (_, facade) = split_name(facade_class_name.as_str());
                    index
                        .package_parts
                        .entry(package)
                        .or_default()
                        .multi_file_class_parts
                        .insert(simple, facade);
                }
                _ => {}
            }
        }
        has_kotlin.then_some(index)
    }

    /// Facade class names listed in the index, as internal names.
    pub fn facade_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for (package, parts) in &self.package_parts {
            for facade in &parts.file_facades {
                names.insert(join_name(package, facade));
            }
            for facade in parts.multi_file_class_parts.values() {
                names.insert(join_name(package, facade));
            }
        }
        names
    }

    pub fn parse(bytes: &[u8]) -> miette::Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            JincError::Generic {
                message: format!("malformed Kotlin module index: {e}"),
            }
            .into()
        })
    }

    pub fn to_bytes(&self) -> miette::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(|e| JincError::Generic {
            message: format!("cannot encode Kotlin module index: {e}"),
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Facade class names of graph nodes owned by sources outside `dirty`.
pub fn graph_facade_names(graph: &DependencyGraph, dirty: &BTreeSet<NodeSource>) -> BTreeSet<String> {
    graph
        .nodes()
        .filter(|(owner, _)| !dirty.contains(*owner))
        .filter_map(|(_, node)| node.facade_class_name())
        .map(|name| NodeId::new(name).as_str().to_string())
        .collect()
}

/// Regenerate the module index under `classes_dir`.
///
/// Returns the index path when one was written; a stale index is removed when
/// the graph has no Kotlin classes.
pub fn reconcile(
    graph: &DependencyGraph,
    dirty: &BTreeSet<NodeSource>,
    module: &str,
    classes_dir: &Path,
) -> miette::Result<Option<PathBuf>> {
    let path = classes_dir.join(kotlin_module_entry(module));
    match ModuleIndex::from_graph(graph, dirty, module) {
        Some(index) => {
            jinc_util::fs::write_atomic(&path, &index.to_bytes()?).map_err(JincError::Io)?;
            tracing::debug!(
                "wrote module index with {} facades",
                index.facade_names().len()
            );
            Ok(Some(path))
        }
        None => {
            if jinc_util::fs::remove_file_pruning(&path, classes_dir).map_err(JincError::Io)? {
                tracing::debug!("removed stale module index {}", path.display());
            }
            Ok(None)
        }
    }
}
