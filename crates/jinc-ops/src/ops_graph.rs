//! Operation: dump the committed dependency graph.

use std::fmt::Write;
use std::path::Path;

use jinc_graph::persist::load_graph;
use jinc_graph::{DependencyGraph, MapletStore};
use jinc_util::errors::JincError;

use crate::ProjectContext;

/// Load the graph committed by the last round.
pub fn load(project_dir: &Path) -> miette::Result<DependencyGraph> {
    let project = ProjectContext::load(project_dir)?;
    let path = project.layout.graph_path();
    let store = MapletStore::open_read_only(&path);
    if store.recovered() {
        return Err(JincError::Generic {
            message: format!("no usable dependency graph at {}; run `jinc build` first", path.display()),
        }
        .into());
    }
    load_graph(&store).ok_or_else(|| {
        JincError::Storage {
            message: format!("dependency graph at {} is inconsistent", path.display()),
        }
        .into()
    })
}

/// Render `graph` as indented text, one block per source:
///
/// ```text
/// src/B.java
///   B -> B.class
///     uses A
/// ```
pub fn render(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for source in graph.sources() {
        let _ = writeln!(out, "{source}");
        for node in graph.nodes_of(&source) {
            let kind = if node.is_kotlin() { " (kotlin)" } else { "" };
            let _ = writeln!(out, "  {} -> {}{kind}", node.id, node.out_file_path);
            for usage in &node.usages {
                let _ = writeln!(out, "    uses {usage}");
            }
        }
    }
    let _ = writeln!(
        out,
        "{} sources, {} nodes, {} edges",
        graph.sources().len(),
        graph.node_count(),
        graph.edge_count()
    );
    out
}
