//! Consistency checks between the committed graph, configuration state and
//! the packaged archive.

use std::collections::{BTreeMap, BTreeSet};

use jinc_core::paths::{kotlin_module_entry, OutputLayout};
use jinc_core::source::NodeSource;
use jinc_graph::persist::load_graph;
use jinc_graph::MapletStore;

use crate::config_state::ConfigurationState;
use crate::descriptor::KOTLIN_METADATA_MARKER;
use crate::output;
use crate::reconcile::{graph_facade_names, ModuleIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub problems: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    fn problem(&mut self, message: impl Into<String>) {
        self.problems.push(message.into());
    }
}

/// Validate the output of the last committed round.
///
/// 1. a clean round: the archive holds exactly the graph's classes;
/// 2. a failed round: archive classes are a subset of the graph's, classes of
///    dirty sources are absent, classes of clean sources are present;
/// 3. dirty sources are exactly the sources with a blank digest, and own no classes;
/// 4. Kotlin bytecode in the archive comes with a `.kotlin_module` index;
/// 5. the index lists exactly the facades of the graph minus dirty sources.
pub fn validate_output(layout: &OutputLayout, module_name: &str) -> miette::Result<ValidationReport> {
    let mut report = ValidationReport::default();

    let store = MapletStore::open_read_only(&layout.graph_path());
    let graph = if store.recovered() {
        None
    } else {
        load_graph(&store)
    };
    let Some(graph) = graph else {
        report.problem("dependency graph is missing or corrupt");
        return Ok(report);
    };
    let Some(state) = ConfigurationState::load(&layout.config_state_path()) else {
        report.problem("configuration state is missing or corrupt");
        return Ok(report);
    };
    if state.generation != store.generation() {
        report.problem(format!(
            "graph generation {} does not match configuration state generation {}",
            store.generation(),
            state.generation
        ));
    }
    let archive_path = layout.archive_path();
    if !archive_path.is_file() {
        report.problem(format!("archive {} does not exist", archive_path.display()));
        return Ok(report);
    }
    let archive = output::read_archive(&archive_path)?;

    let dirty = state.dirty_sources();
    let graph_classes: BTreeMap<&str, &NodeSource> = graph
        .nodes()
        .map(|(owner, node)| (node.out_file_path.as_str(), owner))
        .collect();
    let archive_classes: BTreeSet<&str> = archive
        .keys()
        .map(String::as_str)
        .filter(|name| name.ends_with(".class"))
        .collect();

    for source in &dirty {
        if !graph.nodes_of(source).is_empty() {
            report.problem(format!("dirty source {source} still owns classes in the graph"));
        }
    }
    for source in graph.sources() {
        if state.digest(&source).map_or(true, |d| d.is_empty()) {
            report.problem(format!("source {source} owns classes but has no committed digest"));
        }
    }

    if dirty.is_empty() {
        for class in graph_classes.keys() {
            if !archive_classes.contains(class) {
                report.problem(format!("class {class} is in the graph but not in the archive"));
            }
        }
        for class in &archive_classes {
            if !graph_classes.contains_key(class) {
                report.problem(format!("class {class} is in the archive but not in the graph"));
            }
        }
    } else {
        for class in &archive_classes {
            if !graph_classes.contains_key(class) {
                report.problem(format!("stale class {class} in the archive after a failed round"));
            }
        }
        for (class, owner) in &graph_classes {
            let present = archive_classes.contains(class);
            if dirty.contains(*owner) && present {
                report.problem(format!("class {class} of dirty source {owner} is in the archive"));
            }
            if !dirty.contains(*owner) && !present {
                report.problem(format!("class {class} of clean source {owner} is missing from the archive"));
            }
        }
    }

    let index_entry = kotlin_module_entry(module_name);
    let has_kotlin_bytecode = archive
        .iter()
        .filter(|(name, _)| name.ends_with(".class"))
        .any(|(_, bytes)| {
            bytes
                .windows(KOTLIN_METADATA_MARKER.len())
                .any(|w| w == KOTLIN_METADATA_MARKER)
        });
    if has_kotlin_bytecode && !archive.contains_key(&index_entry) {
        report.problem(format!("archive has Kotlin classes but no {index_entry}"));
    }

    if let Some(bytes) = archive.get(&index_entry) {
        match ModuleIndex::parse(bytes) {
            Ok(index) => {
                let listed = index.facade_names();
                let expected = graph_facade_names(&graph, &dirty);
                for name in expected.difference(&listed) {
                    report.problem(format!("facade {name} is missing from {index_entry}"));
                }
                for name in listed.difference(&expected) {
                    report.problem(format!("{index_entry} lists unexpected facade {name}"));
                }
            }
            Err(e) => report.problem(format!("{index_entry} is unreadable: {e}")),
        }
    }

    tracing::debug!("validation found {} problems", report.problems.len());
    Ok(report)
}
