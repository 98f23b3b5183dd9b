//! Dirty-scope computation.
//!
//! Usage edges are collapsed to source granularity and walked backwards from
//! the changed sources: a source is dirty when any of its nodes uses a node
//! owned by a dirty source. The walk keeps one discovered set across all seeds,
//! so cycles and shared dependents are visited once.

use std::collections::BTreeSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{Dfs, Reversed};

use jinc_core::source::NodeSource;

use crate::graph::DependencyGraph;

/// Sources that must be recompiled in a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyScope {
    changed: BTreeSet<NodeSource>,
    sources: BTreeSet<NodeSource>,
}

impl DirtyScope {
    /// Sources whose content changed, appeared or disappeared.
    pub fn changed(&self) -> &BTreeSet<NodeSource> {
        &self.changed
    }

    /// The whole scope: changed sources and their transitive dependents.
    pub fn sources(&self) -> &BTreeSet<NodeSource> {
        &self.sources
    }

    /// Sources pulled in only through usage edges.
    pub fn dependents(&self) -> BTreeSet<NodeSource> {
        self.sources.difference(&self.changed).cloned().collect()
    }

    pub fn contains(&self, source: &NodeSource) -> bool {
        self.sources.contains(source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Compute the dirty scope of `changed` against the previous round's graph.
pub fn differentiate(graph: &DependencyGraph, changed: &BTreeSet<NodeSource>) -> DirtyScope {
    let source_graph = source_graph(graph, changed);
    let reversed = Reversed(&source_graph);

    let mut sources = BTreeSet::new();
    let mut dfs = Dfs::empty(reversed);
    for seed in changed {
        dfs.move_to(seed);
        while let Some(source) = dfs.next(reversed) {
            sources.insert(source.clone());
        }
    }

    tracing::debug!(
        "dirty scope: {} changed, {} total",
        changed.len(),
        sources.len()
    );
    DirtyScope {
        changed: changed.clone(),
        sources,
    }
}

/// Source-level usage graph: an edge `a -> b` means a node of `a` uses a node of `b`.
fn source_graph<'a>(
    graph: &'a DependencyGraph,
    seeds: &'a BTreeSet<NodeSource>,
) -> DiGraphMap<&'a NodeSource, ()> {
    let mut g = DiGraphMap::new();
    for seed in seeds {
        g.add_node(seed);
    }
    for (owner, node) in graph.nodes() {
        g.add_node(owner);
        for target in &node.usages {
            if let Some(target_owner) = graph.owner_of(target) {
                if target_owner != owner {
                    g.add_edge(owner, target_owner, ());
                }
            }
        }
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use jinc_core::node::Node;

    #[test]
    fn test_source_graph_skips_self_edges_and_unknown_targets() {
        let mut graph = DependencyGraph::new();
        graph
            .merge(
                &"A.java".into(),
                vec![
                    Node::class("A").with_usage("A$Inner"),
                    Node::class("A$Inner").with_usage("Missing"),
                ],
            )
            .unwrap();
        let seeds = BTreeSet::new();
        let g = source_graph(&graph, &seeds);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }
}
