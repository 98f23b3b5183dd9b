//! Mapping between a [`DependencyGraph`] and its maplets.
//!
//! `sources` maps a source key to the ids of the nodes it owns; `nodes` maps a
//! node id to the serialized node.

use std::collections::BTreeSet;

use jinc_core::node::{Node, NodeId};
use jinc_core::source::NodeSource;

use crate::graph::DependencyGraph;
use crate::maplet::MapletStore;

pub const SOURCES_MAPLET: &str = "sources";
pub const NODES_MAPLET: &str = "nodes";

/// Rebuild the graph held by `store`.
///
/// Returns `None` when the stored maplets contradict each other (a source
/// listing a missing node, a node owned twice, or an undecodable entry); the
/// graph must then be treated as absent.
pub fn load_graph(store: &MapletStore) -> Option<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    let mut listed = BTreeSet::new();
    for key in store.keys(SOURCES_MAPLET) {
        let source = NodeSource::new(key.as_str());
        let ids: Vec<NodeId> = match store.get(SOURCES_MAPLET, &key) {
            Ok(Some(ids)) => ids,
            _ => {
                tracing::warn!("stored graph has an unreadable entry for {source}");
                return None;
            }
        };
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            let node: Node = match store.get(NODES_MAPLET, id.as_str()) {
                Ok(Some(node)) => node,
                _ => {
                    tracing::warn!("stored graph lists node {id} of {source} but has no entry for it");
                    return None;
                }
            };
            if node.id != id {
                tracing::warn!("stored node entry {id} holds node {}", node.id);
                return None;
            }
            listed.insert(id);
            nodes.push(node);
        }
        if let Err(e) = graph.merge(&source, nodes) {
            tracing::warn!("stored graph is inconsistent: {e}");
            return None;
        }
    }
    let unowned = store
        .keys(NODES_MAPLET)
        .into_iter()
        .filter(|key| !listed.contains(&NodeId::new(key.as_str())))
        .count();
    if unowned > 0 {
        tracing::warn!("stored graph has {unowned} nodes without an owning source");
        return None;
    }
    Some(graph)
}

/// Write `graph` into the store, deleting entries it no longer holds.
///
/// Nothing is durable until the store is snapshotted.
pub fn save_graph(store: &mut MapletStore, graph: &DependencyGraph) -> miette::Result<()> {
    let sources = graph.sources();
    for key in store.keys(SOURCES_MAPLET) {
        if !sources.contains(&NodeSource::new(key.as_str())) {
            store.delete(SOURCES_MAPLET, &key);
        }
    }
    for key in store.keys(NODES_MAPLET) {
        if graph.node(&NodeId::new(key.as_str())).is_none() {
            store.delete(NODES_MAPLET, &key);
        }
    }
    for source in &sources {
        let ids: Vec<&NodeId> = graph.nodes_of(source).into_iter().map(|n| &n.id).collect();
        store.put(SOURCES_MAPLET, source.as_str(), &ids)?;
    }
    for (_, node) in graph.nodes() {
        store.put(NODES_MAPLET, node.id.as_str(), node)?;
    }
    Ok(())
}
