//! In-memory dependency graph of one build target.

use std::collections::{BTreeMap, BTreeSet};

use jinc_core::node::{Node, NodeId};
use jinc_core::source::NodeSource;

use crate::error::GraphError;

/// Sources, the nodes they own, and the usage edges between nodes.
///
/// Nodes and sources are addressed by key; edges are plain [`NodeId`]s held
/// in [`Node::usages`] and never keep their target alive. A reverse index from
/// usage target to users is kept in step with every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    sources: BTreeMap<NodeSource, BTreeSet<NodeId>>,
    nodes: BTreeMap<NodeId, OwnedNode>,
    users: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OwnedNode {
    owner: NodeSource,
    node: Node,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sources that own at least one node.
    pub fn sources(&self) -> BTreeSet<NodeSource> {
        self.sources.keys().cloned().collect()
    }

    pub fn contains_source(&self, source: &NodeSource) -> bool {
        self.sources.contains_key(source)
    }

    /// Nodes owned by `source`; empty for unknown sources.
    pub fn nodes_of(&self, source: &NodeSource) -> Vec<&Node> {
        self.sources
            .get(source)
            .into_iter()
            .flatten()
            .filter_map(|id| self.node(id))
            .collect()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|owned| &owned.node)
    }

    pub fn owner_of(&self, id: &NodeId) -> Option<&NodeSource> {
        self.nodes.get(id).map(|owned| &owned.owner)
    }

    /// Every node with its owning source, ordered by node id.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeSource, &Node)> {
        self.nodes.values().map(|owned| (&owned.owner, &owned.node))
    }

    /// Sources owning a node with a usage edge pointing at `id`.
    pub fn dependents(&self, id: &NodeId) -> BTreeSet<NodeSource> {
        self.users
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|user| self.owner_of(user).cloned())
            .collect()
    }

    /// Replace every node owned by `source` with `new_nodes`.
    ///
    /// Fails without touching the graph if a new node id is already owned by
    /// another source or appears twice in `new_nodes`. Merging an empty set
    /// leaves the source without nodes, so it drops out of [`Self::sources`].
    pub fn merge(&mut self, source: &NodeSource, new_nodes: Vec<Node>) -> Result<(), GraphError> {
        let mut seen = BTreeSet::new();
        for node in &new_nodes {
            if let Some(existing) = self.owner_of(&node.id) {
                if existing != source {
                    return Err(GraphError::DuplicateNode {
                        node: node.id.clone(),
                        existing: existing.clone(),
                        incoming: source.clone(),
                    });
                }
            }
            if !seen.insert(node.id.clone()) {
                return Err(GraphError::DuplicateNode {
                    node: node.id.clone(),
                    existing: source.clone(),
                    incoming: source.clone(),
                });
            }
        }

        self.remove(source);
        if new_nodes.is_empty() {
            return Ok(());
        }
        let ids = self.sources.entry(source.clone()).or_default();
        for node in new_nodes {
            ids.insert(node.id.clone());
            for target in &node.usages {
                self.users
                    .entry(target.clone())
                    .or_default()
                    .insert(node.id.clone());
            }
            self.nodes.insert(
                node.id.clone(),
                OwnedNode {
                    owner: source.clone(),
                    node,
                },
            );
        }
        Ok(())
    }

    /// Delete `source` and every node it owns. Returns the removed nodes.
    pub fn remove(&mut self, source: &NodeSource) -> Vec<Node> {
        let Some(ids) = self.sources.remove(source) else {
            return Vec::new();
        };
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(owned) = self.nodes.remove(&id) else {
                continue;
            };
            for target in &owned.node.usages {
                if let Some(users) = self.users.get_mut(target) {
                    users.remove(&id);
                    if users.is_empty() {
                        self.users.remove(target);
                    }
                }
            }
            removed.push(owned.node);
        }
        removed
    }

    /// Usage edges whose target node is not in the graph, as `(user, target)`.
    pub fn dangling_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.users
            .iter()
            .filter(|(target, _)| !self.nodes.contains_key(*target))
            .flat_map(|(target, users)| {
                users
                    .iter()
                    .map(move |user| (user.clone(), target.clone()))
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.users.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
