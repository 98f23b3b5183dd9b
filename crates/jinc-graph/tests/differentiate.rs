use std::collections::BTreeSet;

use jinc_core::node::Node;
use jinc_core::source::NodeSource;
use jinc_graph::{differentiate, DependencyGraph};

fn src(key: &str) -> NodeSource {
    NodeSource::new(key)
}

fn set(keys: &[&str]) -> BTreeSet<NodeSource> {
    keys.iter().map(|k| src(k)).collect()
}

/// A <- B <- D, C unrelated.
fn chain() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph.merge(&src("A.java"), vec![Node::class("A")]).unwrap();
    graph
        .merge(&src("B.java"), vec![Node::class("B").with_usage("A")])
        .unwrap();
    graph.merge(&src("C.java"), vec![Node::class("C")]).unwrap();
    graph
        .merge(&src("D.java"), vec![Node::class("D").with_usage("B")])
        .unwrap();
    graph
}

#[test]
fn test_edit_pulls_in_transitive_dependents() {
    let scope = differentiate(&chain(), &set(&["A.java"]));
    assert_eq!(scope.sources(), &set(&["A.java", "B.java", "D.java"]));
    assert_eq!(scope.dependents(), set(&["B.java", "D.java"]));
    assert!(!scope.contains(&src("C.java")));
}

#[test]
fn test_leaf_change_stays_local() {
    let scope = differentiate(&chain(), &set(&["D.java"]));
    assert_eq!(scope.sources(), &set(&["D.java"]));
}

#[test]
fn test_removed_source_pulls_in_users() {
    let scope = differentiate(&chain(), &set(&["B.java"]));
    assert_eq!(scope.sources(), &set(&["B.java", "D.java"]));
}

#[test]
fn test_added_source_unknown_to_graph_is_in_scope() {
    let scope = differentiate(&chain(), &set(&["E.java"]));
    assert_eq!(scope.sources(), &set(&["E.java"]));
}

#[test]
fn test_empty_change_is_empty_scope() {
    let scope = differentiate(&chain(), &BTreeSet::new());
    assert!(scope.is_empty());
}

#[test]
fn test_cycles_terminate() {
    let mut graph = DependencyGraph::new();
    graph
        .merge(&src("X.java"), vec![Node::class("X").with_usage("Y")])
        .unwrap();
    graph
        .merge(&src("Y.java"), vec![Node::class("Y").with_usage("X")])
        .unwrap();
    graph
        .merge(&src("Z.java"), vec![Node::class("Z").with_usage("Y")])
        .unwrap();
    let scope = differentiate(&graph, &set(&["X.java"]));
    assert_eq!(scope.sources(), &set(&["X.java", "Y.java", "Z.java"]));
}

#[test]
fn test_closure_soundness_over_every_edge() {
    let graph = chain();
    for changed in graph.sources() {
        let scope = differentiate(&graph, &BTreeSet::from([changed.clone()]));
        for (owner, node) in graph.nodes() {
            for target in &node.usages {
                if graph.owner_of(target).is_some_and(|o| scope.contains(o)) {
                    assert!(scope.contains(owner), "{owner} missing for {changed}");
                }
            }
        }
    }
}

#[test]
fn test_multiple_seeds_share_visits() {
    let scope = differentiate(&chain(), &set(&["A.java", "B.java", "C.java"]));
    assert_eq!(scope.len(), 4);
    assert_eq!(scope.changed(), &set(&["A.java", "B.java", "C.java"]));
}
