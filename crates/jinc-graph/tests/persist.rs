use jinc_core::facet::{Facet, KotlinClassKind, KotlinMeta};
use jinc_core::node::Node;
use jinc_core::source::NodeSource;
use jinc_graph::persist::{load_graph, save_graph, NODES_MAPLET, SOURCES_MAPLET};
use jinc_graph::{DependencyGraph, MapletStore};

fn sample() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph
        .merge(&NodeSource::new("src/A.kt"), vec![
            Node::class("p/AKt")
                .with_facet(Facet::Kotlin(KotlinMeta::new(KotlinClassKind::FileFacade))),
        ])
        .unwrap();
    graph
        .merge(
            &NodeSource::new("src/B.java"),
            vec![Node::class("p/B").with_usage("p/AKt")],
        )
        .unwrap();
    graph
}

#[test]
fn test_graph_survives_store_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("dep-graph.mv");
    let lock = tmp.path().join(".lock");
    let graph = sample();

    let mut store = MapletStore::open(&path, &lock).unwrap();
    save_graph(&mut store, &graph).unwrap();
    store.close().unwrap();

    let store = MapletStore::open_read_only(&path);
    assert_eq!(load_graph(&store), Some(graph));
}

#[test]
fn test_save_deletes_stale_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("dep-graph.mv");
    let lock = tmp.path().join(".lock");
    let mut graph = sample();

    let mut store = MapletStore::open(&path, &lock).unwrap();
    save_graph(&mut store, &graph).unwrap();
    graph.remove(&NodeSource::new("src/B.java"));
    save_graph(&mut store, &graph).unwrap();

    assert_eq!(store.keys(SOURCES_MAPLET), vec!["src/A.kt"]);
    assert_eq!(store.keys(NODES_MAPLET), vec!["p/AKt"]);
    assert_eq!(load_graph(&store), Some(graph));
}

#[test]
fn test_inconsistent_maplets_load_as_absent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("dep-graph.mv");
    let lock = tmp.path().join(".lock");

    let mut store = MapletStore::open(&path, &lock).unwrap();
    save_graph(&mut store, &sample()).unwrap();
    store.delete(NODES_MAPLET, "p/B");
    assert_eq!(load_graph(&store), None);
}

#[test]
fn test_orphan_node_entry_loads_as_absent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("dep-graph.mv");
    let lock = tmp.path().join(".lock");

    let mut store = MapletStore::open(&path, &lock).unwrap();
    save_graph(&mut store, &sample()).unwrap();
    store.put(NODES_MAPLET, "p/Orphan", &Node::class("p/Orphan")).unwrap();
    assert_eq!(load_graph(&store), None);
}

#[test]
fn test_empty_store_loads_empty_graph() {
    let tmp = tempfile::tempdir().unwrap();
    let store = MapletStore::open_read_only(&tmp.path().join("missing.mv"));
    assert_eq!(load_graph(&store), Some(DependencyGraph::new()));
}
