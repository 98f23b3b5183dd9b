mod common;

use std::collections::BTreeSet;

use jinc_builder::output::read_archive;
use jinc_builder::reconcile::{graph_facade_names, reconcile, ModuleIndex};
use jinc_builder::validate::validate_output;
use jinc_core::facet::{Facet, KotlinClassKind, KotlinMeta};
use jinc_core::node::Node;
use jinc_core::paths::kotlin_module_entry;
use jinc_core::source::NodeSource;
use jinc_graph::DependencyGraph;

use common::{set, Project};

fn kotlin(id: &str, kind: KotlinClassKind) -> Node {
    Node::class(id).with_facet(Facet::Kotlin(KotlinMeta::new(kind)))
}

fn sample_graph() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph
        .merge(
            &NodeSource::new("src/Utils.kt"),
            vec![
                kotlin("com/example/UtilsKt", KotlinClassKind::FileFacade),
                kotlin("com/example/Model", KotlinClassKind::Class),
            ],
        )
        .unwrap();
    graph
        .merge(
            &NodeSource::new("src/MultiA.kt"),
            vec![kotlin(
                "com/example/Multi__AKt",
                KotlinClassKind::part_of("com/example/Multi"),
            )],
        )
        .unwrap();
    graph
        .merge(&NodeSource::new("src/Plain.java"), vec![Node::class("com/example/Plain")])
        .unwrap();
    graph
}

#[test]
fn test_index_from_graph() {
    let index = ModuleIndex::from_graph(&sample_graph(), &BTreeSet::new(), "app").unwrap();
    let parts = &index.package_parts["com.example"];
    assert_eq!(parts.file_facades, ["UtilsKt".to_string()].into());
    assert_eq!(parts.multi_file_class_parts["Multi__AKt"], "Multi");
    assert_eq!(
        index.facade_names(),
        ["com/example/Multi".to_string(), "com/example/UtilsKt".to_string()].into()
    );
    assert_eq!(index.facade_names(), graph_facade_names(&sample_graph(), &BTreeSet::new()));
}

#[test]
fn test_index_excludes_dirty_sources() {
    let dirty = [NodeSource::new("src/MultiA.kt")].into();
    let index = ModuleIndex::from_graph(&sample_graph(), &dirty, "app").unwrap();
    assert_eq!(index.facade_names(), ["com/example/UtilsKt".to_string()].into());
}

#[test]
fn test_index_with_every_kotlin_source_dirty_is_empty() {
    let dirty = [
        NodeSource::new("src/Utils.kt"),
        NodeSource::new("src/MultiA.kt"),
    ]
    .into();
    let index = ModuleIndex::from_graph(&sample_graph(), &dirty, "app").unwrap();
    assert!(index.package_parts.is_empty());
    assert!(index.facade_names().is_empty());
    assert!(graph_facade_names(&sample_graph(), &dirty).is_empty());
}

#[test]
fn test_dotted_facade_name_matches_validator() {
    let mut graph = DependencyGraph::new();
    graph
        .merge(
            &NodeSource::new("src/MultiA.kt"),
            vec![kotlin("p/Multi__AKt", KotlinClassKind::part_of("p.Multi"))],
        )
        .unwrap();
    let index = ModuleIndex::from_graph(&graph, &BTreeSet::new(), "app").unwrap();
    assert_eq!(index.package_parts["p"].multi_file_class_parts["Multi__AKt"], "Multi");
    assert_eq!(index.facade_names(), ["p/Multi".to_string()].into());
    assert_eq!(index.facade_names(), graph_facade_names(&graph, &BTreeSet::new()));
}

#[test]
fn test_no_kotlin_means_no_index() {
    let mut graph = DependencyGraph::new();
    graph
        .merge(&NodeSource::new("src/A.java"), vec![Node::class("A")])
        .unwrap();
    assert!(ModuleIndex::from_graph(&graph, &BTreeSet::new(), "app").is_none());
}

#[test]
fn test_index_bytes_parse_back() {
    let index = ModuleIndex::from_graph(&sample_graph(), &BTreeSet::new(), "app").unwrap();
    let parsed = ModuleIndex::parse(&index.to_bytes().unwrap()).unwrap();
    assert_eq!(parsed, index);
    assert!(ModuleIndex::parse(b"garbage").is_err());
}

#[test]
fn test_reconcile_writes_and_removes_index() {
    let tmp = tempfile::tempdir().unwrap();
    let classes = tmp.path().join("classes");

    let written = reconcile(&sample_graph(), &BTreeSet::new(), "app", &classes)
        .unwrap()
        .unwrap();
    assert_eq!(written, classes.join(kotlin_module_entry("app")));
    assert!(written.is_file());

    let removed = reconcile(&DependencyGraph::new(), &BTreeSet::new(), "app", &classes).unwrap();
    assert!(removed.is_none());
    assert!(!written.exists());
    assert!(!classes.join("META-INF").exists());
}

#[test]
fn test_rounds_keep_index_in_step_with_graph() {
    let project = Project::new();
    project.write("src/u/Utils.kt", "facade u/UtilsKt\nkclass u/Model\n");
    project.write("src/u/MultiA.kt", "part u/Multi__AKt of u/Multi\n");
    project.write("src/u/Extra.kt", "facade u/ExtraKt\n");
    project.write("src/u/Main.java", "class u/Main\nuses u/UtilsKt\n");
    let summary = project.build();
    assert!(summary.success);

    let entry = kotlin_module_entry("app");
    let archive = read_archive(&project.layout().archive_path()).unwrap();
    let index = ModuleIndex::parse(&archive[&entry]).unwrap();
    assert_eq!(index.module, "app");
    assert_eq!(
        index.facade_names(),
        [
            "u/ExtraKt".to_string(),
            "u/Multi".to_string(),
            "u/UtilsKt".to_string()
        ]
        .into()
    );
    assert!(validate_output(&project.layout(), "app").unwrap().is_ok());

    project.write("src/u/Extra.kt", "facade u/ExtraKt\nerror not today\n");
    let summary = project.build();
    assert_eq!(summary.failed, set(&["src/u/Extra.kt"]));
    let archive = read_archive(&project.layout().archive_path()).unwrap();
    let index = ModuleIndex::parse(&archive[&entry]).unwrap();
    assert!(!index.facade_names().contains("u/ExtraKt"));
    assert!(index.facade_names().contains("u/UtilsKt"));
    assert!(validate_output(&project.layout(), "app").unwrap().is_ok());

    project.write("src/u/Utils.kt", "facade u/UtilsKt\nerror not today\n");
    project.write("src/u/MultiA.kt", "part u/Multi__AKt of u/Multi\nerror not today\n");
    let summary = project.build();
    assert_eq!(
        summary.failed,
        set(&["src/u/Extra.kt", "src/u/Main.java", "src/u/MultiA.kt", "src/u/Utils.kt"])
    );
    let archive = read_archive(&project.layout().archive_path()).unwrap();
    assert!(!archive.contains_key(&entry));
    assert!(archive.keys().all(|k| !k.ends_with(".class")));
    assert!(validate_output(&project.layout(), "app").unwrap().is_ok());

    project.delete("src/u/Utils.kt");
    project.delete("src/u/MultiA.kt");
    project.delete("src/u/Extra.kt");
    project.write("src/u/Main.java", "class u/Main\n");
    let summary = project.build();
    assert!(summary.success);
    let archive = read_archive(&project.layout().archive_path()).unwrap();
    assert!(!archive.contains_key(&entry));
    assert!(validate_output(&project.layout(), "app").unwrap().is_ok());
}

#[test]
fn test_validate_flags_missing_index() {
    let project = Project::new();
    project.write("src/A.kt", "facade AKt\n");
    project.build();

    let layout = project.layout();
    let classes = layout.classes_dir();
    std::fs::remove_file(classes.join(kotlin_module_entry("app"))).unwrap();
    jinc_builder::output::package_archive(&classes, &layout.archive_path()).unwrap();

    let report = validate_output(&layout, "app").unwrap();
    assert!(!report.is_ok());
    assert!(report.problems.iter().any(|p| p.contains("kotlin_module")));
}
