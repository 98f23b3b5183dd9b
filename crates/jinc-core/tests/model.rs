use std::path::Path;

use jinc_core::digest::Digest;
use jinc_core::facet::{Facet, KotlinClassKind, KotlinMeta};
use jinc_core::node::{Node, NodeId};
use jinc_core::source::{NodeSource, PathSourceMapper};

#[test]
fn test_node_source_normalizes_separators() {
    let source = NodeSource::new("src\\com\\Foo.kt");
    assert_eq!(source.as_str(), "src/com/Foo.kt");
    assert_eq!(source.extension(), Some("kt"));
}

#[test]
fn test_node_source_ordering_is_by_key() {
    let mut sources = vec![NodeSource::from("src/b.java"), NodeSource::from("src/a.java")];
    sources.sort();
    assert_eq!(sources[0].as_str(), "src/a.java");
}

#[test]
fn test_path_mapper_round_trip() {
    let mapper = PathSourceMapper::new("/proj");
    let source = mapper.to_source(Path::new("/proj/src/com/Foo.java")).unwrap();
    assert_eq!(source.as_str(), "src/com/Foo.java");
    assert_eq!(mapper.to_path(&source), Path::new("/proj/src/com/Foo.java"));
}

#[test]
fn test_path_mapper_rejects_outside_paths() {
    let mapper = PathSourceMapper::new("/proj");
    assert!(mapper.to_source(Path::new("/elsewhere/Foo.java")).is_none());
    assert!(mapper.to_source(Path::new("/proj")).is_none());
}

#[test]
fn test_digest_empty_sentinel() {
    assert!(Digest::empty().is_empty());
    assert!(Digest::from_hex("   ").is_empty());
    assert!(!Digest::of_bytes(b"").is_empty());
    assert_eq!(Digest::empty().to_string(), "<dirty>");
}

#[test]
fn test_digest_deterministic() {
    assert_eq!(Digest::of_bytes(b"class A"), Digest::of_bytes(b"class A"));
    assert_ne!(Digest::of_bytes(b"class A"), Digest::of_bytes(b"class B"));
}

#[test]
fn test_digest_of_file_streams_content() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("A.java");
    std::fs::write(&path, b"hello").unwrap();
    let digest = Digest::of_file(&path).unwrap();
    assert_eq!(
        digest.as_str(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(digest, Digest::of_bytes(b"hello"));
}

#[test]
fn test_digest_of_unreadable_path_fails() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(Digest::of_file(&tmp.path().join("missing.kt")).is_err());
    assert!(Digest::of_file(tmp.path()).is_err());
}

#[test]
fn test_digest_serializes_as_plain_string() {
    let json = serde_json::to_string(&Digest::empty()).unwrap();
    assert_eq!(json, "\"\"");
}

#[test]
fn test_node_id_normalizes_dots() {
    let id = NodeId::new("com.example.Foo");
    assert_eq!(id.as_str(), "com/example/Foo");
    assert_eq!(id.package(), "com/example");
    assert_eq!(NodeId::new("Foo").package(), "");
}

#[test]
fn test_class_node_output_path() {
    let node = Node::class("com/example/Foo").with_usage("com/example/Bar");
    assert_eq!(node.out_file_path, "com/example/Foo.class");
    assert!(node.usages.contains(&NodeId::new("com/example/Bar")));
    assert!(!node.is_kotlin());
}

#[test]
fn test_facade_class_name_by_kind() {
    let facade = Node::class("pkg/UtilsKt")
        .with_facet(Facet::Kotlin(KotlinMeta::new(KotlinClassKind::FileFacade)));
    assert_eq!(facade.facade_class_name(), Some("pkg/UtilsKt"));

    let part = Node::class("pkg/Multi__AKt").with_facet(Facet::Kotlin(KotlinMeta::new(
        KotlinClassKind::part_of("pkg/Multi"),
    )));
    assert_eq!(part.facade_class_name(), Some("pkg/Multi"));

    let class = Node::class("pkg/Plain")
        .with_facet(Facet::Kotlin(KotlinMeta::new(KotlinClassKind::Class)));
    assert!(class.is_kotlin());
    assert_eq!(class.facade_class_name(), None);
}

#[test]
fn test_facet_insert_replaces_same_kind() {
    let node = Node::class("pkg/A")
        .with_facet(Facet::Kotlin(KotlinMeta::new(KotlinClassKind::Class)))
        .with_facet(Facet::Kotlin(KotlinMeta::new(KotlinClassKind::SyntheticClass)));
    assert_eq!(node.facets.iter().count(), 1);
    assert_eq!(
        node.facet::<KotlinMeta>().unwrap().class_kind,
        KotlinClassKind::SyntheticClass
    );
}

#[test]
fn test_node_serde_round_trip_keeps_facets() {
    let node = Node::class("pkg/A").with_usage("pkg/B").with_facet(Facet::Kotlin(
        KotlinMeta::new(KotlinClassKind::part_of("pkg/F")),
    ));
    let json = serde_json::to_string(&node).unwrap();
    assert!(json.contains("\"kind\":\"kotlin\""));
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(back, node);
}

#[test]
fn test_dotted_names_read_back_in_internal_form() {
    let id: NodeId = serde_json::from_str("\"p.A\"").unwrap();
    assert_eq!(id, NodeId::new("p/A"));
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"p/A\"");

    let json = r#"{"class-kind":{"multi-file-class-part":{"facade-class-name":"p.Multi"}}}"#;
    let meta: KotlinMeta = serde_json::from_str(json).unwrap();
    assert_eq!(meta.class_kind, KotlinClassKind::part_of("p/Multi"));
    assert_eq!(meta.facade_class_name("p/Multi__AKt"), Some("p/Multi"));
}
