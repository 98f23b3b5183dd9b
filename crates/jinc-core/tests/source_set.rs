use std::fs;

use jinc_core::manifest::Manifest;
use jinc_core::source_set::{discover_sources, SourceFilter};

fn touch(root: &std::path::Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "class X").unwrap();
}

#[test]
fn test_discover_sources_applies_include_and_exclude() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "src/a/A.java");
    touch(tmp.path(), "src/a/B.kt");
    touch(tmp.path(), "src/a/notes.txt");
    touch(tmp.path(), "src/a/Skip.java");
    touch(tmp.path(), "src/a/A.java.new");

    let manifest = Manifest::from_str(
        "[target]\nname = \"app\"\nexclude = [\"**/Skip.java\"]\n",
    )
    .unwrap();
    let sources = discover_sources(&manifest, tmp.path(), &tmp.path().join("out")).unwrap();
    let keys: Vec<_> = sources.iter().map(|s| s.as_str()).collect();
    assert_eq!(keys, vec!["src/a/A.java", "src/a/B.kt"]);
}

#[test]
fn test_discover_sources_skips_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    touch(tmp.path(), "A.java");
    touch(tmp.path(), "out/Gen.java");

    let manifest = Manifest::from_str("[target]\nname = \"app\"\nsources = [\".\"]\n").unwrap();
    let sources = discover_sources(&manifest, tmp.path(), &tmp.path().join("out")).unwrap();
    let keys: Vec<_> = sources.iter().map(|s| s.as_str()).collect();
    assert_eq!(keys, vec!["A.java"]);
}

#[test]
fn test_discover_sources_missing_root_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let manifest = Manifest::from_str("[target]\nname = \"app\"\n").unwrap();
    let sources = discover_sources(&manifest, tmp.path(), &tmp.path().join("out")).unwrap();
    assert!(sources.is_empty());
}

#[test]
fn test_invalid_glob_is_error() {
    assert!(SourceFilter::new(&["[".to_string()], &[]).is_err());
}
