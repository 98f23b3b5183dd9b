use std::fs;

use jinc_graph::maplet::StoreLock;
use jinc_graph::MapletStore;
use jinc_util::errors::JincError;

fn paths(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    (dir.join("dep-graph.mv"), dir.join(".lock"))
}

#[test]
fn test_missing_store_opens_recovered_and_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let store = MapletStore::open(&path, &lock).unwrap();
    assert!(store.recovered());
    assert_eq!(store.generation(), 0);
    assert!(store.keys("nodes").is_empty());
}

#[test]
fn test_put_snapshot_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let mut store = MapletStore::open(&path, &lock).unwrap();
    store.put("m", "b", &2u32).unwrap();
    store.put("m", "a", &"one").unwrap();
    assert_eq!(store.snapshot().unwrap(), 1);
    store.close().unwrap();

    let store = MapletStore::open(&path, &lock).unwrap();
    assert!(!store.recovered());
    assert_eq!(store.generation(), 1);
    assert_eq!(store.keys("m"), vec!["a", "b"]);
    assert_eq!(store.get::<u32>("m", "b").unwrap(), Some(2));
    assert_eq!(store.get::<String>("m", "a").unwrap().as_deref(), Some("one"));
    assert_eq!(store.get::<u32>("m", "zzz").unwrap(), None);
}

#[test]
fn test_close_flushes_pending_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let mut store = MapletStore::open(&path, &lock).unwrap();
    store.put("m", "k", &true).unwrap();
    store.close().unwrap();

    let store = MapletStore::open_read_only(&path);
    assert_eq!(store.get::<bool>("m", "k").unwrap(), Some(true));
}

#[test]
fn test_drop_without_close_discards_changes() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    {
        let mut store = MapletStore::open(&path, &lock).unwrap();
        store.put("m", "k", &1).unwrap();
    }
    assert!(!path.exists());
    assert!(StoreLock::acquire(&lock).is_ok());
}

#[test]
fn test_leftover_lock_file_does_not_block() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    // What a killed build leaves behind: the file, but no live holder.
    fs::write(&lock, "4242\n").unwrap();

    let mut store = MapletStore::open(&path, &lock).unwrap();
    store.put("m", "k", &1).unwrap();
    store.close().unwrap();

    let pid = fs::read_to_string(&lock).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
}

#[cfg(unix)]
#[test]
fn test_held_lock_blocks_store_open() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let held = StoreLock::acquire(&lock).unwrap();
    let err = MapletStore::open(&path, &lock).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JincError>(),
        Some(JincError::Locked { .. })
    ));
    drop(held);
    assert!(MapletStore::open(&path, &lock).is_ok());
}

#[test]
fn test_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let mut store = MapletStore::open(&path, &lock).unwrap();
    store.put("m", "k", &1).unwrap();
    assert!(store.delete("m", "k"));
    assert!(!store.delete("m", "k"));
    assert!(store.keys("m").is_empty());
}

#[cfg(unix)]
#[test]
fn test_second_writer_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let first = MapletStore::open(&path, &lock).unwrap();
    let err = MapletStore::open(&path, &lock).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<JincError>(),
        Some(JincError::Locked { .. })
    ));
    drop(first);
    assert!(MapletStore::open(&path, &lock).is_ok());
}

#[test]
fn test_read_only_ignores_lock_and_cannot_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let _writer = MapletStore::open(&path, &lock).unwrap();
    let mut reader = MapletStore::open_read_only(&path);
    assert!(reader.snapshot().is_err());
}

#[test]
fn test_corrupted_payload_is_recovered() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let mut store = MapletStore::open(&path, &lock).unwrap();
    store.put("m", "k", &"value").unwrap();
    store.close().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 3;
    bytes[last] ^= 0x20;
    fs::write(&path, bytes).unwrap();

    let store = MapletStore::open(&path, &lock).unwrap();
    assert!(store.recovered());
    assert!(store.keys("m").is_empty());
}

#[test]
fn test_truncated_and_foreign_files_are_recovered() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, _) = paths(tmp.path());
    for content in ["", "JINC-MAPLET 1", "garbage\n{}", "JINC-MAPLET 99 1 1 abc\n{}"] {
        fs::write(&path, content).unwrap();
        assert!(MapletStore::open_read_only(&path).recovered(), "{content:?}");
    }
}

#[test]
fn test_generation_increases_per_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let (path, lock) = paths(tmp.path());
    let mut store = MapletStore::open(&path, &lock).unwrap();
    assert_eq!(store.snapshot().unwrap(), 1);
    assert_eq!(store.snapshot().unwrap(), 2);
}
