use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn jinc_cmd() -> Command {
    Command::cargo_bin("jinc").unwrap()
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Jinc.toml"), "[target]\nname = \"app\"\n").unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();
    fs::write(tmp.path().join("src/A.java"), "class A\n").unwrap();
    tmp
}

#[test]
fn test_clean_removes_archive_and_state() {
    let tmp = project();
    jinc_cmd().current_dir(tmp.path()).arg("build").assert().success();
    assert!(tmp.path().join("out/app.jar").exists());

    jinc_cmd()
        .current_dir(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned build output"));

    assert!(!tmp.path().join("out/app.jar").exists());
    assert!(!tmp.path().join("out/app-ic").exists());
}

#[test]
fn test_clean_without_build_prints_nothing_to_clean() {
    let tmp = project();
    jinc_cmd()
        .current_dir(tmp.path())
        .arg("clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn test_build_after_clean_rebuilds_everything() {
    let tmp = project();
    jinc_cmd().current_dir(tmp.path()).arg("build").assert().success();
    jinc_cmd().current_dir(tmp.path()).arg("clean").assert().success();
    jinc_cmd()
        .current_dir(tmp.path())
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("Rebuilding"));
}
