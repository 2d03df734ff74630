//! End-to-end tests for the `relint` binary: exit codes, output formats,
//! and the clean subcommand.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn relint() -> Command {
    Command::cargo_bin("relint").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn minimal_project(dir: &Path, chapter_body: &str) {
    write(dir, "config.yml", "bookname: book\n");
    write(dir, "catalog.yml", "CHAPS:\n  - ch01.re\n");
    write(dir, "ch01.re", chapter_body);
}

#[test]
fn clean_project_exits_zero() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\nhello\n");

    relint()
        .arg("lint")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 problem(s)"));
}

#[test]
fn problems_are_listed_but_default_level_exits_zero() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\n@<nope>{x}\n");

    relint()
        .arg("lint")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Undefined inline \"nope\""));
}

#[test]
fn unacceptable_level_error_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\n@<nope>{x}\n");

    relint()
        .arg("lint")
        .arg(dir.path())
        .args(["--unacceptable-level", "ERROR"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("check aborted"));
}

#[test]
fn warning_level_catches_warnings() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\n*tight\n");

    relint()
        .arg("lint")
        .arg(dir.path())
        .args(["-u", "WARNING"])
        .assert()
        .failure();
}

#[test]
fn json_format_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\n@<nope>{x}\n");

    let output = relint()
        .arg("lint")
        .arg(dir.path())
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["problems"][0]["severity"], "error");
    assert_eq!(report["bookmarks"][0]["title"], "Chapter");
    assert!(report["aborted"].is_null());
}

#[test]
fn single_file_lint() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "solo.re", "= S\n@<nope>{x}\n");

    relint()
        .arg("lint")
        .arg(dir.path().join("solo.re"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Undefined inline"));
}

#[test]
fn missing_path_fails() {
    relint()
        .arg("lint")
        .arg("/no/such/path")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn directory_without_project_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "README.md", "nothing here\n");

    relint()
        .arg("lint")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("source directory"));
}

#[test]
fn clean_removes_build_directories() {
    let dir = TempDir::new().unwrap();
    minimal_project(dir.path(), "= Chapter\n");
    fs::create_dir(dir.path().join("book-pdf")).unwrap();

    relint().arg("clean").arg(dir.path()).assert().success();
    assert!(!dir.path().join("book-pdf").exists());
    assert!(dir.path().join("ch01.re").exists());
}
