//! Whole-book lint runs: catalog ordering, image checks against the
//! project model, and abort behaviour.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, missing_docs)]

use std::fs;
use std::path::Path;

use relint_core::{LintOptions, Project, Severity, lint_file, lint_project};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn options() -> LintOptions {
    LintOptions::default()
}

#[test]
fn clean_book_with_parts() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(
        dir.path(),
        "catalog.yml",
        "PREDEF:\n  - preface.re\nCHAPS:\n  - P1:\n      - ch01.re\nPOSTDEF:\n  - appendix.re\n",
    );
    write(dir.path(), "preface.re", "= Preface\n");
    write(dir.path(), "ch01.re", "= Chapter\n== Section\n");
    write(dir.path(), "appendix.re", "= Appendix\n");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(&project, &options()).unwrap();
    assert!(report.aborted.is_none());
    assert_eq!(report.problems, vec![]);

    let titles: Vec<(&str, usize)> = report
        .bookmarks
        .iter()
        .map(|b| (b.title.as_str(), b.level))
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Preface", 1),
            ("P1", 1),
            ("Chapter", 2),
            ("Section", 3),
            ("Appendix", 1),
        ]
    );
    // The synthetic part bookmark has no source document.
    assert_eq!(report.bookmarks[1].source, None);
    // Chapter indices restart per document.
    assert_eq!(report.bookmarks[0].chapter_index, Some(0));
    assert_eq!(report.bookmarks[2].chapter_index, Some(0));
}

#[test]
fn diagnostics_follow_catalog_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    // Catalog order differs from the alphabetical one.
    write(dir.path(), "catalog.yml", "CHAPS:\n  - zz.re\n  - aa.re\n");
    write(dir.path(), "zz.re", "= Z\n@<nope>{x}\n");
    write(dir.path(), "aa.re", "= A\n@<nope>{y}\n");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(&project, &options()).unwrap();
    assert_eq!(report.problems.len(), 2);
    assert_eq!(report.problems[0].source.as_deref(), Some("zz.re"));
    assert_eq!(report.problems[1].source.as_deref(), Some("aa.re"));
}

#[test]
fn image_block_resolves_against_project() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - ch01.re\n");
    write(
        dir.path(),
        "ch01.re",
        "= C\n//image[good][caption]{\n//}\n//image[pref][caption]{\n//}\n//image[bad][caption]{\n//}\n",
    );
    write(dir.path(), "images/ch01-good.png", "png");
    write(dir.path(), "images/ch01-ch01-pref.png", "png");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(&project, &options()).unwrap();
    assert_eq!(report.problems.len(), 2);

    let warning = &report.problems[0];
    assert_eq!(warning.severity, Severity::Warning);
    assert!(warning.description.contains("ch01-pref"));
    assert_eq!(warning.line, Some(4));

    let error = &report.problems[1];
    assert_eq!(error.severity, Severity::Error);
    assert!(error.description.contains("\"bad\" is not available"));
    assert_eq!(error.line, Some(6));
}

#[test]
fn abort_stops_remaining_documents() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - bad.re\n  - good.re\n");
    write(dir.path(), "bad.re", "= B\n//wat{\n//}\n");
    write(dir.path(), "good.re", "= G\n");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(
        &project,
        &LintOptions {
            ignore_threshold: Severity::Info,
            abort_threshold: Severity::Error,
        },
    )
    .unwrap();
    let aborted = report.aborted.as_ref().expect("the unknown block must abort");
    assert!(aborted.description.contains("Undefined block \"wat\""));
    // good.re was never parsed.
    assert!(report.bookmarks.iter().all(|b| b.title != "G"));
    assert!(report.exceeds(Severity::Error));
}

#[test]
fn exceeds_matches_threshold_semantics() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - ch01.re\n");
    write(dir.path(), "ch01.re", "= C\n*tight\n");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(&project, &options()).unwrap();
    assert_eq!(report.max_severity(), Some(Severity::Warning));
    assert!(report.exceeds(Severity::Warning));
    assert!(report.exceeds(Severity::Info));
    assert!(!report.exceeds(Severity::Error));
    assert!(!report.exceeds(Severity::Critical));
}

#[test]
fn lint_file_without_project_skips_image_checks() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "solo.re", "= S\n//image[any][caption]{\n//}\n");

    let report = lint_file(&dir.path().join("solo.re"), &options()).unwrap();
    // No project: the missing image cannot be detected.
    assert_eq!(report.problems, vec![]);
}

#[test]
fn lint_file_inside_project_checks_images() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - ch01.re\n");
    write(dir.path(), "ch01.re", "= C\n//image[ghost][caption]{\n//}\n");

    let report = lint_file(&dir.path().join("ch01.re"), &options()).unwrap();
    assert_eq!(report.problems.len(), 1);
    assert_eq!(report.problems[0].severity, Severity::Error);
    assert!(report.problems[0].description.contains("ghost"));
}

#[test]
fn draft_documents_are_not_linted() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - ch01.re\n");
    write(dir.path(), "ch01.re", "= C\n");
    write(dir.path(), "draft.re", "= D\n@<nope>{x}\n");

    let project = Project::open(dir.path()).unwrap();
    let report = lint_project(&project, &options()).unwrap();
    // The draft's problems do not show up; only catalog documents run.
    assert_eq!(report.problems, vec![]);
    assert!(report.bookmarks.iter().all(|b| b.title != "D"));
}

#[test]
fn undecodable_document_is_fatal() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.yml", "bookname: book\n");
    write(dir.path(), "catalog.yml", "CHAPS:\n  - bad.re\n");
    fs::write(dir.path().join("bad.re"), [0x3d, 0x20, 0xff, 0xfe, 0x0a]).unwrap();

    let project = Project::open(dir.path()).unwrap();
    match lint_project(&project, &options()) {
        Err(relint_core::Error::Encoding { source_name }) => {
            assert_eq!(source_name, "bad.re");
        },
        other => panic!("expected an encoding error, got {other:?}"),
    }
}
