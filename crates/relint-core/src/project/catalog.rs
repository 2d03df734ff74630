//! Catalog parsing, new format and legacy format.
//!
//! The new format is a single `catalog.yml`/`catalog.yaml` mapping with a
//! non-empty `CHAPS` sequence and optional `PREDEF`/`POSTDEF`. When the
//! first `CHAPS` element is a mapping, the book has parts: each element is
//! a one-entry mapping from part title to its chapter documents, and a
//! malformed element rejects the whole catalog. Otherwise `CHAPS` is a
//! flat document list and unverifiable names are merely skipped.
//!
//! The legacy format (pre-1.3 projects) uses the plain-text files `CHAPS`
//! (required), `PREDEF`, `POSTDEF`, and `PART`: with *k* part titles,
//! `CHAPS` splits on blank lines into at most *k* groups; surplus blank
//! lines are ignored and the remaining documents join the last part.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::{Part, Structure, verify_file, verify_markup_file};

/// Parsed catalog, before draft/image resolution.
#[derive(Debug)]
pub(crate) struct Catalog {
    pub predef: Vec<String>,
    pub postdef: Vec<String>,
    pub structure: Structure,
    pub catalog_files: Vec<String>,
}

/// Locate and parse the catalog. New-format candidates are probed first;
/// the legacy files are the fallback.
pub(crate) fn load(source_dir: &Path, explicit: Option<&str>) -> Result<Catalog> {
    if let Some(name) = explicit {
        return parse_new_format(source_dir, name).ok_or_else(|| {
            Error::Catalog(format!("\"{name}\" is not a usable catalog file"))
        });
    }
    for candidate in ["catalog.yml", "catalog.yaml"] {
        if let Some(catalog) = parse_new_format(source_dir, candidate) {
            debug!(candidate, "using new-format catalog");
            return Ok(catalog);
        }
    }
    parse_legacy(source_dir).ok_or_else(|| {
        Error::Catalog(format!(
            "no usable catalog found in \"{}\"",
            source_dir.display()
        ))
    })
}

fn parse_new_format(source_dir: &Path, name: &str) -> Option<Catalog> {
    let path = verify_file(source_dir, name)?;
    let text = fs::read_to_string(&path).ok()?;
    let value: Value = serde_yaml::from_str(&text).ok()?;
    let chaps = value.get("CHAPS")?.as_sequence()?;
    if chaps.is_empty() {
        debug!(name, "CHAPS is empty");
        return None;
    }

    let predef = collect_plain_documents(source_dir, value.get("PREDEF"));
    let postdef = collect_plain_documents(source_dir, value.get("POSTDEF"));

    let structure = if chaps[0].is_mapping() {
        // e.g.
        // CHAPS:
        //   - {"First PART": [ch01.re, ch02.re]}
        //   - {"Second PART": [ch03.re, ch04.re]}
        let mut parts = Vec::new();
        for entry in chaps {
            let mapping = entry.as_mapping()?;
            if mapping.len() != 1 {
                warn!(name, "malformed part entry");
                return None;
            }
            let (title, documents) = mapping.iter().next()?;
            let title = title.as_str()?;
            let mut part_documents = Vec::new();
            for document in documents.as_sequence()? {
                let document = document.as_str()?;
                verify_markup_file(source_dir, document)?;
                part_documents.push(document.to_owned());
            }
            parts.push(Part {
                title: title.to_owned(),
                documents: part_documents,
            });
        }
        Structure::Parts(parts)
    } else {
        let mut chapters = Vec::new();
        for document in chaps {
            let document = document.as_str()?.trim();
            if verify_markup_file(source_dir, document).is_some() {
                chapters.push(document.to_owned());
            } else {
                debug!(document, "ignoring unverifiable chapter");
            }
        }
        Structure::Chapters(chapters)
    };

    Some(Catalog {
        predef,
        postdef,
        structure,
        catalog_files: vec![name.to_owned()],
    })
}

/// Collect a `PREDEF`/`POSTDEF` sequence; these entries need not carry the
/// markup extension, but must verify as files.
fn collect_plain_documents(source_dir: &Path, value: Option<&Value>) -> Vec<String> {
    let mut documents = Vec::new();
    let Some(sequence) = value.and_then(Value::as_sequence) else {
        return documents;
    };
    for entry in sequence {
        let Some(name) = entry.as_str() else {
            warn!("ignoring non-string catalog entry");
            continue;
        };
        let name = name.trim();
        if verify_file(source_dir, name).is_some() {
            documents.push(name.to_owned());
        } else {
            debug!(name, "ignoring unverifiable document");
        }
    }
    documents
}

fn parse_legacy(source_dir: &Path) -> Option<Catalog> {
    let chaps_path = verify_file(source_dir, "CHAPS")?;
    let mut catalog_files = vec!["CHAPS".to_owned()];

    let mut predef = Vec::new();
    if let Some(path) = verify_file(source_dir, "PREDEF") {
        catalog_files.push("PREDEF".to_owned());
        collect_legacy_documents(source_dir, &path, &mut predef);
    }

    let part_titles: Vec<String> = verify_file(source_dir, "PART")
        .and_then(|path| fs::read_to_string(path).ok())
        .map(|text| text.lines().map(|l| l.trim_end().to_owned()).collect())
        .unwrap_or_default();

    let chaps_text = fs::read_to_string(&chaps_path).ok()?;
    let structure = if part_titles.is_empty() {
        let mut chapters = Vec::new();
        for line in chaps_text.lines() {
            let name = line.trim_end();
            if name.is_empty() {
                continue;
            }
            if verify_markup_file(source_dir, name).is_some() {
                chapters.push(name.to_owned());
            } else {
                debug!(name, "ignoring unverifiable chapter");
            }
        }
        Structure::Chapters(chapters)
    } else {
        catalog_files.push("PART".to_owned());
        let mut parts: Vec<Part> = Vec::new();
        let mut current = Vec::new();
        for line in chaps_text.lines() {
            let name = line.trim_end();
            if name.is_empty() {
                // A blank line closes the current part, as long as a later
                // title could still own the remaining documents; surplus
                // blank lines are ignored.
                if parts.len() + 1 < part_titles.len() {
                    parts.push(Part {
                        title: part_titles[parts.len()].clone(),
                        documents: std::mem::take(&mut current),
                    });
                }
            } else if verify_markup_file(source_dir, name).is_some() {
                current.push(name.to_owned());
            } else {
                debug!(name, "ignoring unverifiable chapter");
            }
        }
        parts.push(Part {
            title: part_titles[parts.len()].clone(),
            documents: current,
        });
        Structure::Parts(parts)
    };

    let mut postdef = Vec::new();
    if let Some(path) = verify_file(source_dir, "POSTDEF") {
        catalog_files.push("POSTDEF".to_owned());
        collect_legacy_documents(source_dir, &path, &mut postdef);
    }

    Some(Catalog {
        predef,
        postdef,
        structure,
        catalog_files,
    })
}

/// Read a legacy `PREDEF`/`POSTDEF` list: one name per line, blank lines
/// skipped. The names need not carry the markup extension.
fn collect_legacy_documents(source_dir: &Path, list_path: &Path, out: &mut Vec<String>) {
    let Ok(text) = fs::read_to_string(list_path) else {
        return;
    };
    for line in text.lines() {
        let name = line.trim_end();
        if name.is_empty() {
            continue;
        }
        if verify_file(source_dir, name).is_some() {
            out.push(name.to_owned());
        } else {
            debug!(name, "ignoring unverifiable document");
        }
    }
}
