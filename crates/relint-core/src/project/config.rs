//! Book configuration (`config.yml` and friends).
//!
//! A configuration file is any YAML mapping carrying a `bookname` key.
//! Candidates are probed in a fixed order and the first one that parses
//! wins; everything besides `bookname` is optional and read leniently, so
//! a config written for the full toolchain (with dozens of publishing
//! keys) still loads here.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use crate::error::{Error, Result};

use super::verify_file;

const CONFIG_CANDIDATES: &[&str] = &["config.yml", "config.yaml", "sample.yml", "sample.yaml"];

/// Book metadata extracted from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookAttributes {
    /// Base name used for build artefacts. The only required key.
    pub bookname: String,
    /// Human-readable book title (`booktitle`).
    pub title: String,
    /// Author (`aut`), when given as a plain string.
    pub author: Option<String>,
    /// Free-form description.
    pub description: String,
    /// Cover image reference (`coverimage`).
    pub cover_image: String,
}

/// Find and parse the book configuration.
///
/// Returns the accepted candidate's name together with the attributes.
pub(crate) fn load(
    source_dir: &Path,
    explicit: Option<&str>,
) -> Result<(String, BookAttributes)> {
    let candidates: Vec<&str> =
        explicit.map_or_else(|| CONFIG_CANDIDATES.to_vec(), |name| vec![name]);
    for candidate in candidates {
        if let Some(attributes) = try_parse(source_dir, candidate) {
            debug!(candidate, "using book configuration");
            return Ok((candidate.to_owned(), attributes));
        }
    }
    Err(Error::Config(format!(
        "no book configuration found in \"{}\"",
        source_dir.display()
    )))
}

fn try_parse(source_dir: &Path, candidate: &str) -> Option<BookAttributes> {
    let path = verify_file(source_dir, candidate)?;
    let text = fs::read_to_string(&path).ok()?;
    let value: Value = serde_yaml::from_str(&text).ok()?;
    if !value.is_mapping() {
        debug!(candidate, "not a mapping");
        return None;
    }
    let bookname = value.get("bookname")?.as_str()?.to_owned();
    let string_at = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    Some(BookAttributes {
        bookname,
        title: string_at("booktitle"),
        author: value.get("aut").and_then(Value::as_str).map(str::to_owned),
        description: string_at("description"),
        cover_image: string_at("coverimage"),
    })
}
