//! Book project model: discovery, catalog decomposition, drafts, images.
//!
//! A [`Project`] is the catalog decomposition of one source directory. It
//! knows which documents make up the book and in what order (`PREDEF`,
//! parts or flat chapters, `POSTDEF`), which `.re` files are drafts, and
//! which image files belong to which document. The project never parses
//! markup itself; the document parser borrows it for image checks.
//!
//! Discovery walks a directory tree looking for the telltale files
//! (`config.yml`, `catalog.yml`, legacy `CHAPS`, …); configuration and
//! catalogs come in both the current YAML form and the legacy
//! `CHAPS`/`PREDEF`/`POSTDEF`/`PART` form.

mod catalog;
mod config;
mod images;

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use config::BookAttributes;
pub use images::ProjectImage;

/// Extension of markup source documents.
pub const MARKUP_EXTENSION: &str = "re";

/// Files whose presence marks a directory as a project source directory.
const RELATED_FILES: &[&str] = &[
    "config.yml",
    "config.yaml",
    "catalog.yml",
    "catalog.yaml",
    "CHAPS",
    "PREDEF",
    "POSTDEF",
    "PART",
];

/// Chapter organisation of a book: either parts wrapping chapters, or a
/// flat chapter list. Exactly one of the two shapes applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Structure {
    /// Parts, each with its ordered chapter documents.
    Parts(Vec<Part>),
    /// Flat ordered chapter documents.
    Chapters(Vec<String>),
}

/// One part: a title and the chapter documents it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    /// Part title as given in the catalog.
    pub title: String,
    /// Ordered chapter documents of this part.
    pub documents: Vec<String>,
}

/// How an image id resolved against the project model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResolution {
    /// An image with exactly this id exists for the document.
    Found,
    /// Only a `<parent_id>-<id>` variant exists; the payload is that
    /// variant's id.
    Prefixed(String),
    /// No matching image.
    Missing,
}

/// Options for [`Project::open_with`].
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// Use this config file instead of probing the usual candidates.
    pub config_file: Option<String>,
    /// Use this (new-format) catalog file instead of probing.
    pub catalog_file: Option<String>,
    /// Name of the image directory under the source directory.
    pub image_dir: String,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            config_file: None,
            catalog_file: None,
            image_dir: "images".to_owned(),
        }
    }
}

/// The catalog decomposition of one book project directory.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    /// Absolute path of the source directory.
    pub source_dir: PathBuf,
    /// Name of the book configuration file that was accepted.
    pub config_file: String,
    /// Names of the files that defined the book structure.
    pub catalog_files: Vec<String>,
    /// Documents parsed before the chapters, in listed order.
    pub predef: Vec<String>,
    /// Documents parsed after the chapters, in listed order.
    pub postdef: Vec<String>,
    /// Parts or flat chapters.
    pub structure: Structure,
    /// Markup files present in the source directory but absent from the
    /// catalog.
    pub drafts: Vec<String>,
    /// Name of the image directory (default `images`).
    pub image_dir: String,
    /// Images per document. Every catalog and draft document has an entry,
    /// possibly empty.
    pub images: BTreeMap<String, Vec<ProjectImage>>,
    /// Image directory entries that could not be associated with any
    /// document.
    pub unmappable_images: Vec<String>,
    /// Book metadata from the configuration file.
    pub attributes: BookAttributes,
}

impl Project {
    /// Find the source directory under `base_dir`.
    ///
    /// A directory qualifies when it contains any of the project-related
    /// files; a second pass accepts any directory containing a markup
    /// document. The search is depth-first, checks each directory before
    /// its children, and the first hit wins. `depth` bounds the descent:
    /// `Some(0)` checks `base_dir` alone, `None` does not bound it.
    #[must_use]
    pub fn discover(base_dir: &Path, depth: Option<usize>) -> Option<PathBuf> {
        look_for(base_dir, depth, &|names| {
            names.iter().any(|n| RELATED_FILES.contains(&n.as_str()))
        })
        .or_else(|| {
            look_for(base_dir, depth, &|names| {
                names.iter().any(|n| has_markup_extension(n))
            })
        })
    }

    /// Open the project at `source_dir` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no usable book configuration is
    /// found, [`Error::Catalog`] when neither catalog format yields a
    /// structure, and [`Error::Io`] for filesystem failures.
    pub fn open(source_dir: &Path) -> Result<Self> {
        Self::open_with(source_dir, &ProjectOptions::default())
    }

    /// Open the project at `source_dir`.
    ///
    /// # Errors
    ///
    /// See [`Project::open`].
    pub fn open_with(source_dir: &Path, options: &ProjectOptions) -> Result<Self> {
        let source_dir = normalize(&std::path::absolute(source_dir)?);
        debug!(source_dir = %source_dir.display(), "opening project");
        let (config_file, attributes) =
            config::load(&source_dir, options.config_file.as_deref())?;
        let catalog = catalog::load(&source_dir, options.catalog_file.as_deref())?;

        let mut project = Self {
            source_dir,
            config_file,
            catalog_files: catalog.catalog_files,
            predef: catalog.predef,
            postdef: catalog.postdef,
            structure: catalog.structure,
            drafts: Vec::new(),
            image_dir: options.image_dir.clone(),
            images: BTreeMap::new(),
            unmappable_images: Vec::new(),
            attributes,
        };
        project.detect_drafts()?;

        let all_documents: Vec<String> =
            project.all_documents().map(str::to_owned).collect();
        let (images, unmappable) =
            images::associate(&project.source_dir, &project.image_dir, &all_documents);
        project.images = images;
        project.unmappable_images = unmappable;
        info!(
            documents = project.source_documents().count(),
            drafts = project.drafts.len(),
            "project ready"
        );
        Ok(project)
    }

    fn detect_drafts(&mut self) -> Result<()> {
        let known: HashSet<&str> = self.source_documents().collect();
        let mut drafts = Vec::new();
        for entry in fs::read_dir(&self.source_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if has_markup_extension(&name) && !known.contains(name.as_str()) {
                debug!(%name, "draft document");
                drafts.push(name);
            }
        }
        drafts.sort();
        self.drafts = drafts;
        Ok(())
    }

    /// True when the book is organised into parts.
    #[must_use]
    pub const fn has_parts(&self) -> bool {
        matches!(self.structure, Structure::Parts(_))
    }

    /// The catalog documents in parse order: predef, then chapters part by
    /// part (or flat), then postdef.
    pub fn source_documents(&self) -> impl Iterator<Item = &str> {
        let chapters: Vec<&str> = match &self.structure {
            Structure::Parts(parts) => parts
                .iter()
                .flat_map(|p| p.documents.iter())
                .map(String::as_str)
                .collect(),
            Structure::Chapters(chapters) => chapters.iter().map(String::as_str).collect(),
        };
        self.predef
            .iter()
            .map(String::as_str)
            .chain(chapters)
            .chain(self.postdef.iter().map(String::as_str))
    }

    /// Catalog documents followed by drafts.
    pub fn all_documents(&self) -> impl Iterator<Item = &str> {
        self.source_documents()
            .chain(self.drafts.iter().map(String::as_str))
    }

    /// True when the document is either listed or a draft.
    #[must_use]
    pub fn has_document(&self, document: &str) -> bool {
        self.all_documents().any(|d| d == document)
    }

    /// Images associated with a document, in directory order.
    #[must_use]
    pub fn images_for(&self, document: &str) -> &[ProjectImage] {
        self.images.get(document).map_or(&[], Vec::as_slice)
    }

    /// Resolve an image id referenced from `document`.
    #[must_use]
    pub fn resolve_image(&self, document: &str, id: &str) -> ImageResolution {
        let images = self.images_for(document);
        if images.iter().any(|image| image.image_id == id) {
            return ImageResolution::Found;
        }
        let parent_id = document_stem(document);
        let prefixed = format!("{parent_id}-{id}");
        if images.iter().any(|image| image.image_id == prefixed) {
            return ImageResolution::Prefixed(prefixed);
        }
        ImageResolution::Missing
    }

    /// Remove the project's temporary build directories (`<bookname>`,
    /// `<bookname>-pdf`, `<bookname>-epub`, `<bookname>-log`). Missing
    /// directories are fine; this is the only operation that writes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when a directory exists but cannot be
    /// removed.
    pub fn remove_temp_dirs(&self) -> Result<()> {
        let bookname = &self.attributes.bookname;
        for suffix in ["", "-pdf", "-epub", "-log"] {
            let dir = self.source_dir.join(format!("{bookname}{suffix}"));
            match fs::remove_dir_all(&dir) {
                Ok(()) => info!(dir = %dir.display(), "removed temp directory"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }
}

/// Document filename without its extension (`chap1.re` → `chap1`).
pub(crate) fn document_stem(document: &str) -> &str {
    document.rsplit_once('.').map_or(document, |(stem, _)| stem)
}

fn has_markup_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == MARKUP_EXTENSION)
}

/// Check that `name` points at a regular, non-symlink file inside
/// `source_dir` (no escape via `..`). Returns the normalized path.
pub(crate) fn verify_file(source_dir: &Path, name: &str) -> Option<PathBuf> {
    let path = normalize(&source_dir.join(name));
    if !path.starts_with(normalize(source_dir)) {
        debug!(name, "does not point into the source directory");
        return None;
    }
    let Ok(metadata) = fs::symlink_metadata(&path) else {
        debug!(name, "does not exist");
        return None;
    };
    if metadata.file_type().is_symlink() {
        debug!(name, "is a symlink");
        return None;
    }
    if !metadata.is_file() {
        debug!(name, "is not a regular file");
        return None;
    }
    Some(path)
}

/// [`verify_file`] plus the markup-extension requirement.
pub(crate) fn verify_markup_file(source_dir: &Path, name: &str) -> Option<PathBuf> {
    if !has_markup_extension(name) {
        debug!(name, "does not look like a markup document");
        return None;
    }
    verify_file(source_dir, name)
}

/// Lexically resolve `.` and `..` components without touching the
/// filesystem (symlinks are rejected separately).
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            },
            other => normalized.push(other),
        }
    }
    normalized
}

pub(crate) fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn look_for(dir: &Path, depth: Option<usize>, accept: &dyn Fn(&[String]) -> bool) -> Option<PathBuf> {
    let names = sorted_names(dir);
    if accept(&names) {
        return Some(dir.to_path_buf());
    }
    if depth == Some(0) {
        return None;
    }
    let next_depth = depth.map(|d| d - 1);
    for name in names {
        let path = dir.join(name);
        if path.is_dir() {
            if let Some(hit) = look_for(&path, next_depth, accept) {
                return Some(hit);
            }
        }
    }
    None
}
