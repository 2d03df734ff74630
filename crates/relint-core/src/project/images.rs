//! Image-to-document association.
//!
//! Two image layouts are supported under the image directory:
//!
//! ```text
//! images/chap1-fig1.png      # flat:      <parent_id>-<image_id>.<ext>
//! images/chap1/fig1.png      # subdirectory: <parent_id>/<image_id>.<ext>
//! ```
//!
//! Association is a merge-style walk over the sorted document list and the
//! sorted image directory entries, so one pass handles any mix of the two
//! layouts. Entries that match no document are recorded as unmappable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::{document_stem, sorted_names};

/// One image file associated with a parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectImage {
    /// Path relative to the source directory, e.g. `images/chap1/fig1.png`.
    pub relative_path: String,
    /// Document the image belongs to, e.g. `chap1.re`.
    pub parent_document: String,
    /// Parent document filename without extension, e.g. `chap1`.
    pub parent_id: String,
    /// Logical id used to reference the image from markup, e.g. `fig1`.
    pub image_id: String,
    /// File extension without the dot, e.g. `png`.
    pub extension: String,
}

/// Walk the image directory and associate every entry with a document.
///
/// Every document in `documents` receives an entry in the returned map,
/// empty when nothing matched. The second return value lists entries that
/// matched no document.
pub(crate) fn associate(
    source_dir: &Path,
    image_dir: &str,
    documents: &[String],
) -> (BTreeMap<String, Vec<ProjectImage>>, Vec<String>) {
    let mut images: BTreeMap<String, Vec<ProjectImage>> = documents
        .iter()
        .map(|document| (document.clone(), Vec::new()))
        .collect();
    let mut unmappable = Vec::new();

    let image_dir_path = source_dir.join(image_dir);
    if !image_dir_path.is_dir() {
        debug!(image_dir, "no image directory");
        return (images, unmappable);
    }

    let mut parents: Vec<&String> = documents.iter().collect();
    parents.sort();
    parents.dedup();
    let entries = sorted_names(&image_dir_path);

    let mut i_parents = 0;
    let mut i_entries = 0;
    while i_parents < parents.len() && i_entries < entries.len() {
        let parent = parents[i_parents].as_str();
        let parent_id = document_stem(parent);
        let entry = entries[i_entries].as_str();
        let entry_path = image_dir_path.join(entry);

        if entry_path.is_dir() {
            if parent_id == entry {
                for file in sorted_names(&entry_path) {
                    let (stem, extension) = split_extension(&file);
                    push_image(
                        &mut images,
                        parent,
                        ProjectImage {
                            relative_path: format!("{image_dir}/{entry}/{file}"),
                            parent_document: parent.to_owned(),
                            parent_id: parent_id.to_owned(),
                            image_id: stem.to_owned(),
                            extension: extension.to_owned(),
                        },
                    );
                }
                i_entries += 1;
                i_parents += 1;
            } else if parent_id < entry {
                i_parents += 1;
            } else {
                unmappable.push(entry.to_owned());
                i_entries += 1;
            }
        } else {
            let (stem, extension) = split_extension(entry);
            let prefix = format!("{parent_id}-");
            if let Some(image_id) = stem.strip_prefix(&prefix) {
                // Only the entry index advances: the next image file may
                // share the same parent.
                push_image(
                    &mut images,
                    parent,
                    ProjectImage {
                        relative_path: format!("{image_dir}/{entry}"),
                        parent_document: parent.to_owned(),
                        parent_id: parent_id.to_owned(),
                        image_id: image_id.to_owned(),
                        extension: extension.to_owned(),
                    },
                );
                i_entries += 1;
            } else if parent_id < stem {
                i_parents += 1;
            } else {
                unmappable.push(entry.to_owned());
                i_entries += 1;
            }
        }
    }
    unmappable.extend(entries[i_entries..].iter().cloned());

    (images, unmappable)
}

fn push_image(
    images: &mut BTreeMap<String, Vec<ProjectImage>>,
    parent: &str,
    image: ProjectImage,
) {
    if let Some(list) = images.get_mut(parent) {
        list.push(image);
    }
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, extension),
        _ => (name, ""),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn split_extension_handles_edge_cases() {
        assert_eq!(split_extension("fig1.png"), ("fig1", "png"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", "gz"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
