//! Per-construct validation rules.
//!
//! The parser calls into this module at three moments: right after an
//! inline annotation is recognised (post-parse), when a block opening line
//! is recognised (first-line), and when a block is completed (last-line).
//! A fourth pass runs at end of document and resolves references between
//! inline annotations and block definitions.
//!
//! The rule set is fixed and keyed by construct name; unknown names fall
//! through to the "undefined construct" Error.

use crate::error::Result;
use crate::project::{ImageResolution, Project};
use crate::report::Reporter;
use crate::types::{Block, Inline};

/// Inline annotation names the upstream formatter understands.
pub const KNOWN_INLINE_NAMES: &[&str] = &[
    "list", "img", "table", "href", "fn", "title", "ami", "chapref", "b", "i", "u", "m", "em",
    "kw", "tt", "tti", "ttb", "bou", "br", "code", "chap", "uchar", "raw",
];

/// Expected parameter count for a known block name, `None` for unknown
/// blocks.
#[must_use]
pub fn block_param_count(name: &str) -> Option<usize> {
    match name {
        "noindent" | "lead" => Some(0),
        "emlist" => Some(1),
        "table" | "list" | "listnum" | "image" | "footnote" => Some(2),
        _ => None,
    }
}

/// Post-parse check for one inline annotation: unknown names are Errors.
pub(crate) fn check_inline(
    inline: &Inline,
    source: Option<&str>,
    context: Option<&str>,
    reporter: &mut Reporter,
) -> Result<()> {
    if !KNOWN_INLINE_NAMES.contains(&inline.name.as_str()) {
        reporter.error(
            source,
            Some(inline.line),
            format!("Undefined inline \"{}\"", inline.name),
            context,
        )?;
    }
    Ok(())
}

/// First-line check for a block opening: unknown block names are Errors,
/// and `image` blocks must name an image the project can resolve for the
/// current document.
pub(crate) fn check_block_open(
    name: &str,
    params: &[String],
    line: usize,
    context: &str,
    source: Option<&str>,
    project: Option<&Project>,
    reporter: &mut Reporter,
) -> Result<()> {
    if block_param_count(name).is_none() {
        reporter.error(
            source,
            Some(line),
            format!("Undefined block \"{name}\""),
            Some(context),
        )?;
        return Ok(());
    }
    if name == "image" {
        let (Some(project), Some(document)) = (project, source) else {
            return Ok(());
        };
        let Some(id) = params.first() else {
            // The parameter-count rule at block close covers this.
            return Ok(());
        };
        match project.resolve_image(document, id) {
            ImageResolution::Found => {},
            ImageResolution::Prefixed(actual) => {
                reporter.warning(
                    source,
                    Some(line),
                    format!(
                        "Image \"{id}\" for \"{document}\" is only available as \"{actual}\""
                    ),
                    Some(context),
                )?;
            },
            ImageResolution::Missing => {
                reporter.error(
                    source,
                    Some(line),
                    format!("Image \"{id}\" is not available for \"{document}\""),
                    Some(context),
                )?;
            },
        }
    }
    Ok(())
}

/// Last-line check for a completed block: the parameter count must match
/// the schema.
pub(crate) fn check_block_close(
    block: &Block,
    source: Option<&str>,
    reporter: &mut Reporter,
) -> Result<()> {
    if let Some(expected) = block_param_count(&block.name) {
        let got = block.params.len();
        if got != expected {
            reporter.warning(
                source,
                Some(block.line),
                format!(
                    "Block \"{}\" expects {expected} parameter(s), got {got}",
                    block.name
                ),
                None,
            )?;
        }
    }
    Ok(())
}

/// End-of-document pass: every `list`/`img` annotation must point at a
/// matching block definition in the same document.
pub(crate) fn check_cross_references(
    inlines: &[Inline],
    blocks: &[Block],
    source: Option<&str>,
    reporter: &mut Reporter,
) -> Result<()> {
    for inline in inlines {
        let targets: &[&str] = match inline.name.as_str() {
            "list" => &["list", "listnum"],
            "img" => &["image"],
            _ => continue,
        };
        let found = blocks.iter().any(|block| {
            targets.contains(&block.name.as_str())
                && block.params.first() == Some(&inline.raw_content)
        });
        if !found {
            reporter.error(
                source,
                Some(inline.line),
                format!(
                    "Inline \"{}\" points to undefined {} \"{}\"",
                    inline.name,
                    if inline.name == "img" {
                        "\"image\" block"
                    } else {
                        "\"list\"/\"listnum\" block"
                    },
                    inline.raw_content
                ),
                None,
            )?;
        }
    }
    Ok(())
}
