//! Document parser for `.re` markup sources.
//!
//! A [`DocumentParser`] processes documents line by line. For each line it
//! first performs the top-level recognitions — section headings
//! ("bookmarks"), comments, manual diagnostic directives, list-bullet
//! heuristics — then hands the line to the [`BlockScanner`]; lines that are
//! not block constructs are finally scanned character by character with a
//! fresh [`InlineScanner`] to pick up paragraph annotations.
//!
//! The parser owns the shared [`Reporter`] and borrows the
//! [`Project`](crate::project::Project) (when there is one) for image
//! checks, so one parser instance can walk a whole book in catalog order
//! and accumulate bookmarks, blocks, inlines, and problems across all of
//! its documents. Cross-reference checks stay scoped to the document they
//! belong to.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::block::{BlockScanner, BlockStep};
use crate::checkers;
use crate::error::{Error, Result};
use crate::inline::{InlineScanner, InlineStep};
use crate::project::Project;
use crate::report::Reporter;
use crate::types::{Block, Bookmark, Inline, Problem};

/// Heading line: a run of `=`, an optional literal `column` marker, the
/// spacing, and the title.
#[allow(clippy::expect_used)]
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<level>=+)(?P<column>column)?(?P<sp>\s*)(?P<title>.+)$")
        .expect("heading pattern is valid")
});

/// Manual diagnostic directive: `#@type(message)`.
#[allow(clippy::expect_used)]
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#@(?P<type>.+)\((?P<message>.+)\)$").expect("directive pattern is valid")
});

/// Parser for one or more source documents sharing a reporter.
#[derive(Debug)]
pub struct DocumentParser<'p> {
    project: Option<&'p Project>,
    reporter: Reporter,
    bsm: BlockScanner,
    source: Option<String>,
    base_level: usize,
    chapter_index: usize,
    bookmarks: Vec<Bookmark>,
    chapter_map: HashMap<(String, usize), usize>,
    blocks: Vec<Block>,
    inlines: Vec<Inline>,
    doc_block_start: usize,
    doc_inline_start: usize,
}

impl<'p> DocumentParser<'p> {
    /// Create a parser. `project` enables the image checks; single-document
    /// runs may pass `None`.
    #[must_use]
    pub fn new(project: Option<&'p Project>, reporter: Reporter) -> Self {
        Self {
            project,
            reporter,
            bsm: BlockScanner::new(None),
            source: None,
            base_level: 0,
            chapter_index: 0,
            bookmarks: Vec::new(),
            chapter_map: HashMap::new(),
            blocks: Vec::new(),
            inlines: Vec::new(),
            doc_block_start: 0,
            doc_inline_start: 0,
        }
    }

    /// Parse one document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for sources that are not valid UTF-8,
    /// [`Error::Io`] when the file cannot be read, and
    /// [`Error::Aborted`] when a problem reaches the abort threshold.
    pub fn parse_file(&mut self, path: &Path, base_level: usize, source_name: &str) -> Result<()> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|_| Error::Encoding {
            source_name: source_name.to_owned(),
        })?;
        self.parse_str(&text, base_level, source_name)
    }

    /// Parse one document from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aborted`] when a problem reaches the abort
    /// threshold.
    pub fn parse_str(&mut self, text: &str, base_level: usize, source_name: &str) -> Result<()> {
        self.parse_lines(text.split_inclusive('\n'), base_level, source_name)
    }

    /// Parse one document given as individual lines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aborted`] when a problem reaches the abort
    /// threshold.
    pub fn parse_lines<'a, I>(
        &mut self,
        lines: I,
        base_level: usize,
        source_name: &str,
    ) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        debug!(source_name, base_level, "parsing document");
        self.begin_document(base_level, source_name);
        for (i, raw) in lines.into_iter().enumerate() {
            let line_num = i + 1;
            // A leading byte-order mark is stripped silently.
            let raw = if line_num == 1 {
                raw.strip_prefix('\u{feff}').unwrap_or(raw)
            } else {
                raw
            };
            self.handle_line(line_num, raw)?;
        }
        self.end_of_document()
    }

    fn begin_document(&mut self, base_level: usize, source_name: &str) {
        self.source = Some(source_name.to_owned());
        self.base_level = base_level;
        self.chapter_index = 0;
        self.bsm.rebind(Some(source_name));
        self.doc_block_start = self.blocks.len();
        self.doc_inline_start = self.inlines.len();
    }

    /// Record a synthetic part bookmark at level 1. Used by the book-level
    /// driver before parsing a part's chapters.
    pub fn append_part_bookmark(&mut self, title: &str) {
        self.push_bookmark(Bookmark {
            title: title.trim().to_owned(),
            level: 1,
            source: None,
            chapter_index: None,
            spacing: String::new(),
            is_column: false,
        });
    }

    fn handle_line(&mut self, line_num: usize, raw: &str) -> Result<()> {
        let rstripped = raw.trim_end();
        let source = self.source.clone();
        let source = source.as_deref();

        if self.bsm.in_block() {
            // Comments and directives inside a body are kept in the body;
            // they are only flagged.
            if rstripped.starts_with("#@#") {
                let name = self.open_block_name();
                self.reporter.info(
                    source,
                    Some(line_num),
                    format!("Comment in block \"{name}\". It will be included in the block"),
                    Some(rstripped),
                )?;
            } else if rstripped.starts_with("#@") {
                if let Some(caps) = DIRECTIVE.captures(rstripped) {
                    let name = self.open_block_name();
                    let message = &caps["message"];
                    self.reporter.warning(
                        source,
                        Some(line_num),
                        format!(
                            "Manual warning in block \"{name}\": \"{message}\". \
                             It will be included in the block"
                        ),
                        Some(rstripped),
                    )?;
                }
            }
            if let Some(caps) = HEADING.captures(rstripped) {
                // Separator-looking lines ("=====…") show up in listings;
                // anything else looks like a heading that forgot the block
                // was still open.
                if caps.name("column").is_none()
                    && caps["sp"].is_empty()
                    && caps["title"].starts_with('=')
                {
                    self.reporter.warning(
                        source,
                        Some(line_num),
                        "Separator-like heading in block",
                        Some(rstripped),
                    )?;
                } else {
                    let name = self.open_block_name();
                    self.reporter.warning(
                        source,
                        Some(line_num),
                        format!("Heading in block \"{name}\""),
                        Some(rstripped),
                    )?;
                }
            }
            match self.bsm.parse_line(line_num, raw, &mut self.reporter)? {
                BlockStep::Done(block) => self.finish_block(block)?,
                BlockStep::Consumed | BlockStep::Text(_) => {},
            }
            return Ok(());
        }

        if self.handle_heading(line_num, rstripped) {
            return Ok(());
        }

        if rstripped.starts_with("#@#") {
            // Comment; dropped outside bodies.
            return Ok(());
        } else if rstripped.starts_with("#@") {
            if let Some(caps) = DIRECTIVE.captures(rstripped) {
                let kind = &caps["type"];
                let message = &caps["message"];
                if kind == "warn" {
                    self.reporter.warning(
                        source,
                        Some(line_num),
                        format!("Manual warning \"{message}\""),
                        Some(rstripped),
                    )?;
                } else {
                    self.reporter.error(
                        source,
                        Some(line_num),
                        format!(
                            "Unknown warn-like operation \"{kind}\". \
                             May be \"warn\". Message: \"{message}\""
                        ),
                        Some(rstripped),
                    )?;
                }
                return Ok(());
            }
        } else if let Some(rest) = rstripped.strip_prefix('*') {
            if rest.chars().next().is_some_and(|c| !c.is_whitespace()) {
                self.reporter.warning(
                    source,
                    Some(line_num),
                    "Unordered list operator (\"*\") without a single space",
                    Some(rstripped),
                )?;
            }
        } else {
            let mut chars = rstripped.chars();
            if let (Some(first), Some('.'), Some(third)) =
                (chars.next(), chars.next(), chars.next())
            {
                if first.is_ascii_digit() && !third.is_whitespace() {
                    self.reporter.warning(
                        source,
                        Some(line_num),
                        format!(
                            "Ordered list operator (\"{}\") without a space",
                            &rstripped[..2]
                        ),
                        Some(rstripped),
                    )?;
                }
            }
        }

        if self.bookmarks.is_empty() {
            self.reporter.info(
                source,
                Some(line_num),
                "No bookmark found yet",
                Some(rstripped),
            )?;
        }

        let was_idle = self.bsm.is_idle();
        match self.bsm.parse_line(line_num, raw, &mut self.reporter)? {
            BlockStep::Done(block) => {
                if was_idle {
                    checkers::check_block_open(
                        &block.name,
                        &block.params,
                        block.line,
                        rstripped,
                        source,
                        self.project,
                        &mut self.reporter,
                    )?;
                }
                self.finish_block(block)?;
                self.drain_child_inlines(rstripped)?;
            },
            BlockStep::Consumed => {
                if was_idle && self.bsm.in_block() {
                    if let Some((name, params, line)) = self.bsm.open_block() {
                        checkers::check_block_open(
                            name,
                            params,
                            line,
                            rstripped,
                            source,
                            self.project,
                            &mut self.reporter,
                        )?;
                    }
                }
                self.drain_child_inlines(rstripped)?;
            },
            BlockStep::Text(_) => {
                // Not a block construct: scan the line for paragraph
                // annotations.
                let mut ism = InlineScanner::new(line_num, rstripped, source);
                for (pos, ch) in rstripped.chars().enumerate() {
                    match ism.feed(ch, pos, &mut self.reporter)? {
                        InlineStep::Done(inline) => self.record_inline(inline, rstripped)?,
                        InlineStep::Pending | InlineStep::Text(_) => {},
                    }
                }
                ism.finish(&mut self.reporter)?;
            },
        }
        Ok(())
    }

    fn open_block_name(&self) -> String {
        self.bsm
            .open_block()
            .map(|(name, _, _)| name.to_owned())
            .unwrap_or_default()
    }

    fn handle_heading(&mut self, line_num: usize, rstripped: &str) -> bool {
        let Some(caps) = HEADING.captures(rstripped) else {
            return false;
        };
        let level_run = caps["level"].chars().count();
        let mut is_column = caps.name("column").is_some();
        let spacing = caps["sp"].to_owned();
        let mut title = caps["title"].trim().to_owned();
        if is_column && spacing.is_empty() {
            // "column" glued straight onto further text is part of the
            // title, not a marker.
            is_column = false;
            title = format!("column{title}");
        }
        let chapter_index = if level_run == 1 {
            let index = self.chapter_index;
            self.chapter_index += 1;
            Some(index)
        } else {
            None
        };
        debug!(line_num, %title, level = self.base_level + level_run, "bookmark");
        self.push_bookmark(Bookmark {
            title,
            level: self.base_level + level_run,
            source: self.source.clone(),
            chapter_index,
            spacing,
            is_column,
        });
        true
    }

    fn push_bookmark(&mut self, bookmark: Bookmark) {
        if let (Some(source), Some(index)) = (&bookmark.source, bookmark.chapter_index) {
            self.chapter_map
                .insert((source.clone(), index), self.bookmarks.len());
        }
        self.bookmarks.push(bookmark);
    }

    fn finish_block(&mut self, block: Block) -> Result<()> {
        checkers::check_block_close(&block, self.source.as_deref(), &mut self.reporter)?;
        self.blocks.push(block);
        Ok(())
    }

    fn drain_child_inlines(&mut self, context: &str) -> Result<()> {
        for inline in self.bsm.take_inlines() {
            self.record_inline(inline, context)?;
        }
        Ok(())
    }

    fn record_inline(&mut self, inline: Inline, context: &str) -> Result<()> {
        self.inlines.push(inline);
        if let Some(inline) = self.inlines.last() {
            checkers::check_inline(
                inline,
                self.source.as_deref(),
                Some(context),
                &mut self.reporter,
            )?;
        }
        Ok(())
    }

    fn end_of_document(&mut self) -> Result<()> {
        checkers::check_cross_references(
            &self.inlines[self.doc_inline_start..],
            &self.blocks[self.doc_block_start..],
            self.source.as_deref(),
            &mut self.reporter,
        )?;
        if !self.bsm.is_idle() {
            let name = self.open_block_name();
            self.reporter.error(
                self.source.as_deref(),
                None,
                format!("Block \"{name}\" is not ended"),
                None,
            )?;
            self.bsm.rebind(self.source.as_deref());
        }
        Ok(())
    }

    /// Problems retained so far.
    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        self.reporter.problems()
    }

    /// Bookmarks collected so far, in input order.
    #[must_use]
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Blocks collected so far, across all parsed documents.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Inline annotations collected so far, across all parsed documents.
    #[must_use]
    pub fn inlines(&self) -> &[Inline] {
        &self.inlines
    }

    /// Look up the bookmark of a chapter by `(source document, chapter
    /// index)`.
    #[must_use]
    pub fn chapter_bookmark(&self, source: &str, chapter_index: usize) -> Option<&Bookmark> {
        self.chapter_map
            .get(&(source.to_owned(), chapter_index))
            .map(|&i| &self.bookmarks[i])
    }

    /// Consume the parser, yielding `(problems, bookmarks, blocks,
    /// inlines)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Problem>, Vec<Bookmark>, Vec<Block>, Vec<Inline>) {
        (
            self.reporter.into_problems(),
            self.bookmarks,
            self.blocks,
            self.inlines,
        )
    }
}
