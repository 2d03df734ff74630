//! Line-level recogniser for `//name[p1][p2]{ … //}` block constructs.
//!
//! The [`BlockScanner`] consumes whole lines. Between blocks it decides
//! whether a line opens a construct; the opening line itself is scanned
//! character by character with a small parameter sub-machine that embeds an
//! [`InlineScanner`] so annotations inside parameters (`//footnote[fn]
//! [@<b>{C-\]}]`) parse with the exact same rules as annotations in
//! paragraph text. Inside a body, lines are stored verbatim until a line
//! starting with `//}` closes the block.

use tracing::{debug, trace};

use crate::error::Result;
use crate::inline::{InlineScanner, InlineStep};
use crate::report::Reporter;
use crate::types::{Block, Inline};

/// Sub-states while scanning the opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenState {
    /// Reading the block name right after `//`.
    Name,
    /// Inside a `[…]` parameter.
    InParam,
    /// Backslash seen inside a parameter.
    InParamBackslash,
    /// A parameter just closed; expecting `[`, `{`, or end of line.
    EndParam,
    /// `{` seen; everything further on this line is junk.
    Body,
}

/// Outcome of feeding one line to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStep {
    /// The scanner consumed the line (opening line or body line).
    Consumed,
    /// One block construct is complete.
    Done(Block),
    /// The line is not a block construct; the caller owns it.
    Text(String),
}

/// State machine for block constructs spanning one or more lines.
#[derive(Debug)]
pub struct BlockScanner {
    source: Option<String>,
    in_block: bool,
    name: String,
    params: Vec<String>,
    body: Vec<String>,
    start_line: usize,
    inlines: Vec<Inline>,
}

impl BlockScanner {
    /// Create a scanner for one document.
    #[must_use]
    pub fn new(source: Option<&str>) -> Self {
        Self {
            source: source.map(str::to_owned),
            in_block: false,
            name: String::new(),
            params: Vec::new(),
            body: Vec::new(),
            start_line: 0,
            inlines: Vec::new(),
        }
    }

    /// Rebind the scanner to another document, dropping any leftover state.
    pub fn rebind(&mut self, source: Option<&str>) {
        self.source = source.map(str::to_owned);
        self.reset();
        self.inlines.clear();
    }

    fn reset(&mut self) {
        self.in_block = false;
        self.name.clear();
        self.params.clear();
        self.body.clear();
        self.start_line = 0;
    }

    /// True when the scanner is between blocks.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !self.in_block
    }

    /// True while the scanner is inside an open block body.
    #[must_use]
    pub const fn in_block(&self) -> bool {
        self.in_block
    }

    /// Name, parameters, and opening line of the currently open block.
    #[must_use]
    pub fn open_block(&self) -> Option<(&str, &[String], usize)> {
        self.in_block
            .then_some((self.name.as_str(), self.params.as_slice(), self.start_line))
    }

    /// Drain the child inlines recognised inside block parameters.
    pub fn take_inlines(&mut self) -> Vec<Inline> {
        std::mem::take(&mut self.inlines)
    }

    /// Feed one raw line (terminator included, if the input had one).
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::Aborted`] when a diagnostic reaches the
    /// reporter's abort threshold.
    pub fn parse_line(
        &mut self,
        line_num: usize,
        raw_line: &str,
        reporter: &mut Reporter,
    ) -> Result<BlockStep> {
        let rstripped = raw_line.trim_end();
        if self.in_block {
            if let Some(junk) = rstripped.strip_prefix("//}") {
                debug!(name = %self.name, line_num, "block ended");
                if !junk.is_empty() {
                    reporter.error(
                        self.source.as_deref(),
                        Some(line_num),
                        "Junk after block end",
                        Some(rstripped),
                    )?;
                }
                let block = Block {
                    name: std::mem::take(&mut self.name),
                    params: std::mem::take(&mut self.params),
                    has_body: true,
                    body_lines: std::mem::take(&mut self.body),
                    line: self.start_line,
                };
                self.reset();
                return Ok(BlockStep::Done(block));
            }
            self.body.push(raw_line.to_owned());
            return Ok(BlockStep::Consumed);
        }

        if rstripped.starts_with("//}") {
            reporter.error(
                self.source.as_deref(),
                Some(line_num),
                "Invalid block end",
                Some(rstripped),
            )?;
            // Hand the line back so the rest of it is still scanned.
            return Ok(BlockStep::Text(raw_line.to_owned()));
        }
        if let Some(content) = rstripped.strip_prefix("//") {
            if !content.is_empty() {
                debug!(line_num, "block started");
                if let Some(block) = self.parse_open(line_num, rstripped, content, reporter)? {
                    self.reset();
                    return Ok(BlockStep::Done(block));
                }
                self.start_line = line_num;
                return Ok(BlockStep::Consumed);
            }
        }
        Ok(BlockStep::Text(raw_line.to_owned()))
    }

    /// Scan the part of an opening line after `//`.
    ///
    /// Returns the completed block for single-line forms (`//noindent`,
    /// `//footnote[a][b]`), or `None` when a `{` opened a body and the
    /// block stays open.
    #[allow(clippy::too_many_lines)]
    fn parse_open(
        &mut self,
        line_num: usize,
        full_line: &str,
        content: &str,
        reporter: &mut Reporter,
    ) -> Result<Option<Block>> {
        let source = self.source.clone();
        let source = source.as_deref();
        let mut state = OpenState::Name;
        let mut tmp = String::new();
        let mut ism = InlineScanner::new(line_num, full_line, source);
        let mut junk_reported = false;
        self.name.clear();
        self.params.clear();

        // Character offsets continue the full line's numbering: the name
        // starts at column 2, right after the slashes.
        for (i, ch) in content.chars().enumerate() {
            let pos = i + 2;
            trace!(pos, ?state, %ch, "block open step");
            match state {
                OpenState::Name => match ch {
                    '[' => {
                        self.end_name(line_num, full_line, reporter)?;
                        state = OpenState::InParam;
                    },
                    ']' => {
                        reporter.error(
                            source,
                            Some(line_num),
                            format!("Invalid param end at C{pos}"),
                            Some(full_line),
                        )?;
                        state = OpenState::EndParam;
                    },
                    '{' => {
                        // e.g. "//lead{"
                        self.end_name(line_num, full_line, reporter)?;
                        state = OpenState::Body;
                        self.in_block = true;
                    },
                    _ => self.name.push(ch),
                },
                OpenState::InParam => match ch {
                    ']' => {
                        if ism.is_active() {
                            reporter.error(
                                source,
                                Some(line_num),
                                format!("Inline is not finished while \"]\" is found at C{pos}"),
                                Some(full_line),
                            )?;
                            if ism.in_content() {
                                // Force-close: the "]" becomes content and
                                // the annotation is emitted as-is. The
                                // parameter stays open.
                                ism.push_literal(']');
                                self.inlines.push(ism.force_emit(pos));
                            } else {
                                tmp.push_str(&ism.take_text());
                                ism.abandon();
                                self.params.push(std::mem::take(&mut tmp));
                                state = OpenState::EndParam;
                            }
                        } else {
                            let mut param = std::mem::take(&mut tmp);
                            param.push_str(&ism.take_text());
                            trace!(%param, "new param");
                            self.params.push(param);
                            ism.abandon();
                            state = OpenState::EndParam;
                        }
                    },
                    '\\' => state = OpenState::InParamBackslash,
                    _ => match ism.feed(ch, pos, reporter)? {
                        InlineStep::Pending => {},
                        InlineStep::Done(inline) => self.inlines.push(inline),
                        InlineStep::Text(text) => tmp.push_str(&text),
                    },
                },
                OpenState::InParamBackslash => {
                    if ch == ']' {
                        // The backslash is eaten; the "]" lands wherever
                        // the text was going.
                        if ism.in_content() {
                            ism.push_literal(']');
                        } else {
                            tmp.push(']');
                        }
                    } else {
                        for forwarded in ['\\', ch] {
                            match ism.feed(forwarded, pos, reporter)? {
                                InlineStep::Pending => {},
                                InlineStep::Done(inline) => self.inlines.push(inline),
                                InlineStep::Text(text) => tmp.push_str(&text),
                            }
                        }
                    }
                    state = OpenState::InParam;
                },
                OpenState::EndParam => match ch {
                    '[' => {
                        ism.abandon();
                        state = OpenState::InParam;
                    },
                    '{' => {
                        state = OpenState::Body;
                        self.in_block = true;
                    },
                    _ => {
                        reporter.error(
                            source,
                            Some(line_num),
                            format!("Junk at C{pos}"),
                            Some(full_line),
                        )?;
                    },
                },
                OpenState::Body => {
                    if !junk_reported {
                        reporter.error(
                            source,
                            Some(line_num),
                            format!("Junk at C{pos}"),
                            Some(full_line),
                        )?;
                        junk_reported = true;
                    }
                },
            }
        }

        if ism.is_active() {
            reporter.error(
                source,
                Some(line_num),
                "Inline is not finished",
                Some(full_line),
            )?;
            ism.abandon();
        } else if state == OpenState::Name {
            // e.g. "//noindent"
            self.end_name(line_num, full_line, reporter)?;
            return Ok(Some(Block {
                name: std::mem::take(&mut self.name),
                params: Vec::new(),
                has_body: false,
                body_lines: Vec::new(),
                line: line_num,
            }));
        }

        if matches!(state, OpenState::InParam | OpenState::InParamBackslash) {
            reporter.error(
                source,
                Some(line_num),
                "Parameter is not closed at end of line",
                Some(full_line),
            )?;
            let mut param = std::mem::take(&mut tmp);
            param.push_str(&ism.take_text());
            self.params.push(param);
            state = OpenState::EndParam;
        }

        if !tmp.is_empty() {
            reporter.error(
                source,
                Some(line_num),
                format!("Unprocessed data is remaining (\"{tmp}\")"),
                Some(full_line),
            )?;
        }

        if state == OpenState::EndParam {
            // e.g. "//footnote[name][content]"
            return Ok(Some(Block {
                name: std::mem::take(&mut self.name),
                params: std::mem::take(&mut self.params),
                has_body: false,
                body_lines: Vec::new(),
                line: line_num,
            }));
        }

        Ok(None)
    }

    fn end_name(&self, line_num: usize, context: &str, reporter: &mut Reporter) -> Result<()> {
        let name = self.name.as_str();
        let source = self.source.as_deref();
        if name.is_empty() {
            reporter.error(source, Some(line_num), "Empty block name", Some(context))?;
        } else if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            reporter.error(
                source,
                Some(line_num),
                format!("Block name \"{name}\" contains non-alphanumeric characters"),
                Some(context),
            )?;
        }
        if name.chars().any(|c| c.is_ascii_uppercase()) {
            reporter.info(
                source,
                Some(line_num),
                format!("Block name \"{name}\" contains uppercase"),
                Some(context),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn feed(lines: &[&str]) -> (Vec<Block>, Vec<Inline>, Reporter) {
        let mut reporter = Reporter::new(Severity::Debug, Severity::Critical);
        let mut scanner = BlockScanner::new(Some("test.re"));
        let mut blocks = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            match scanner.parse_line(i + 1, line, &mut reporter).unwrap() {
                BlockStep::Done(block) => blocks.push(block),
                BlockStep::Consumed | BlockStep::Text(_) => {},
            }
        }
        let inlines = scanner.take_inlines();
        (blocks, inlines, reporter)
    }

    #[test]
    fn parameterless_block_without_body() {
        let (blocks, _, reporter) = feed(&["//noindent"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "noindent");
        assert!(blocks[0].params.is_empty());
        assert!(!blocks[0].has_body);
        assert!(reporter.problems().is_empty());
    }

    #[test]
    fn escaped_bracket_in_param() {
        // Scenario: "//footnote[fn][C-\]]" parses as ("fn", "C-]").
        let (blocks, _, reporter) = feed(&[r"//footnote[fn][C-\]]"]);
        assert!(reporter.problems().is_empty());
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.name, "footnote");
        assert_eq!(block.params, vec!["fn".to_owned(), "C-]".to_owned()]);
        assert!(!block.has_body);
        assert_eq!(block.line, 1);
    }

    #[test]
    fn annotation_with_escaped_bracket_in_param() {
        // Scenario: "//footnote[fn][@<b>{C-\]}]" yields an inline with
        // content "C-]" whose closing brace sits at column 24.
        let (blocks, inlines, reporter) = feed(&[r"//footnote[fn][@<b>{C-\]}]"]);
        assert!(reporter.problems().is_empty());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].params.len(), 2);
        assert_eq!(blocks[0].params[0], "fn");
        assert_eq!(inlines.len(), 1);
        assert_eq!(inlines[0].name, "b");
        assert_eq!(inlines[0].raw_content, "C-]");
        assert_eq!(inlines[0].line, 1);
        assert_eq!(inlines[0].column, Some(24));
    }

    #[test]
    fn unescaped_bracket_inside_annotation_recovers() {
        // Scenario: "//footnote[fn][@<b>{C-]}]" force-closes the
        // annotation, with exactly one Error.
        let (blocks, inlines, reporter) = feed(&[r"//footnote[fn][@<b>{C-]}]"]);
        assert_eq!(reporter.problems().len(), 1);
        assert_eq!(reporter.problems()[0].severity, Severity::Error);
        assert!(
            reporter.problems()[0]
                .description
                .contains("Inline is not finished")
        );
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].params.len(), 2);
        assert_eq!(blocks[0].params[0], "fn");
        assert_eq!(inlines.len(), 1);
        assert_eq!(inlines[0].name, "b");
        assert_eq!(inlines[0].raw_content, "C-]");
    }

    #[test]
    fn body_lines_round_trip() {
        let (blocks, _, reporter) = feed(&["//emlist[code]{\n", "  x = 1\r\n", "\n", "//}\n"]);
        assert!(reporter.problems().is_empty());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].has_body);
        assert_eq!(blocks[0].body_lines.concat(), "  x = 1\r\n\n");
    }

    #[test]
    fn spurious_close_is_error_and_passthrough() {
        let mut reporter = Reporter::new(Severity::Debug, Severity::Critical);
        let mut scanner = BlockScanner::new(None);
        let step = scanner.parse_line(1, "//}", &mut reporter).unwrap();
        assert_eq!(step, BlockStep::Text("//}".to_owned()));
        assert_eq!(reporter.problems()[0].severity, Severity::Error);
    }

    #[test]
    fn junk_after_block_end() {
        let (blocks, _, reporter) = feed(&["//lead{", "text", "//} trailing"]);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].has_body);
        assert_eq!(reporter.problems().len(), 1);
        assert!(
            reporter.problems()[0]
                .description
                .contains("Junk after block end")
        );
    }

    #[test]
    fn junk_between_params_is_error() {
        let (blocks, _, reporter) = feed(&["//footnote[a]x[b]"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].params, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(reporter.problems().len(), 1);
        assert!(reporter.problems()[0].description.contains("Junk at C13"));
    }

    #[test]
    fn uppercase_block_name_is_info() {
        let (blocks, _, reporter) = feed(&["//Lead{", "//}"]);
        assert_eq!(blocks[0].name, "Lead");
        assert_eq!(reporter.problems()[0].severity, Severity::Info);
    }

    #[test]
    fn unclosed_param_recovers() {
        let (blocks, _, reporter) = feed(&["//footnote[fn][dangling"]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].params,
            vec!["fn".to_owned(), "dangling".to_owned()]
        );
        assert!(
            reporter
                .problems()
                .iter()
                .any(|p| p.description.contains("Parameter is not closed"))
        );
    }
}
