//! Character-level recogniser for `@<name>{content}` annotations.
//!
//! One [`InlineScanner`] handles one line. Characters are fed in one at a
//! time; most of them come straight back out as passthrough text, and the
//! machine only holds on to input once it has seen an `@`. Malformed
//! annotations are reported but tolerated: the machine always recovers into
//! a well-defined state so the rest of the line still gets scanned.
//!
//! State walk for the happy path `@<b>{x}`:
//!
//! ```text
//! Idle -@-> At -<-> Tag -(name)-> Tag -`>`-> TagEnd -{-> Content -}-> Idle
//! ```
//!
//! Content may escape `\}` and `\\`; a stray `@` inside content is
//! anomalous but absorbed; nested annotations are not a thing and only earn
//! an `Info`.

use tracing::trace;

use crate::error::Result;
use crate::report::Reporter;
use crate::types::Inline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between annotations.
    Idle,
    /// Just saw `@`.
    At,
    /// Inside `@<…`, accumulating the name.
    Tag,
    /// Saw `@<name>`, expecting `{`.
    TagEnd,
    /// Inside `{ … }`.
    Content,
    /// Backslash seen inside content.
    ContentBackslash,
    /// `@` seen inside content, which may be wrong.
    ContentAt,
}

/// Outcome of feeding one character to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineStep {
    /// The scanner consumed the character.
    Pending,
    /// One annotation is complete.
    Done(Inline),
    /// The character (possibly with buffered prefix) is not part of an
    /// annotation; the caller owns it now.
    Text(String),
}

/// State machine for inline annotations within a single line.
#[derive(Debug)]
pub struct InlineScanner {
    source: Option<String>,
    line: usize,
    context: String,
    state: State,
    buf: String,
    name: String,
}

impl InlineScanner {
    /// Create a scanner for one line. `context` is the full line, kept for
    /// diagnostics.
    #[must_use]
    pub fn new(line: usize, context: &str, source: Option<&str>) -> Self {
        Self {
            source: source.map(str::to_owned),
            line,
            context: context.trim_end().to_owned(),
            state: State::Idle,
            buf: String::new(),
            name: String::new(),
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.buf.clear();
        self.name.clear();
    }

    /// True while the scanner is somewhere inside an annotation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != State::Idle
    }

    /// True while the scanner is inside annotation content.
    #[must_use]
    pub fn in_content(&self) -> bool {
        matches!(
            self.state,
            State::Content | State::ContentBackslash | State::ContentAt
        )
    }

    /// Append a character to the current buffer without interpreting it.
    ///
    /// Used by the block machine to deliver an escaped `]` into annotation
    /// content. A pending `@`/`\` marker is folded into the content first
    /// so character order is preserved.
    pub fn push_literal(&mut self, ch: char) {
        match self.state {
            State::ContentAt => {
                self.buf.push('@');
                self.state = State::Content;
            },
            State::ContentBackslash => {
                self.buf.push('\\');
                self.state = State::Content;
            },
            _ => {},
        }
        self.buf.push(ch);
    }

    /// Drain the buffered passthrough text.
    pub fn take_text(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }

    /// Abandon annotation parsing and return to the idle state.
    pub fn abandon(&mut self) {
        self.reset();
    }

    /// Close the annotation being parsed as if its `}` had been seen,
    /// returning the synthesised inline. Pending escape/`@` markers are
    /// folded into the content first.
    pub fn force_emit(&mut self, column: usize) -> Inline {
        match self.state {
            State::ContentAt => self.buf.push('@'),
            State::ContentBackslash => self.buf.push('\\'),
            _ => {},
        }
        let inline = Inline {
            name: std::mem::take(&mut self.name),
            raw_content: std::mem::take(&mut self.buf),
            line: self.line,
            column: Some(column),
        };
        self.reset();
        inline
    }

    /// Feed one character at character offset `pos` within the line.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::Aborted`] when a diagnostic reaches the
    /// reporter's abort threshold.
    pub fn feed(&mut self, ch: char, pos: usize, reporter: &mut Reporter) -> Result<InlineStep> {
        trace!(pos, state = ?self.state, %ch, "inline step");
        match self.state {
            State::Idle => Ok(self.feed_idle(ch)),
            State::At => Ok(self.feed_at(ch)),
            State::Tag => self.feed_tag(ch, reporter),
            State::TagEnd => self.feed_tag_end(ch, pos, reporter),
            State::Content => Ok(self.feed_content(ch, pos)),
            State::ContentBackslash => self.feed_content_backslash(ch, reporter),
            State::ContentAt => self.feed_content_at(ch, pos, reporter),
        }
    }

    fn feed_idle(&mut self, ch: char) -> InlineStep {
        if ch == '@' {
            self.state = State::At;
            let leftover = std::mem::take(&mut self.buf);
            if leftover.is_empty() {
                return InlineStep::Pending;
            }
            // Leftovers from error recovery must not bleed into the next
            // annotation's name.
            return InlineStep::Text(leftover);
        }
        if self.buf.is_empty() {
            InlineStep::Text(ch.to_string())
        } else {
            // Leftovers from error recovery (e.g. the character after
            // "@<tag>x") travel with the current character.
            let mut text = std::mem::take(&mut self.buf);
            text.push(ch);
            self.reset();
            InlineStep::Text(text)
        }
    }

    fn feed_at(&mut self, ch: char) -> InlineStep {
        match ch {
            '<' => {
                self.state = State::Tag;
                InlineStep::Pending
            },
            // Keep the state, dropping the previous '@' character.
            '@' => InlineStep::Text("@".to_owned()),
            _ => {
                self.reset();
                InlineStep::Text(format!("@{ch}"))
            },
        }
    }

    fn feed_tag(&mut self, ch: char, reporter: &mut Reporter) -> Result<InlineStep> {
        if ch != '>' {
            self.buf.push(ch);
            return Ok(InlineStep::Pending);
        }
        let name = std::mem::take(&mut self.buf);
        if name.is_empty() {
            self.report_error(reporter, "Empty inline name".to_owned())?;
        } else if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.report_error(
                reporter,
                format!("Inline name \"{name}\" has non-alphanumeric characters"),
            )?;
        }
        if name.chars().any(|c| c.is_ascii_uppercase()) {
            self.report_info(reporter, format!("Inline name \"{name}\" has uppercase"))?;
        }
        self.name = name;
        self.state = State::TagEnd;
        Ok(InlineStep::Pending)
    }

    fn feed_tag_end(
        &mut self,
        ch: char,
        pos: usize,
        reporter: &mut Reporter,
    ) -> Result<InlineStep> {
        if ch == '{' {
            self.state = State::Content;
            return Ok(InlineStep::Pending);
        }
        self.report_error(
            reporter,
            format!("Wrong character at C{pos} (expected \"{{\", got \"{ch}\")"),
        )?;
        // We are sure we saw "@<name>"; interpret it as "@<name>{}" and
        // move on so the rest of the line still gets scanned.
        let inline = Inline {
            name: std::mem::take(&mut self.name),
            raw_content: String::new(),
            line: self.line,
            column: None,
        };
        self.reset();
        if ch == '@' {
            self.state = State::At;
        } else {
            self.buf.push(ch);
        }
        Ok(InlineStep::Done(inline))
    }

    fn feed_content(&mut self, ch: char, pos: usize) -> InlineStep {
        match ch {
            '}' => {
                let inline = Inline {
                    name: std::mem::take(&mut self.name),
                    raw_content: std::mem::take(&mut self.buf),
                    line: self.line,
                    column: Some(pos),
                };
                self.reset();
                InlineStep::Done(inline)
            },
            '@' => {
                self.state = State::ContentAt;
                InlineStep::Pending
            },
            '\\' => {
                self.state = State::ContentBackslash;
                InlineStep::Pending
            },
            _ => {
                self.buf.push(ch);
                InlineStep::Pending
            },
        }
    }

    fn feed_content_backslash(&mut self, ch: char, reporter: &mut Reporter) -> Result<InlineStep> {
        if ch == '}' || ch == '\\' {
            self.buf.push(ch);
        } else {
            self.report_info(
                reporter,
                format!(
                    "Backslash inside inline \"{}\" is not effective toward \"{ch}\"",
                    self.name
                ),
            )?;
            self.buf.push('\\');
            self.buf.push(ch);
        }
        self.state = State::Content;
        Ok(InlineStep::Pending)
    }

    fn feed_content_at(
        &mut self,
        ch: char,
        pos: usize,
        reporter: &mut Reporter,
    ) -> Result<InlineStep> {
        match ch {
            '}' => {
                self.buf.push('@');
                let inline = Inline {
                    name: std::mem::take(&mut self.name),
                    raw_content: std::mem::take(&mut self.buf),
                    line: self.line,
                    column: Some(pos),
                };
                self.reset();
                Ok(InlineStep::Done(inline))
            },
            '<' => {
                // Nested annotations are not supported; assume the two
                // characters are plain content of the surrounding one.
                self.report_info(reporter, format!("Possible nested inline tag at C{pos}"))?;
                self.buf.push_str("@<");
                self.state = State::Content;
                Ok(InlineStep::Pending)
            },
            '@' => {
                self.buf.push('@');
                Ok(InlineStep::Pending)
            },
            _ => {
                self.buf.push('@');
                self.buf.push(ch);
                self.state = State::Content;
                Ok(InlineStep::Pending)
            },
        }
    }

    /// Handle the end of the line.
    ///
    /// Returns buffered passthrough text when the machine was idle or had
    /// only seen a bare `@`. Any other state means an annotation was left
    /// unterminated, which is an Error.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::Aborted`] from the reporter.
    pub fn finish(&mut self, reporter: &mut Reporter) -> Result<Option<String>> {
        match self.state {
            State::Idle => {
                let leftover = std::mem::take(&mut self.buf);
                Ok((!leftover.is_empty()).then_some(leftover))
            },
            State::At => {
                self.reset();
                Ok(Some("@".to_owned()))
            },
            _ => {
                self.report_error(reporter, "Invalid state at end of line".to_owned())?;
                self.reset();
                Ok(None)
            },
        }
    }

    fn report_error(&self, reporter: &mut Reporter, description: String) -> Result<()> {
        reporter.error(
            self.source.as_deref(),
            Some(self.line),
            description,
            Some(&self.context),
        )
    }

    fn report_info(&self, reporter: &mut Reporter, description: String) -> Result<()> {
        reporter.info(
            self.source.as_deref(),
            Some(self.line),
            description,
            Some(&self.context),
        )
    }
}
