//! The document being parsed and its diagnostics sink.

use memchr::memchr_iter;
use tracing::warn;

use crate::error::{Messages, ParseError, ParseErrorKind};
use crate::position::Point;

const BOM: char = '\u{feff}';

/// Normalized source text plus the messages raised while parsing it.
///
/// Line endings are normalized to `\n` on construction. A leading byte order
/// mark stays part of the text so that offsets account for it, but
/// [`content`](Self::content) skips it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    text: String,
    bom: bool,
    /// Character offset at which each line starts.
    line_starts: Vec<usize>,
    messages: Messages,
}

impl SourceFile {
    pub fn new(input: &str) -> Self {
        let text = normalize_line_endings(input);
        let bom = text.starts_with(BOM);
        let line_starts = index_lines(&text);
        Self {
            text,
            bom,
            line_starts,
            messages: Messages::new(),
        }
    }

    /// The normalized text, including a byte order mark if one was present.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The normalized text without a leading byte order mark.
    pub fn content(&self) -> &str {
        if self.bom {
            &self.text[BOM.len_utf8()..]
        } else {
            &self.text
        }
    }

    /// Where the content starts: after the byte order mark, if any.
    pub fn start(&self) -> Point {
        if self.bom {
            Point::new(1, 2, 1)
        } else {
            Point::start()
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Character offset of a 1-based line and column.
    ///
    /// Returns `None` for lines past the end of the text.
    pub fn to_offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        Some(start + column.saturating_sub(1))
    }

    /// Build a point from a line and column.
    pub fn point(&self, line: usize, column: usize) -> Point {
        let offset = self
            .to_offset(line, column)
            .unwrap_or_else(|| self.text.chars().count());
        Point::new(line, column, offset)
    }

    /// Record a non-fatal message.
    pub fn warn(&mut self, message: impl Into<String>, position: Option<Point>) {
        self.record(ParseError::new(message, position));
    }

    /// Record a fatal message and hand it back so the caller can unwind.
    pub fn fail(&mut self, error: ParseError) -> ParseError {
        let error = error.into_fatal();
        self.record(error.clone());
        error
    }

    pub(crate) fn record(&mut self, message: ParseError) {
        warn!(
            kind = ?message.kind,
            fatal = message.fatal,
            "{}",
            message
        );
        self.messages.push(message);
    }

    pub(crate) fn entity_warning(&mut self, message: impl Into<String>, position: Point) {
        self.record(ParseError::new(message, Some(position)).with_kind(ParseErrorKind::Entity));
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Messages {
        std::mem::take(&mut self.messages)
    }
}

fn normalize_line_endings(input: &str) -> String {
    if memchr::memchr(b'\r', input.as_bytes()).is_none() {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    out
}

fn index_lines(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut chars = 0;
    let mut last = 0;
    for newline in memchr_iter(b'\n', text.as_bytes()) {
        chars += text[last..newline].chars().count() + 1;
        starts.push(chars);
        last = newline + 1;
    }
    starts
}
