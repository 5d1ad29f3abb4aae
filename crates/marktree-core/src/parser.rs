//! The parser façade.
//!
//! Owns the per-parse state shared by every tokenizer: the options, the rule
//! tables built from them, the source file with its diagnostics, the offset
//! map and the nesting flags.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::ast::{Node, Parent};
use crate::entities;
use crate::error::{ConfigError, Messages, ParseError};
use crate::options::Options;
use crate::position::{Point, Position};
use crate::source::SourceFile;
use crate::tokenizer::{self, locate, Mode, Rule};
use crate::util;
use crate::{block, inline};

/// Result of parsing that keeps every diagnostic.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed tree. Complete unless a fatal error cut a tokenize loop
    /// short, in which case it holds everything produced up to that point.
    pub root: Node,
    /// Warnings and errors raised while parsing.
    pub messages: Messages,
}

impl ParseResult {
    /// Check if parsing raised no diagnostics at all.
    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check if any fatal errors occurred.
    pub fn has_fatal_errors(&self) -> bool {
        self.messages.has_fatal()
    }
}

/// Markdown parser.
///
/// A parser can be reused for many documents, but parses one at a time:
/// all state below belongs to the parse in flight and is reset when the
/// next one starts.
///
/// ```rust
/// use marktree_core::{Node, Options, Parser};
///
/// let mut parser = Parser::new(Options::default());
/// let root = parser.parse("# Hello\n").unwrap();
/// assert_eq!(root.children().unwrap()[0].kind(), "heading");
/// ```
pub struct Parser {
    pub(crate) options: Options,
    pub(crate) block_rules: Vec<Rule>,
    pub(crate) inline_rules: Vec<Rule>,
    pub(crate) file: SourceFile,
    /// Characters stripped from the start of each line by enclosing
    /// constructs.
    pub(crate) offset: BTreeMap<usize, usize>,
    pub(crate) in_link: bool,
    pub(crate) in_list: bool,
    pub(crate) in_block: bool,
    pub(crate) at_start: bool,
    pub(crate) eof: Option<Point>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Parser {
    /// Create a parser for the given dialect.
    pub fn new(options: Options) -> Self {
        Self {
            options,
            block_rules: block::rules(&options),
            inline_rules: inline::rules(&options),
            file: SourceFile::new(""),
            offset: BTreeMap::new(),
            in_link: false,
            in_list: false,
            in_block: false,
            at_start: true,
            eof: None,
        }
    }

    /// Create a parser from a JSON options object.
    ///
    /// Fails before anything is parsed when the object is invalid.
    pub fn from_json(options: &Value) -> Result<Self, ConfigError> {
        Ok(Self::new(Options::from_json(options)?))
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Diagnostics of the most recent parse.
    pub fn messages(&self) -> &Messages {
        self.file.messages()
    }

    /// Parse with error recovery, returning the tree and all diagnostics.
    pub fn parse_with_recovery(&mut self, source: &str) -> ParseResult {
        let root = self.parse_internal(source);
        ParseResult {
            root,
            messages: self.file.take_messages(),
        }
    }

    /// Parse `source`, failing with the first fatal error.
    ///
    /// Warnings do not make this fail; they stay available through
    /// [`messages`](Self::messages).
    pub fn parse(&mut self, source: &str) -> Result<Node, ParseError> {
        let root = self.parse_internal(source);
        match self.file.messages().first_fatal() {
            Some(error) => Err(error.clone()),
            None => Ok(root),
        }
    }

    fn parse_internal(&mut self, source: &str) -> Node {
        debug!(
            len = source.len(),
            gfm = self.options.gfm,
            commonmark = self.options.commonmark,
            pedantic = self.options.pedantic,
            footnotes = self.options.footnotes,
            "parsing document"
        );

        self.file = SourceFile::new(source);
        self.offset.clear();
        self.in_link = false;
        self.in_list = false;
        self.in_block = false;
        self.at_start = true;
        self.eof = None;

        let content = self.file.content().to_string();
        let children = self.tokenize_block(&content, self.file.start());

        let start = Point::start();
        let mut root = Node::Root(Parent {
            children,
            position: Some(Position::new(start, self.eof.unwrap_or(start))),
        });
        if !self.options.position {
            root.strip_positions();
        }

        debug!(
            blocks = root.children().map_or(0, <[Node]>::len),
            messages = self.file.messages().len(),
            "parsed document"
        );
        root
    }

    pub(crate) fn rules(&self, mode: Mode) -> &[Rule] {
        match mode {
            Mode::Block => &self.block_rules,
            Mode::Inline => &self.inline_rules,
        }
    }

    pub(crate) fn tokenize_block(&mut self, value: &str, start: Point) -> Vec<Node> {
        tokenizer::tokenize(self, Mode::Block, value, start)
    }

    /// An `<a>` opened by raw HTML only suppresses links until the end of
    /// this run.
    pub(crate) fn tokenize_inline(&mut self, value: &str, start: Point) -> Vec<Node> {
        let in_link = self.in_link;
        let nodes = tokenizer::tokenize(self, Mode::Inline, value, start);
        self.in_link = in_link;
        nodes
    }

    /// Remove backslashes before characters the dialect can escape.
    pub(crate) fn descape(&self, value: &str) -> String {
        util::descape(value, self.options.escapes())
    }

    /// Decode character references in `value`, which starts at `at`.
    /// Problems are reported as warnings at the offending `&`.
    pub(crate) fn decode_raw(&mut self, value: &str, at: Point) -> String {
        let mut warnings = Vec::new();
        let decoded = entities::decode_raw(value, &mut warnings).into_owned();
        for warning in warnings {
            let point = locate(self, at, &value[..warning.index]);
            self.file.entity_warning(warning.reason, point);
        }
        decoded
    }

    /// Run `f` with the escape rule switched off.
    pub(crate) fn without_escapes<T>(&mut self, f: impl FnOnce(&mut Parser) -> T) -> T {
        let rules = self.inline_rules.clone();
        self.inline_rules.retain(|rule| rule.name != "escape");
        let out = f(self);
        self.inline_rules = rules;
        out
    }
}
