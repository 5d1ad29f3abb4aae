//! The eat/tokenize engine shared by the block and inline phases.
//!
//! A tokenize call walks the remaining input, trying an ordered list of
//! [`Rule`]s from the top after every successful match. Rules consume input
//! through [`Eat`], which keeps the line/column cursor in sync with the
//! per-line offset map on the [`Parser`] and attaches positions to nodes.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use crate::ast::Node;
use crate::error::ParseError;
use crate::parser::Parser;
use crate::position::{Point, Position};

/// Signature of every tokenizer.
///
/// Receives the remaining input as `value`. In `silent` mode a tokenizer
/// only reports whether it would match and must not eat anything.
pub(crate) type Tokenizer =
    fn(&mut Parser, &mut Eat<'_>, &str, bool) -> Result<bool, ParseError>;

/// Earliest byte index at or after `from` where an inline tokenizer could
/// match.
pub(crate) type Locator = fn(&str, usize) -> Option<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Block,
    Inline,
}

/// A tokenizer plus the state it may run in.
#[derive(Clone, Copy)]
pub(crate) struct Rule {
    pub name: &'static str,
    pub run: Tokenizer,
    pub locate: Option<Locator>,
    pub only_at_start: bool,
    pub not_in_list: bool,
    pub not_in_block: bool,
    pub not_in_link: bool,
}

impl Rule {
    pub const fn new(name: &'static str, run: Tokenizer) -> Self {
        Self {
            name,
            run,
            locate: None,
            only_at_start: false,
            not_in_list: false,
            not_in_block: false,
            not_in_link: false,
        }
    }

    pub const fn locator(mut self, locate: Locator) -> Self {
        self.locate = Some(locate);
        self
    }

    pub const fn only_at_start(mut self) -> Self {
        self.only_at_start = true;
        self
    }

    pub const fn not_in_list(mut self) -> Self {
        self.not_in_list = true;
        self
    }

    pub const fn not_in_block(mut self) -> Self {
        self.not_in_block = true;
        self
    }

    pub const fn not_in_link(mut self) -> Self {
        self.not_in_link = true;
        self
    }

    fn allowed(&self, p: &Parser) -> bool {
        (!self.only_at_start || p.at_start)
            && (!self.not_in_list || !p.in_list)
            && (!self.not_in_block || !p.in_block)
            && (!self.not_in_link || !p.in_link)
    }
}

/// Run the rules of `mode` over `value`, which starts at `start`.
pub(crate) fn tokenize(p: &mut Parser, mode: Mode, value: &str, start: Point) -> Vec<Node> {
    let mut eat = Eat::new(p, value, start);
    if value.is_empty() {
        return eat.tokens;
    }

    'outer: while !eat.rest().is_empty() {
        let remaining = eat.rest().len();
        let mut matched = false;

        for index in 0..p.rules(mode).len() {
            let rule = p.rules(mode)[index];
            if !rule.allowed(p) {
                continue;
            }

            let rest = eat.rest();
            if (rule.run)(p, &mut eat, rest, false).is_err() {
                break 'outer;
            }

            if eat.rest().len() != remaining {
                trace!(
                    tokenizer = rule.name,
                    line = eat.line,
                    column = eat.column,
                    "matched"
                );
                matched = true;
                break;
            }
        }

        if !matched {
            let at = eat.now(p);
            p.file.fail(ParseError::infinite_loop(at));
            break;
        }
    }

    p.eof = Some(eat.now(p));
    eat.tokens
}

/// What a call to [`Eat::eat`] consumed.
#[derive(Debug, Clone)]
pub(crate) struct Eaten {
    pub start: Point,
    pub end: Point,
    /// Start column of every line after the first.
    pub indent: Vec<usize>,
    len: usize,
}

impl Eaten {
    pub fn position(&self) -> Position {
        Position {
            start: self.start,
            end: self.end,
            indent: self.indent.clone(),
        }
    }
}

/// Cursor over the input of one tokenize call.
pub(crate) struct Eat<'t> {
    text: &'t str,
    index: usize,
    line: usize,
    column: usize,
    tokens: Vec<Node>,
}

impl<'t> Eat<'t> {
    fn new(p: &Parser, text: &'t str, start: Point) -> Self {
        let mut eat = Self {
            text,
            index: 0,
            line: start.line,
            column: start.column,
            tokens: Vec::new(),
        };
        eat.update_position(&p.offset, "");
        eat
    }

    /// The input not consumed yet.
    pub fn rest(&self) -> &'t str {
        &self.text[self.index..]
    }

    /// The current place.
    pub fn now(&self, p: &Parser) -> Point {
        p.file.point(self.line, self.column)
    }

    /// Consume `subvalue`, which must be a prefix of the remaining input.
    pub fn eat(&mut self, p: &mut Parser, subvalue: &str) -> Result<Eaten, ParseError> {
        let start = self.now(p);
        if !self.rest().starts_with(subvalue) {
            return Err(p.file.fail(ParseError::incorrectly_eaten(start)));
        }

        self.index += subvalue.len();
        self.update_position(&p.offset, subvalue);

        let indent = (start.line + 1..=self.line)
            .map(|line| p.offset.get(&line).copied().unwrap_or(0) + 1)
            .collect();

        Ok(Eaten {
            start,
            end: self.now(p),
            indent,
            len: subvalue.len(),
        })
    }

    /// Eat `subvalue` and add `node` to the tokens of this call.
    pub fn push(&mut self, p: &mut Parser, subvalue: &str, node: Node) -> Result<(), ParseError> {
        let eaten = self.eat(p, subvalue)?;
        self.apply(p, &eaten, node);
        Ok(())
    }

    /// Attach the position of `eaten` to `node` and add it to the tokens of
    /// this call.
    pub fn apply(&mut self, p: &mut Parser, eaten: &Eaten, node: Node) {
        add(&mut self.tokens, node, eaten, &p.offset, p.options.commonmark);
        if !self.tokens.is_empty() {
            p.at_start = false;
        }
    }

    /// Attach the position of `eaten` to `node` and add it to `children`.
    pub fn apply_into(&mut self, p: &mut Parser, eaten: &Eaten, node: Node, children: &mut Vec<Node>) {
        add(children, node, eaten, &p.offset, p.options.commonmark);
        if !self.tokens.is_empty() {
            p.at_start = false;
        }
    }

    /// Give back what `eaten` consumed.
    pub fn reset(&mut self, eaten: &Eaten) {
        self.index -= eaten.len;
        self.line = eaten.start.line;
        self.column = eaten.start.column;
    }

    /// The position eating `subvalue` would produce, without consuming it.
    pub fn test(&mut self, p: &mut Parser, subvalue: &str) -> Result<Position, ParseError> {
        let eaten = self.eat(p, subvalue)?;
        self.reset(&eaten);
        Ok(eaten.position())
    }

    fn update_position(&mut self, offset: &BTreeMap<usize, usize>, subvalue: &str) {
        let mut last_newline = None;
        let mut chars = 0;
        for ch in subvalue.chars() {
            if ch == '\n' {
                self.line += 1;
                last_newline = Some(chars);
            }
            chars += 1;
        }

        match last_newline {
            None => self.column += chars,
            Some(last) => self.column = chars - last,
        }

        if let Some(&extra) = offset.get(&self.line) {
            if last_newline.is_some() {
                self.column += extra;
            } else if self.column <= extra {
                self.column = extra + 1;
            }
        }
    }
}

/// The place reached by walking over `prefix` from `from`, honoring the
/// indentation stripped from each line.
pub(crate) fn locate(p: &Parser, from: Point, prefix: &str) -> Point {
    let mut probe = Eat {
        text: "",
        index: 0,
        line: from.line,
        column: from.column,
        tokens: Vec::new(),
    };
    probe.update_position(&p.offset, prefix);
    probe.now(p)
}

fn add(
    children: &mut Vec<Node>,
    mut node: Node,
    eaten: &Eaten,
    offset: &BTreeMap<usize, usize>,
    commonmark: bool,
) {
    let start = node.position().map_or(eaten.start, |position| position.start);
    node.set_position(Some(Position {
        start,
        end: eaten.end,
        indent: eaten.indent.clone(),
    }));

    let Some(prev) = children.last_mut() else {
        children.push(node);
        return;
    };

    let previous = prev.position().cloned();
    match prev.merge(node, commonmark) {
        Some(unmerged) => children.push(unmerged),
        None => {
            if let Some(previous) = previous {
                let mut indent = previous.indent;
                if previous.end.line < eaten.start.line {
                    for line in previous.end.line + 1..eaten.start.line {
                        indent.push(offset.get(&line).copied().unwrap_or(0) + 1);
                    }
                    indent.push(eaten.start.column);
                }
                indent.extend_from_slice(&eaten.indent);
                prev.set_position(Some(Position {
                    start: previous.start,
                    end: eaten.end,
                    indent,
                }));
            }
        }
    }
}

/// Records how much leading indentation was stripped from consecutive
/// lines, starting at one line, so later positions on those lines map back
/// to the source.
pub(crate) struct IndentTracker {
    line: usize,
}

impl IndentTracker {
    pub fn new(line: usize) -> Self {
        Self { line }
    }

    /// Record `amount` stripped characters on the current line and move on
    /// to the next one.
    pub fn strip(&mut self, p: &mut Parser, amount: usize) {
        *p.offset.entry(self.line).or_insert(0) += amount;
        self.line += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    InLink,
    InList,
    InBlock,
}

/// Sets a parser flag for the lifetime of the guard, restoring the previous
/// value when dropped.
pub(crate) struct Scoped<'p> {
    parser: &'p mut Parser,
    flag: Flag,
    previous: bool,
}

impl<'p> Scoped<'p> {
    pub fn enter(parser: &'p mut Parser, flag: Flag) -> Self {
        let slot = flag_slot(parser, flag);
        let previous = *slot;
        *slot = true;
        Self {
            parser,
            flag,
            previous,
        }
    }
}

fn flag_slot(parser: &mut Parser, flag: Flag) -> &mut bool {
    match flag {
        Flag::InLink => &mut parser.in_link,
        Flag::InList => &mut parser.in_list,
        Flag::InBlock => &mut parser.in_block,
    }
}

impl Deref for Scoped<'_> {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser
    }
}

impl DerefMut for Scoped<'_> {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser
    }
}

impl Drop for Scoped<'_> {
    fn drop(&mut self) {
        *flag_slot(self.parser, self.flag) = self.previous;
    }
}
