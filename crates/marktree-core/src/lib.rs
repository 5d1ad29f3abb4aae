//! # marktree core
//!
//! Compiles markdown into an mdast-shaped syntax tree with exact source
//! positions.
//!
//! Parsing never fails on malformed markdown: anything that is not a
//! recognized construct ends up as a paragraph or text. Positions are
//! tracked through nested constructs (blockquotes, list items, footnotes)
//! so that every node maps back to the characters it was built from.
//!
//! ## Quick Start
//!
//! ```rust
//! use marktree_core::{Node, Options, Parser};
//!
//! let mut parser = Parser::new(Options::default());
//! let root = parser.parse("# Hello *World*\n").unwrap();
//!
//! let heading = &root.children().unwrap()[0];
//! assert_eq!(heading.kind(), "heading");
//! assert_eq!(heading.text_content(), "Hello World");
//! ```
//!
//! ## Error Recovery
//!
//! Diagnostics (malformed character references, internal tokenizer
//! failures) are collected instead of aborting:
//!
//! ```rust
//! use marktree_core::Parser;
//!
//! let mut parser = Parser::default();
//! let result = parser.parse_with_recovery("AT&T &#; co");
//!
//! assert!(!result.has_fatal_errors());
//! assert_eq!(result.messages.len(), 1);
//! ```
//!
//! ## Dialects
//!
//! - `gfm` (default on): fenced code, tables, deletion, bare URLs, task
//!   items
//! - `commonmark`: CommonMark behavior where it differs
//! - `pedantic`: `markdown.pl` quirks
//! - `footnotes`, `yaml`, `breaks`: optional constructs

pub mod ast;
pub mod entities;
pub mod error;
pub mod html;
pub mod options;
pub mod parser;
pub mod position;
pub mod source;
pub mod util;

mod block;
mod inline;
mod render;
mod tokenizer;

pub use ast::{Align, Node, ReferenceType};
pub use error::{ConfigError, Messages, ParseError, ParseErrorKind};
pub use options::Options;
pub use parser::{ParseResult, Parser};
pub use position::{Point, Position};

/// Parse `source` with the default options.
///
/// ```rust
/// let root = marktree_core::parse("- a\n- b\n").unwrap();
/// assert_eq!(root.children().unwrap()[0].kind(), "list");
/// ```
pub fn parse(source: &str) -> Result<Node, ParseError> {
    Parser::default().parse(source)
}
