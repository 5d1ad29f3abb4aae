use std::fmt;

use thiserror::Error;

use crate::position::Point;

/// Error kinds for categorizing parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A full pass over every tokenizer consumed nothing.
    InfiniteLoop,
    /// A tokenizer tried to eat text that is not a prefix of the input.
    IncorrectlyEaten,
    /// An inline tokenizer was registered without a locator.
    MissingLocator,
    /// Malformed character reference.
    Entity,
    /// Generic diagnostic
    Other,
}

/// A diagnostic with location and severity.
///
/// Warnings never stop parsing. Fatal errors abort the tokenize loop that
/// raised them and make [`Parser::parse`](crate::Parser::parse) fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable message
    pub message: String,
    /// Source location the diagnostic refers to
    pub position: Option<Point>,
    /// Diagnostic categorization
    pub kind: ParseErrorKind,
    /// Whether this diagnostic aborted parsing
    pub fatal: bool,
}

impl ParseError {
    /// Create a new non-fatal diagnostic.
    pub fn new(message: impl Into<String>, position: Option<Point>) -> Self {
        Self {
            message: message.into(),
            position,
            kind: ParseErrorKind::Other,
            fatal: false,
        }
    }

    /// The engine made no progress on the remaining input.
    pub fn infinite_loop(position: Point) -> Self {
        Self {
            message: "Infinite loop".to_string(),
            position: Some(position),
            kind: ParseErrorKind::InfiniteLoop,
            fatal: true,
        }
    }

    /// A tokenizer ate a value that does not start the remaining input.
    pub fn incorrectly_eaten(position: Point) -> Self {
        Self {
            message: "Incorrectly eaten value".to_string(),
            position: Some(position),
            kind: ParseErrorKind::IncorrectlyEaten,
            fatal: true,
        }
    }

    /// An inline rule cannot bound plain text because it has no locator.
    pub fn missing_locator(name: &str, position: Point) -> Self {
        Self {
            message: format!("Missing locator: `{name}`"),
            position: Some(position),
            kind: ParseErrorKind::MissingLocator,
            fatal: true,
        }
    }

    /// Set the error kind.
    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark this diagnostic as fatal.
    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(point) = self.position {
            write!(f, "{}:{}: ", point.line, point.column)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Diagnostics collected during one parse, in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    messages: Vec<ParseError>,
}

impl Messages {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Add a diagnostic.
    pub fn push(&mut self, message: ParseError) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.messages.iter()
    }

    /// Only the non-fatal diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &ParseError> {
        self.messages.iter().filter(|m| !m.fatal)
    }

    /// Check if any diagnostic aborted parsing.
    pub fn has_fatal(&self) -> bool {
        self.messages.iter().any(|m| m.fatal)
    }

    /// The first fatal diagnostic, if any.
    pub fn first_fatal(&self) -> Option<&ParseError> {
        self.messages.iter().find(|m| m.fatal)
    }
}

impl IntoIterator for Messages {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

/// Invalid parser configuration, raised before any parsing starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value `{0}` for setting `options`")]
    InvalidOptions(String),
    #[error("Invalid value `{value}` for setting `options.{key}`")]
    InvalidSetting { key: String, value: String },
    #[error("Unknown setting `options.{0}`")]
    UnknownSetting(String),
}
