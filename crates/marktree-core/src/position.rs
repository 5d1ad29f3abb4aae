//! Source location tracking for syntax tree nodes.
//!
//! Every node produced by the parser can carry a [`Position`] describing the
//! exact range of the (normalized) source it was built from. Lines and columns
//! are 1-based, offsets are 0-based, and all three count Unicode scalar
//! values rather than bytes.

use serde::{Deserialize, Serialize};

/// A single place in the source text.
///
/// # Example
///
/// ```rust
/// use marktree_core::position::Point;
///
/// let start = Point::new(1, 1, 0);
/// assert_eq!(start.shifted("abc"), Point::new(1, 4, 3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based).
    pub column: usize,
    /// Character offset from the start of the source (0-based).
    pub offset: usize,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The very first place in a document.
    #[inline]
    pub const fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Move this point forward along the same line by the number of
    /// characters in `text`.
    ///
    /// `text` must not contain line endings; this is used to skip over a
    /// marker (bullet, hashes, brackets) whose content starts later on the
    /// same line.
    #[inline]
    pub fn shifted(self, text: &str) -> Self {
        self.advanced_by(text.chars().count())
    }

    /// Move this point forward along the same line by `count` characters.
    #[inline]
    pub const fn advanced_by(self, count: usize) -> Self {
        Self {
            line: self.line,
            column: self.column + count,
            offset: self.offset + count,
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::start()
    }
}

/// The source range of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// First character of the node (inclusive).
    pub start: Point,
    /// Place directly after the node (exclusive).
    pub end: Point,
    /// Start column of every line after the first one spanned by the node,
    /// after indentation that was stripped by enclosing constructs
    /// (blockquote markers, list bullets, footnote indentation).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indent: Vec<usize>,
}

impl Position {
    /// Create a position without per-line indentation.
    #[inline]
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            indent: Vec::new(),
        }
    }

    /// Number of characters covered by this position.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Check if this position covers no characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Check if this position contains a character offset.
    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start.offset && offset < self.end.offset
    }
}
