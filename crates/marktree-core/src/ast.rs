//! Syntax tree types produced by the parser.
//!
//! The tree follows the mdast shape: a single [`Node`] enum tagged by its
//! `type`, where parents hold `children` and literals hold a `value`. It is
//! designed to be:
//!
//! - **Position-tracked**: every node may carry a [`Position`]
//! - **Serializable**: `serde_json::to_string(&root)` yields mdast JSON
//! - **Owned**: nodes own their strings, since most values are derived from
//!   de-indented or decoded source rather than borrowed verbatim

use serde::{Deserialize, Serialize};

use crate::position::Position;

/// A node in the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// Document root; children are the top-level blocks.
    Root(Parent),
    /// Run of inline content separated from other blocks by blank lines.
    Paragraph(Parent),
    /// ATX (`# foo`) or setext (`foo\n===`) heading.
    Heading(Heading),
    /// Horizontal rule (`***`, `---`, `___`).
    ThematicBreak(Void),
    /// Block quotation (`> foo`).
    Blockquote(Parent),
    /// Ordered or unordered list.
    List(List),
    /// A single item of a list.
    ListItem(ListItem),
    /// Indented or fenced code block.
    Code(Code),
    /// Raw HTML, block or inline.
    Html(Literal),
    /// YAML front matter.
    Yaml(Literal),
    /// GFM table; children are rows.
    Table(Table),
    /// Row of a table; children are cells.
    TableRow(Parent),
    /// Cell of a table row; children are inline content.
    TableCell(Parent),
    /// Link reference definition (`[id]: url "title"`).
    Definition(Definition),
    /// Footnote definition (`[^id]: text`).
    FootnoteDefinition(FootnoteDefinition),
    /// Inline link (`[text](url)`) or autolink.
    Link(Link),
    /// Inline image (`![alt](url)`).
    Image(Image),
    /// Inline footnote (`[^some text]`).
    Footnote(Parent),
    /// Reference to a definition (`[text][id]`).
    LinkReference(LinkReference),
    /// Image reference to a definition (`![alt][id]`).
    ImageReference(ImageReference),
    /// Reference to a footnote definition (`[^id]`).
    FootnoteReference(FootnoteReference),
    /// Strong importance (`**foo**`).
    Strong(Parent),
    /// Stress emphasis (`*foo*`).
    Emphasis(Parent),
    /// Deleted content (`~~foo~~`).
    Delete(Parent),
    /// Inline code span.
    InlineCode(Literal),
    /// Hard line break.
    Break(Void),
    /// Plain text.
    Text(Literal),
}

/// A node with only children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// A node with a string value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// A node without content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Void {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading rank, 1 through 6.
    pub depth: u8,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,
    /// Number of the first item of an ordered list.
    pub start: Option<u64>,
    /// Whether any item is separated from its siblings by a blank line.
    pub loose: bool,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub loose: bool,
    /// Task state: `Some(true)` for `[x]`, `Some(false)` for `[ ]`.
    pub checked: Option<bool>,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    /// Info string of a fenced block.
    pub lang: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Column alignment of a table. `None` serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    None,
}

impl Serialize for Align {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Align::Left => serializer.serialize_str("left"),
            Align::Center => serializer.serialize_str("center"),
            Align::Right => serializer.serialize_str("right"),
            Align::None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Align {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None => Ok(Align::None),
            Some("left") => Ok(Align::Left),
            Some("center") => Ok(Align::Center),
            Some("right") => Ok(Align::Right),
            Some(other) => Err(serde::de::Error::unknown_variant(
                other,
                &["left", "center", "right"],
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub align: Vec<Align>,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Normalized label: white space collapsed, lowercased.
    pub identifier: String,
    pub url: String,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteDefinition {
    pub identifier: String,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: Option<String>,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub title: Option<String>,
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Syntactic form of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    /// `[foo]`
    Shortcut,
    /// `[foo][]`
    Collapsed,
    /// `[foo][bar]`
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReference {
    pub identifier: String,
    pub reference_type: ReferenceType,
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub identifier: String,
    pub reference_type: ReferenceType,
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteReference {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    /// The mdast `type` of this node.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "root",
            Node::Paragraph(_) => "paragraph",
            Node::Heading(_) => "heading",
            Node::ThematicBreak(_) => "thematicBreak",
            Node::Blockquote(_) => "blockquote",
            Node::List(_) => "list",
            Node::ListItem(_) => "listItem",
            Node::Code(_) => "code",
            Node::Html(_) => "html",
            Node::Yaml(_) => "yaml",
            Node::Table(_) => "table",
            Node::TableRow(_) => "tableRow",
            Node::TableCell(_) => "tableCell",
            Node::Definition(_) => "definition",
            Node::FootnoteDefinition(_) => "footnoteDefinition",
            Node::Link(_) => "link",
            Node::Image(_) => "image",
            Node::Footnote(_) => "footnote",
            Node::LinkReference(_) => "linkReference",
            Node::ImageReference(_) => "imageReference",
            Node::FootnoteReference(_) => "footnoteReference",
            Node::Strong(_) => "strong",
            Node::Emphasis(_) => "emphasis",
            Node::Delete(_) => "delete",
            Node::InlineCode(_) => "inlineCode",
            Node::Break(_) => "break",
            Node::Text(_) => "text",
        }
    }

    /// Children of a parent node, `None` for literals and voids.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root(n)
            | Node::Paragraph(n)
            | Node::Blockquote(n)
            | Node::TableRow(n)
            | Node::TableCell(n)
            | Node::Footnote(n)
            | Node::Strong(n)
            | Node::Emphasis(n)
            | Node::Delete(n) => Some(&n.children),
            Node::Heading(n) => Some(&n.children),
            Node::List(n) => Some(&n.children),
            Node::ListItem(n) => Some(&n.children),
            Node::Table(n) => Some(&n.children),
            Node::FootnoteDefinition(n) => Some(&n.children),
            Node::Link(n) => Some(&n.children),
            Node::LinkReference(n) => Some(&n.children),
            _ => None,
        }
    }

    /// Mutable children of a parent node.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root(n)
            | Node::Paragraph(n)
            | Node::Blockquote(n)
            | Node::TableRow(n)
            | Node::TableCell(n)
            | Node::Footnote(n)
            | Node::Strong(n)
            | Node::Emphasis(n)
            | Node::Delete(n) => Some(&mut n.children),
            Node::Heading(n) => Some(&mut n.children),
            Node::List(n) => Some(&mut n.children),
            Node::ListItem(n) => Some(&mut n.children),
            Node::Table(n) => Some(&mut n.children),
            Node::FootnoteDefinition(n) => Some(&mut n.children),
            Node::Link(n) => Some(&mut n.children),
            Node::LinkReference(n) => Some(&mut n.children),
            _ => None,
        }
    }

    /// The value of a literal node (`text`, `inlineCode`, `code`, `html`,
    /// `yaml`).
    pub fn value(&self) -> Option<&str> {
        match self {
            Node::Text(n) | Node::InlineCode(n) | Node::Html(n) | Node::Yaml(n) => Some(&n.value),
            Node::Code(n) => Some(&n.value),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position_slot().as_ref()
    }

    pub fn set_position(&mut self, position: Option<Position>) {
        *self.position_slot_mut() = position;
    }

    fn position_slot(&self) -> &Option<Position> {
        match self {
            Node::Root(n)
            | Node::Paragraph(n)
            | Node::Blockquote(n)
            | Node::TableRow(n)
            | Node::TableCell(n)
            | Node::Footnote(n)
            | Node::Strong(n)
            | Node::Emphasis(n)
            | Node::Delete(n) => &n.position,
            Node::Text(n) | Node::InlineCode(n) | Node::Html(n) | Node::Yaml(n) => &n.position,
            Node::ThematicBreak(n) | Node::Break(n) => &n.position,
            Node::Heading(n) => &n.position,
            Node::List(n) => &n.position,
            Node::ListItem(n) => &n.position,
            Node::Code(n) => &n.position,
            Node::Table(n) => &n.position,
            Node::Definition(n) => &n.position,
            Node::FootnoteDefinition(n) => &n.position,
            Node::Link(n) => &n.position,
            Node::Image(n) => &n.position,
            Node::LinkReference(n) => &n.position,
            Node::ImageReference(n) => &n.position,
            Node::FootnoteReference(n) => &n.position,
        }
    }

    fn position_slot_mut(&mut self) -> &mut Option<Position> {
        match self {
            Node::Root(n)
            | Node::Paragraph(n)
            | Node::Blockquote(n)
            | Node::TableRow(n)
            | Node::TableCell(n)
            | Node::Footnote(n)
            | Node::Strong(n)
            | Node::Emphasis(n)
            | Node::Delete(n) => &mut n.position,
            Node::Text(n) | Node::InlineCode(n) | Node::Html(n) | Node::Yaml(n) => {
                &mut n.position
            }
            Node::ThematicBreak(n) | Node::Break(n) => &mut n.position,
            Node::Heading(n) => &mut n.position,
            Node::List(n) => &mut n.position,
            Node::ListItem(n) => &mut n.position,
            Node::Code(n) => &mut n.position,
            Node::Table(n) => &mut n.position,
            Node::Definition(n) => &mut n.position,
            Node::FootnoteDefinition(n) => &mut n.position,
            Node::Link(n) => &mut n.position,
            Node::Image(n) => &mut n.position,
            Node::LinkReference(n) => &mut n.position,
            Node::ImageReference(n) => &mut n.position,
            Node::FootnoteReference(n) => &mut n.position,
        }
    }

    /// Remove position information from this node and all descendants.
    pub fn strip_positions(&mut self) {
        self.set_position(None);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.strip_positions();
            }
        }
    }

    /// Concatenated value of every `text` and `inlineCode` descendant.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.walk(&mut |node| {
            if let Node::Text(lit) | Node::InlineCode(lit) = node {
                out.push_str(&lit.value);
            }
        });
        out
    }

    /// Visit this node and its descendants depth-first, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        if let Some(children) = self.children() {
            for child in children {
                child.walk(visit);
            }
        }
    }

    pub(crate) fn text(value: impl Into<String>) -> Node {
        Node::Text(Literal {
            value: value.into(),
            position: None,
        })
    }

    /// Try to fold `next`, the following sibling, into `self`.
    ///
    /// Returns `next` back when the two cannot be merged. Text nodes
    /// concatenate their values; blockquotes concatenate their children
    /// unless `commonmark` is set. Positions are patched by the caller.
    pub(crate) fn merge(&mut self, next: Node, commonmark: bool) -> Option<Node> {
        match (self, next) {
            (Node::Text(prev), Node::Text(next)) => {
                prev.value.push_str(&next.value);
                None
            }
            (Node::Blockquote(prev), Node::Blockquote(next)) if !commonmark => {
                prev.children.extend(next.children);
                None
            }
            (_, next) => Some(next),
        }
    }
}
