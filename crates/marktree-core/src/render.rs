//! Node factories.
//!
//! Tokenizers extract the content of a construct; these build the node,
//! tokenizing nested content where the node has children.

use crate::ast::{Code, FootnoteDefinition, Heading, Image, Link, ListItem, Literal, Node, Parent, Void};
use crate::parser::Parser;
use crate::position::Point;
use crate::tokenizer::{Flag, IndentTracker, Scoped};
use crate::util::{get_indent, remove_indentation, trim_trailing_lines};

pub(crate) fn parent(kind: fn(Parent) -> Node, children: Vec<Node>) -> Node {
    kind(Parent {
        children,
        position: None,
    })
}

pub(crate) fn literal(kind: fn(Literal) -> Node, value: impl Into<String>) -> Node {
    kind(Literal {
        value: value.into(),
        position: None,
    })
}

pub(crate) fn void(kind: fn(Void) -> Node) -> Node {
    kind(Void { position: None })
}

pub(crate) fn code(value: &str, lang: Option<String>) -> Node {
    Node::Code(Code {
        lang: lang.filter(|lang| !lang.is_empty()),
        value: trim_trailing_lines(value).to_string(),
        position: None,
    })
}

pub(crate) fn heading(p: &mut Parser, content: &str, depth: u8, now: Point) -> Node {
    Node::Heading(Heading {
        depth,
        children: p.tokenize_inline(content, now),
        position: None,
    })
}

pub(crate) fn inline(p: &mut Parser, kind: fn(Parent) -> Node, content: &str, now: Point) -> Node {
    let children = p.tokenize_inline(content, now);
    parent(kind, children)
}

pub(crate) fn blockquote(p: &mut Parser, content: &str, now: Point) -> Node {
    let mut p = Scoped::enter(p, Flag::InBlock);
    let children = p.tokenize_block(content, now);
    parent(Node::Blockquote, children)
}

pub(crate) fn footnote_definition(p: &mut Parser, identifier: String, content: &str, now: Point) -> Node {
    let mut p = Scoped::enter(p, Flag::InBlock);
    Node::FootnoteDefinition(FootnoteDefinition {
        identifier,
        children: p.tokenize_block(content, now),
        position: None,
    })
}

/// Inline link, or image when `is_link` is false.
pub(crate) fn link(
    p: &mut Parser,
    is_link: bool,
    url: String,
    content: &str,
    title: Option<String>,
    now: Point,
) -> Node {
    let mut p = Scoped::enter(p, Flag::InLink);
    let title = title.filter(|title| !title.is_empty());
    if is_link {
        Node::Link(Link {
            url,
            title,
            children: p.tokenize_inline(content, now),
            position: None,
        })
    } else {
        let alt = if content.is_empty() {
            None
        } else {
            let descaped = p.descape(content);
            Some(p.decode_raw(&descaped, now)).filter(|alt| !alt.is_empty())
        };
        Node::Image(Image {
            url,
            title,
            alt,
            position: None,
        })
    }
}

/// Bullet, indentation after it, and the rest of the first line.
struct Bullet<'a> {
    leading: &'a str,
    marker: &'a str,
    spacing: &'a str,
    rest: &'a str,
}

/// `^([ \t]*)([*+-]|\d+[.)])( {1,4}(?! )| |\t|$|(?=\n))([^\n]*)`
fn bullet(value: &str) -> Option<Bullet<'_>> {
    let bytes = value.as_bytes();
    let leading = bytes.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
    let mut index = leading;

    match bytes.get(index) {
        Some(b'*' | b'+' | b'-') => index += 1,
        Some(b) if b.is_ascii_digit() => {
            while bytes.get(index).is_some_and(u8::is_ascii_digit) {
                index += 1;
            }
            if !matches!(bytes.get(index), Some(b'.' | b')')) {
                return None;
            }
            index += 1;
        }
        _ => return None,
    }
    let marker_end = index;

    let spaces = bytes[index..].iter().take_while(|&&b| b == b' ').count();
    let spacing = match bytes.get(index) {
        Some(b' ') if (1..=4).contains(&spaces) => spaces,
        Some(b' ') => 1,
        Some(b'\t') => 1,
        None | Some(b'\n') => 0,
        _ => return None,
    };
    index += spacing;

    let line_end = memchr::memchr(b'\n', &bytes[index..]).map_or(value.len(), |end| index + end);
    Some(Bullet {
        leading: &value[..leading],
        marker: &value[leading..marker_end],
        spacing: &value[marker_end..index],
        rest: &value[index..line_end],
    })
}

fn normal_list_item(p: &mut Parser, value: &str, now: Point) -> String {
    let mut indent = IndentTracker::new(now.line);
    let Some(found) = bullet(value) else {
        return value.to_string();
    };

    let prefix_len = found.leading.len() + found.marker.len() + found.spacing.len();
    let bullet_len = prefix_len;

    // Items numbered `1.` to `9.` with an odd-width bullet are padded by one
    // so their content lines up with a tab stop.
    let mut marker_width = found.marker.len();
    let small = found
        .marker
        .strip_suffix('.')
        .and_then(|digits| digits.parse::<u64>().ok())
        .is_some_and(|number| number < 10);
    if small && bullet_len % 2 == 1 {
        marker_width += 1;
    }
    let max = format!("{}{}{}", found.leading, " ".repeat(marker_width), found.spacing);
    let rest = found.rest.to_string();

    let replaced = format!("{max}{}", &value[prefix_len..]);
    let lines: Vec<&str> = replaced.split('\n').collect();
    let trimmed = remove_indentation(&replaced, get_indent(&max).width);
    let mut trimmed_lines: Vec<&str> = trimmed.split('\n').collect();
    trimmed_lines[0] = &rest;

    indent.strip(p, bullet_len);
    for (line, stripped) in lines.iter().zip(&trimmed_lines).skip(1) {
        indent.strip(p, line.len().saturating_sub(stripped.len()));
    }

    trimmed_lines.join("\n")
}

fn pedantic_list_item(p: &mut Parser, value: &str, now: Point) -> String {
    let mut indent = IndentTracker::new(now.line);

    let bytes = value.as_bytes();
    let mut index = bytes.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
    match bytes.get(index) {
        Some(b'*' | b'+' | b'-') => index += 1,
        Some(b) if b.is_ascii_digit() => {
            while bytes.get(index).is_some_and(u8::is_ascii_digit) {
                index += 1;
            }
            if matches!(bytes.get(index), Some(b'.' | b')')) {
                index += 1;
            } else {
                index = 0;
            }
        }
        _ => index = 0,
    }
    if index > 0 {
        let spacing = bytes[index..].iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        if spacing == 0 {
            index = 0;
        } else {
            index += spacing;
        }
    }
    if index > 0 {
        indent.strip(p, index);
    }
    let value = &value[index..];

    let mut indent = IndentTracker::new(now.line);
    let mut out = Vec::new();
    for line in value.split('\n') {
        let stripped = if line.starts_with('\t') {
            1
        } else {
            line.bytes().take(4).take_while(|&b| b == b' ').count()
        };
        indent.strip(p, stripped);
        out.push(&line[stripped..]);
    }
    out.join("\n")
}

fn task(value: &str) -> Option<bool> {
    let bytes = value.as_bytes();
    if bytes.len() < 4 || bytes[0] != b'[' || bytes[2] != b']' || !matches!(bytes[3], b' ' | b'\t') {
        return None;
    }
    match bytes[1] {
        b' ' | b'\t' => Some(false),
        b'x' | b'X' => Some(true),
        _ => None,
    }
}

/// A blank line followed by more content, or a trailing line feed.
fn loose_item(value: &str) -> bool {
    let mut search = 0;
    while let Some(found) = value[search..].find("\n\n") {
        let after = search + found + 2;
        if !value[after..].trim().is_empty() {
            return true;
        }
        search = search + found + 1;
    }
    value.ends_with('\n')
}

pub(crate) fn list_item(p: &mut Parser, value: &str, now: Point) -> Node {
    let mut content = if p.options.pedantic {
        pedantic_list_item(p, value, now)
    } else {
        normal_list_item(p, value, now)
    };

    let mut checked = None;
    if p.options.gfm {
        if let Some(state) = task(&content) {
            checked = Some(state);
            IndentTracker::new(now.line).strip(p, 4);
            content = content[4..].to_string();
        }
    }

    let loose = loose_item(&content);
    Node::ListItem(ListItem {
        loose,
        checked,
        children: p.tokenize_block(&content, now),
        position: None,
    })
}
