//! String helpers shared by the tokenizers.
//!
//! All indices are byte indices; the characters these helpers inspect
//! (spaces, tabs, newlines, markers) are ASCII, so every index they produce
//! lies on a character boundary.

use std::collections::BTreeMap;

/// Width of a tab stop.
pub const TAB_SIZE: usize = 4;

/// Character at byte index `index`, if any.
#[inline]
pub fn peek(value: &str, index: usize) -> Option<char> {
    value.get(index..).and_then(|rest| rest.chars().next())
}

/// Byte at index `index`, if any.
#[inline]
pub fn byte(value: &str, index: usize) -> Option<u8> {
    value.as_bytes().get(index).copied()
}

#[inline]
pub fn is_whitespace(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{feff}'
}

/// A "word" character: ASCII letter, digit or underscore.
#[inline]
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Number of leading spaces and tabs.
#[inline]
pub fn leading_blanks(value: &str) -> usize {
    value
        .bytes()
        .take_while(|byte| matches!(byte, b' ' | b'\t'))
        .count()
}

/// Empty, or white space only.
#[inline]
pub fn is_blank(value: &str) -> bool {
    value.chars().all(is_whitespace)
}

/// Byte index of the next line feed at or after `from`, or the length of
/// `value`.
#[inline]
pub fn line_end(value: &str, from: usize) -> usize {
    memchr::memchr(b'\n', &value.as_bytes()[from..]).map_or(value.len(), |found| from + found)
}

/// Remove trailing line feeds only.
pub fn trim_trailing_lines(value: &str) -> &str {
    value.trim_end_matches('\n')
}

/// Replace every run of white space with a single space.
pub fn collapse_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_space = false;
    for ch in value.chars() {
        if is_whitespace(ch) {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Normalize a reference label: collapse white space, lowercase.
///
/// ```rust
/// assert_eq!(marktree_core::util::normalize_identifier("FOO\t bar"), "foo bar");
/// ```
pub fn normalize_identifier(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

/// Leading indentation of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indent {
    /// Visual width, with tabs advancing to the next multiple of four.
    pub width: usize,
    /// For every width reached, the index of the character that reached it.
    pub stops: BTreeMap<usize, usize>,
}

/// Measure the leading spaces and tabs of `value`.
///
/// ```rust
/// use marktree_core::util::get_indent;
///
/// assert_eq!(get_indent("  foo").width, 2);
/// assert_eq!(get_indent("\tfoo").width, 4);
/// assert_eq!(get_indent("  \tfoo").width, 4);
/// assert_eq!(get_indent("\t  foo").width, 6);
/// ```
pub fn get_indent(value: &str) -> Indent {
    let mut indent = Indent::default();
    for (index, byte) in value.bytes().enumerate() {
        match byte {
            b' ' => indent.width += 1,
            b'\t' => indent.width = (indent.width + TAB_SIZE) / TAB_SIZE * TAB_SIZE,
            _ => break,
        }
        indent.stops.insert(indent.width, index);
    }
    indent
}

/// Remove the common indentation of every non-blank line, up to `maximum`.
///
/// Lines whose indentation does not land exactly on the removed width are
/// padded with a tab so that they keep their relative indentation. When a
/// non-blank line has no indentation at all, nothing is removed.
pub fn remove_indentation(value: &str, maximum: usize) -> String {
    let lines: Vec<&str> = value.split('\n').collect();
    let indents: Vec<Indent> = lines.iter().map(|line| get_indent(line)).collect();

    let mut minimum = maximum;
    for (line, indent) in lines.iter().zip(&indents) {
        if line.trim().is_empty() {
            continue;
        }
        if indent.width == 0 {
            return value.to_string();
        }
        minimum = minimum.min(indent.width);
    }

    if minimum == 0 {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    for (number, (line, indent)) in lines.iter().zip(&indents).enumerate() {
        if number > 0 {
            out.push('\n');
        }
        let mut stop = minimum;
        while stop > 0 && !indent.stops.contains_key(&stop) {
            stop -= 1;
        }
        if !line.trim().is_empty() && stop != minimum {
            out.push('\t');
        }
        match indent.stops.get(&stop) {
            Some(&index) => out.push_str(&line[index + 1..]),
            None => out.push_str(line),
        }
    }
    out
}

/// Remove backslashes before characters in `escapes`.
///
/// ```rust
/// use marktree_core::util::descape;
///
/// assert_eq!(descape(r"\* \a", &['*']), r"* \a");
/// ```
pub fn descape(value: &str, escapes: &[char]) -> String {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    let mut prev = 0;
    let mut search = 0;
    while let Some(found) = memchr::memchr(b'\\', &bytes[search..]) {
        let index = search + found;
        out.push_str(&value[prev..index]);
        prev = index + 1;
        search = match peek(value, prev) {
            Some(ch) if escapes.contains(&ch) => prev + ch.len_utf8(),
            _ => {
                out.push('\\');
                prev
            }
        };
    }
    out.push_str(&value[prev..]);
    out
}
