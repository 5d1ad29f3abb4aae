//! Recognizers for raw HTML at the start of a string.
//!
//! Each returns the byte length of the construct when `value` starts with
//! one. Block HTML only accepts tags naming a known block element.

use crate::options::Options;
use crate::util::{byte, is_whitespace, peek};

/// Elements that can start a block of raw HTML.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hgroup", "hr", "html", "iframe", "legend", "li", "link", "main",
    "menu", "menuitem", "meta", "nav", "noframes", "ol", "optgroup", "option", "p", "param",
    "pre", "section", "source", "title", "summary", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "track", "ul",
];

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Any HTML construct allowed at block level.
pub fn eat_block(value: &str, options: &Options) -> Option<usize> {
    eat_comment(value, options)
        .or_else(|| eat_cdata(value))
        .or_else(|| eat_processing_instruction(value))
        .or_else(|| eat_declaration(value))
        .or_else(|| eat_closing_tag(value, true))
        .or_else(|| eat_opening_tag(value, true))
}

/// Any HTML construct allowed inline.
pub fn eat_inline(value: &str, options: &Options) -> Option<usize> {
    eat_comment(value, options)
        .or_else(|| eat_cdata(value))
        .or_else(|| eat_processing_instruction(value))
        .or_else(|| eat_declaration(value))
        .or_else(|| eat_closing_tag(value, false))
        .or_else(|| eat_opening_tag(value, false))
}

/// `<!-- ... -->`. CommonMark forbids `--` inside and `>` right after the
/// opening.
pub fn eat_comment(value: &str, options: &Options) -> Option<usize> {
    if !value.starts_with(COMMENT_START) {
        return None;
    }

    let mut has_non_dash = false;
    for (index, ch) in value[COMMENT_START.len()..].char_indices() {
        let index = index + COMMENT_START.len();
        if value[index..].starts_with(COMMENT_END) {
            return Some(index + COMMENT_END.len());
        }
        if options.commonmark {
            if ch == '>' && !has_non_dash {
                return None;
            }
            if ch == '-' {
                if byte(value, index + 1) == Some(b'-') {
                    return None;
                }
            } else {
                has_non_dash = true;
            }
        }
    }
    None
}

/// `<![CDATA[ ... ]]>`
pub fn eat_cdata(value: &str) -> Option<usize> {
    let head = value.get(..CDATA_START.len())?;
    if !head.eq_ignore_ascii_case(CDATA_START) {
        return None;
    }
    let end = value[CDATA_START.len()..].find(CDATA_END)?;
    Some(CDATA_START.len() + end + CDATA_END.len())
}

/// `<? ... ?>`
pub fn eat_processing_instruction(value: &str) -> Option<usize> {
    if !value.starts_with("<?") {
        return None;
    }
    let end = value[2..].find("?>")?;
    Some(2 + end + 2)
}

/// `<!DOCTYPE html>` and friends: a name, white space, anything up to `>`.
pub fn eat_declaration(value: &str) -> Option<usize> {
    if !value.starts_with("<!") {
        return None;
    }
    let name = value[2..]
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    let after = 2 + name;
    let separator = peek(value, after)?;
    if name == 0 || !is_whitespace(separator) {
        return None;
    }
    let body = after + separator.len_utf8();
    let end = memchr::memchr(b'>', value[body..].as_bytes())?;
    Some(body + end + 1)
}

fn tag_name(value: &str, start: usize, block: bool) -> Option<usize> {
    if !byte(value, start)?.is_ascii_alphabetic() {
        return None;
    }
    let len = value[start..]
        .bytes()
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    let name = &value[start..start + len];
    if block
        && !BLOCK_ELEMENTS
            .iter()
            .any(|element| element.eq_ignore_ascii_case(name))
    {
        return None;
    }
    Some(start + len)
}

fn skip_whitespace(value: &str, mut index: usize) -> usize {
    while let Some(ch) = peek(value, index) {
        if !is_whitespace(ch) {
            break;
        }
        index += ch.len_utf8();
    }
    index
}

/// `</name >`
pub fn eat_closing_tag(value: &str, block: bool) -> Option<usize> {
    if !value.starts_with("</") {
        return None;
    }
    let index = skip_whitespace(value, tag_name(value, 2, block)?);
    (byte(value, index) == Some(b'>')).then_some(index + 1)
}

fn is_attribute_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b':'
}

fn is_attribute_name(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b':' | b'.' | b'-')
}

/// `<name attr="value" other=x flag />`
pub fn eat_opening_tag(value: &str, block: bool) -> Option<usize> {
    if !value.starts_with('<') {
        return None;
    }
    let mut index = tag_name(value, 1, block)?;

    loop {
        let after_space = skip_whitespace(value, index);
        if after_space == index {
            break;
        }
        index = after_space;

        if !byte(value, index).is_some_and(is_attribute_name_start) {
            break;
        }
        index += 1;
        while byte(value, index).is_some_and(is_attribute_name) {
            index += 1;
        }

        let mut has_equals = false;
        while let Some(ch) = peek(value, index) {
            if !is_whitespace(ch) {
                if !has_equals && ch == '=' {
                    has_equals = true;
                } else {
                    break;
                }
            }
            index += ch.len_utf8();
        }

        if has_equals {
            index = attribute_value(value, index)?;
        }
    }

    if byte(value, index) == Some(b'/') {
        index += 1;
    }
    (byte(value, index) == Some(b'>')).then_some(index + 1)
}

fn attribute_value(value: &str, index: usize) -> Option<usize> {
    match byte(value, index) {
        Some(quote @ (b'"' | b'\'')) => {
            let end = memchr::memchr(quote, value[index + 1..].as_bytes())?;
            Some(index + 1 + end + 1)
        }
        _ => {
            let len = value[index..]
                .bytes()
                .take_while(|b| !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`'))
                .count();
            (len > 0).then_some(index + len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_tags() {
        assert_eq!(eat_opening_tag("<div class=\"a\">x", true), Some(15));
        assert_eq!(eat_opening_tag("<span>", true), None);
        assert_eq!(eat_opening_tag("<span>", false), Some(6));
        assert_eq!(eat_opening_tag("<br/>", false), Some(5));
        assert_eq!(eat_closing_tag("</DIV >", true), Some(7));
    }

    #[test]
    fn recognizes_comments_and_friends() {
        let options = Options::default();
        assert_eq!(eat_comment("<!-- a -->b", &options), Some(10));
        assert_eq!(eat_comment("<!-- a -- b -->", &options.commonmark(true)), None);
        assert_eq!(eat_cdata("<![CDATA[x]]>"), Some(13));
        assert_eq!(eat_processing_instruction("<?php ?>"), Some(8));
        assert_eq!(eat_declaration("<!DOCTYPE html>"), Some(15));
    }
}
