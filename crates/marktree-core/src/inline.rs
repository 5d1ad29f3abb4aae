//! Inline tokenizers and their locators.
//!
//! Every rule except `text` has a locator giving the earliest byte index at
//! which it could match. The text tokenizer eats up to the nearest of those,
//! so plain prose is consumed in long runs instead of one character at a
//! time.

use memchr::memmem;

use crate::ast::{FootnoteReference, ImageReference, LinkReference, Node, ReferenceType};
use crate::entities;
use crate::error::ParseError;
use crate::html;
use crate::options::Options;
use crate::parser::Parser;
use crate::render;
use crate::tokenizer::{locate, Eat, Flag, Mode, Rule, Scoped};
use crate::util::{byte, is_blank, is_whitespace, is_word_char, normalize_identifier, peek};

type Outcome = Result<bool, ParseError>;

const MAILTO: &str = "mailto:";
const PROTOCOLS: [&str; 3] = ["http://", "https://", MAILTO];
const MIN_BREAK_LENGTH: usize = 2;

/// Inline rules in priority order. Rules for disabled extensions are left
/// out.
pub(crate) fn rules(options: &Options) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(12);
    rules.push(Rule::new("escape", escape).locator(locate_escape));
    rules.push(
        Rule::new("autoLink", auto_link)
            .locator(locate_tag)
            .not_in_link(),
    );
    if options.gfm {
        rules.push(Rule::new("url", url).locator(locate_url).not_in_link());
    }
    rules.push(Rule::new("html", inline_html).locator(locate_tag));
    rules.push(Rule::new("link", link).locator(locate_link));
    rules.push(Rule::new("reference", reference).locator(locate_link));
    rules.push(Rule::new("strong", strong).locator(locate_strong));
    rules.push(Rule::new("emphasis", emphasis).locator(locate_emphasis));
    if options.gfm {
        rules.push(Rule::new("deletion", deletion).locator(locate_deletion));
    }
    rules.push(Rule::new("code", inline_code).locator(locate_code));
    rules.push(Rule::new("break", hard_break).locator(locate_break));
    rules.push(Rule::new("text", text));
    rules
}

fn find_byte(value: &str, needle: u8, from: usize) -> Option<usize> {
    let rest = value.as_bytes().get(from..)?;
    memchr::memchr(needle, rest).map(|found| from + found)
}

fn find_bytes(value: &str, needle: &[u8], from: usize) -> Option<usize> {
    let rest = value.as_bytes().get(from..)?;
    memmem::find(rest, needle).map(|found| from + found)
}

fn earliest(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn locate_escape(value: &str, from: usize) -> Option<usize> {
    find_byte(value, b'\\', from)
}

fn locate_tag(value: &str, from: usize) -> Option<usize> {
    find_byte(value, b'<', from)
}

fn locate_url(value: &str, from: usize) -> Option<usize> {
    PROTOCOLS
        .iter()
        .map(|protocol| find_bytes(value, protocol.as_bytes(), from))
        .fold(None, earliest)
}

/// `[`, or the `!` before it for images.
fn locate_link(value: &str, from: usize) -> Option<usize> {
    let bracket = find_byte(value, b'[', from)?;
    if bracket > from && value.as_bytes()[bracket - 1] == b'!' {
        Some(bracket - 1)
    } else {
        Some(bracket)
    }
}

fn locate_strong(value: &str, from: usize) -> Option<usize> {
    earliest(find_bytes(value, b"**", from), find_bytes(value, b"__", from))
}

fn locate_emphasis(value: &str, from: usize) -> Option<usize> {
    earliest(find_byte(value, b'*', from), find_byte(value, b'_', from))
}

fn locate_deletion(value: &str, from: usize) -> Option<usize> {
    find_bytes(value, b"~~", from)
}

fn locate_code(value: &str, from: usize) -> Option<usize> {
    find_byte(value, b'`', from)
}

/// The spaces before a line feed belong to the break.
fn locate_break(value: &str, from: usize) -> Option<usize> {
    let bytes = value.as_bytes();
    let mut index = find_byte(value, b'\n', from)?;
    while index > from && bytes[index - 1] == b' ' {
        index -= 1;
    }
    Some(index)
}

/// Byte index after the white space starting at `index`.
fn skip_whitespace(value: &str, mut index: usize) -> usize {
    while let Some(ch) = peek(value, index) {
        if !is_whitespace(ch) {
            break;
        }
        index += ch.len_utf8();
    }
    index
}

/// Entity-decode `value` without reporting problems.
fn decode_quiet(value: &str) -> String {
    entities::decode_raw(value, &mut Vec::new()).into_owned()
}

/// A backslash before an escapable character yields that character, or a
/// break for a line feed.
pub(crate) fn escape(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if byte(value, 0) != Some(b'\\') {
        return Ok(false);
    }
    let Some(ch) = peek(value, 1) else {
        return Ok(false);
    };
    if !p.options.escapes().contains(&ch) {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let node = if ch == '\n' {
        render::void(Node::Break)
    } else {
        Node::text(ch)
    };
    eat.push(p, &value[..1 + ch.len_utf8()], node)?;
    Ok(true)
}

/// `<scheme://rest>` or `<user@host>`.
pub(crate) fn auto_link(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let bytes = value.as_bytes();
    if bytes.first() != Some(&b'<') {
        return Ok(false);
    }

    let mut index = 1;
    while let Some(&b) = bytes.get(index) {
        if matches!(b, b' ' | b'>' | b'@') || (b == b':' && bytes.get(index + 1) == Some(&b'/')) {
            break;
        }
        index += 1;
    }
    if index == 1 {
        return Ok(false);
    }

    let has_at = match bytes.get(index) {
        Some(b'@') => true,
        Some(b':') if bytes.get(index + 2) == Some(&b'/') => false,
        _ => return Ok(false),
    };
    // Past `@`, or past `:/` so that the rest starts at the second slash.
    index += if has_at { 1 } else { 2 };

    let rest_start = index;
    while let Some(&b) = bytes.get(index) {
        if matches!(b, b' ' | b'>') {
            break;
        }
        index += 1;
    }
    if index == rest_start || bytes.get(index) != Some(&b'>') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let mut link = value[1..index].to_string();
    let mut content = &value[1..index];
    let mut now = eat.now(p).advanced_by(1);
    if has_at {
        let scheme = link.get(..MAILTO.len());
        if scheme.is_some_and(|scheme| scheme.eq_ignore_ascii_case(MAILTO)) {
            content = &content[MAILTO.len()..];
            now = now.advanced_by(MAILTO.len());
        } else {
            link.insert_str(0, MAILTO);
        }
    }

    let url = decode_quiet(&link);
    let eaten = eat.eat(p, &value[..=index])?;
    let node = p.without_escapes(|p| render::link(p, true, url, content, None, now));
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// A bare `http://`, `https://` or `mailto:` URL.
pub(crate) fn url(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if !p.options.gfm {
        return Ok(false);
    }

    let Some(protocol) = PROTOCOLS.iter().copied().find(|protocol| {
        value
            .get(..protocol.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(protocol))
    }) else {
        return Ok(false);
    };

    let mut index = protocol.len();
    let mut parens = 0usize;
    while let Some(ch) = peek(value, index) {
        if is_whitespace(ch) || ch == '<' {
            break;
        }
        if matches!(ch, '.' | ',' | ':' | ';' | '"' | '\'' | ')' | ']')
            && peek(value, index + 1).map_or(true, is_whitespace)
        {
            break;
        }
        match ch {
            '(' | '[' => parens += 1,
            ')' | ']' => match parens.checked_sub(1) {
                Some(depth) => parens = depth,
                None => break,
            },
            _ => {}
        }
        index += ch.len_utf8();
    }

    let rest = &value[protocol.len()..index];
    if rest.is_empty() {
        return Ok(false);
    }

    let subvalue = &value[..index];
    let mut content = subvalue;
    let mut now = eat.now(p);
    if protocol == MAILTO {
        match rest.find('@') {
            Some(at) if at + 1 < rest.len() => {}
            _ => return Ok(false),
        }
        content = &subvalue[MAILTO.len()..];
        now = now.advanced_by(MAILTO.len());
    }
    if silent {
        return Ok(true);
    }

    let url = decode_quiet(subvalue);
    let eaten = eat.eat(p, subvalue)?;
    let node = render::link(p, true, url, content, None, now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// Raw inline HTML. An `<a …>` tag disables links until its `</a>`.
pub(crate) fn inline_html(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let Some(len) = html::eat_inline(value, &p.options) else {
        return Ok(false);
    };
    if silent {
        return Ok(true);
    }

    let subvalue = &value[..len];
    let starts_with = |prefix: &str| {
        subvalue
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    if !p.in_link && starts_with("<a ") {
        p.in_link = true;
    } else if p.in_link && starts_with("</a>") {
        p.in_link = false;
    }

    eat.push(p, subvalue, render::literal(Node::Html, subvalue))?;
    Ok(true)
}

/// `[text](url "title")` and `![alt](url "title")`.
pub(crate) fn link(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let commonmark = p.options.commonmark;
    let gfm = p.options.gfm;
    let bytes = value.as_bytes();
    let len = value.len();

    let is_image = bytes.first() == Some(&b'!');
    let mut index = usize::from(is_image);
    if bytes.get(index) != Some(&b'[') {
        return Ok(false);
    }
    if !is_image && p.in_link {
        return Ok(false);
    }
    index += 1;

    let content_start = index;
    let mut content_end = None;
    let mut depth = 0usize;
    let mut opening = 0usize;
    while index < len {
        match bytes[index] {
            b'`' => {
                let count = 1 + bytes[index + 1..].iter().take_while(|&&b| b == b'`').count();
                index += count - 1;
                if opening == 0 {
                    opening = count;
                } else if count >= opening {
                    opening = 0;
                }
            }
            b'\\' => index += 1,
            b'[' if opening == 0 || gfm => depth += 1,
            b']' if opening == 0 || gfm => {
                if depth > 0 {
                    depth -= 1;
                } else {
                    let after = if gfm {
                        skip_whitespace(value, index + 1)
                    } else {
                        index + 1
                    };
                    if bytes.get(after) != Some(&b'(') {
                        return Ok(false);
                    }
                    content_end = Some(index);
                    index = after + 1;
                    break;
                }
            }
            _ => {}
        }
        index += 1;
    }
    let Some(content_end) = content_end else {
        return Ok(false);
    };
    let content = &value[content_start..content_end];

    index = skip_whitespace(value, index);

    let url_start;
    let url_end;
    if bytes.get(index) == Some(&b'<') {
        index += 1;
        url_start = index;
        loop {
            match bytes.get(index) {
                Some(b'>') => break,
                Some(b'\n') if commonmark => return Ok(false),
                None => return Ok(false),
                _ => index += 1,
            }
        }
        url_end = index;
        index += 1;
    } else {
        url_start = index;
        let mut end = index;
        let mut parens = 0usize;
        while let Some(ch) = peek(value, index) {
            if end < index && title_closer(ch, commonmark).is_some() {
                break;
            }
            if is_whitespace(ch) {
                if commonmark {
                    break;
                }
                index += ch.len_utf8();
                continue;
            }
            match ch {
                '(' => parens += 1,
                ')' => match parens.checked_sub(1) {
                    Some(depth) => parens = depth,
                    None => break,
                },
                _ => {}
            }
            index += ch.len_utf8();
            if ch == '\\' {
                if let Some(next) = peek(value, index) {
                    index += next.len_utf8();
                }
            }
            end = index;
        }
        url_end = end;
        index = end;
    }

    let gap_start = index;
    index = skip_whitespace(value, index);

    let mut title = None;
    let closer = bytes
        .get(index)
        .and_then(|&b| title_closer(b as char, commonmark));
    if let Some(closer) = closer.filter(|_| index > gap_start) {
        index += 1;
        let title_start = index;

        if commonmark {
            loop {
                match bytes.get(index) {
                    None => return Ok(false),
                    Some(&b) if b == closer => break,
                    Some(b'\\') => index += 2,
                    _ => index += 1,
                }
            }
            if bytes.get(index) != Some(&closer) {
                return Ok(false);
            }
            title = Some((title_start, index));
            index = skip_whitespace(value, index + 1);
        } else {
            // The title runs to the last closer that is followed by
            // optional white space and `)`.
            let mut candidate = None;
            while let Some(ch) = peek(value, index) {
                if ch == closer as char {
                    candidate = Some(index);
                } else if let Some(at) = candidate {
                    if ch == ')' {
                        title = Some((title_start, at));
                        break;
                    }
                    if !is_whitespace(ch) {
                        candidate = None;
                    }
                }
                index += ch.len_utf8();
            }
        }
    }

    if bytes.get(index) != Some(&b')') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let at = eat.test(p, &value[..url_start])?.end;
    let descaped = p.descape(&value[url_start..url_end]);
    let url = p.decode_raw(&descaped, at);

    let title = match title {
        Some((start, end)) if start < end => {
            let at = eat.test(p, &value[..start])?.end;
            let descaped = p.descape(&value[start..end]);
            Some(p.decode_raw(&descaped, at))
        }
        _ => None,
    };

    let now = eat.now(p).advanced_by(content_start);
    let eaten = eat.eat(p, &value[..=index])?;
    let node = render::link(p, !is_image, url, content, title, now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// Closing delimiter for a title opened by `opener`.
fn title_closer(opener: char, commonmark: bool) -> Option<u8> {
    match opener {
        '"' => Some(b'"'),
        '\'' => Some(b'\''),
        '(' if commonmark => Some(b')'),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ReferenceKind {
    Link,
    Image,
    Footnote,
}

/// `[text][id]`, `[text][]`, `[text]`, their image forms, and footnote
/// references `[^id]`.
pub(crate) fn reference(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let bytes = value.as_bytes();
    let len = value.len();

    let mut kind = ReferenceKind::Link;
    let mut index = 0;
    if bytes.first() == Some(&b'!') {
        kind = ReferenceKind::Image;
        index = 1;
    }
    if bytes.get(index) != Some(&b'[') {
        return Ok(false);
    }
    index += 1;

    if p.options.footnotes && kind == ReferenceKind::Link && bytes.get(index) == Some(&b'^') {
        kind = ReferenceKind::Footnote;
        index += 1;
    }
    let mut intro = index;

    let content_start = index;
    let mut depth = 0usize;
    let mut bracketed = false;
    while index < len {
        match bytes[index] {
            b'[' => {
                bracketed = true;
                depth += 1;
            }
            b']' if depth == 0 => break,
            b']' => depth -= 1,
            b'\\' => index += 1,
            _ => {}
        }
        index += 1;
    }
    if bytes.get(index) != Some(&b']') {
        return Ok(false);
    }
    let mut content = &value[content_start..index];
    index += 1;
    let mut end = index;

    index = skip_whitespace(value, index);
    let mut reference_type = ReferenceType::Shortcut;
    let mut identifier = content;

    if bytes.get(index) != Some(&b'[') {
        if content.is_empty() {
            return Ok(false);
        }
    } else {
        index += 1;
        let label_start = index;
        while let Some(&b) = bytes.get(index) {
            match b {
                b'[' | b']' => break,
                b'\\' => index += 2,
                _ => index += 1,
            }
        }
        if bytes.get(index) == Some(&b']') {
            identifier = &value[label_start..index];
            reference_type = if identifier.is_empty() {
                ReferenceType::Collapsed
            } else {
                ReferenceType::Full
            };
            end = index + 1;
        } else {
            end = label_start;
        }
    }

    if reference_type != ReferenceType::Full && bracketed {
        return Ok(false);
    }

    if kind == ReferenceKind::Footnote && reference_type != ReferenceType::Shortcut {
        kind = ReferenceKind::Link;
        intro = 1;
        content = &value[intro..content_start + content.len()];
    }
    if reference_type != ReferenceType::Full {
        identifier = content;
    }

    if kind == ReferenceKind::Link && p.in_link {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let now = eat.now(p).advanced_by(intro);
    let subvalue = &value[..end];

    if kind == ReferenceKind::Footnote && content.contains(' ') {
        let eaten = eat.eat(p, subvalue)?;
        let node = render::inline(p, Node::Footnote, content, now);
        eat.apply(p, &eaten, node);
        return Ok(true);
    }

    let identifier = normalize_identifier(identifier);
    let node = match kind {
        ReferenceKind::Link => {
            let mut p = Scoped::enter(p, Flag::InLink);
            Node::LinkReference(LinkReference {
                identifier,
                reference_type,
                children: p.tokenize_inline(content, now),
                position: None,
            })
        }
        ReferenceKind::Image => {
            let descaped = p.descape(content);
            let alt = p.decode_raw(&descaped, now);
            Node::ImageReference(ImageReference {
                identifier,
                reference_type,
                alt: Some(alt).filter(|alt| !alt.is_empty()),
                position: None,
            })
        }
        ReferenceKind::Footnote => Node::FootnoteReference(FootnoteReference {
            identifier,
            position: None,
        }),
    };

    eat.push(p, subvalue, node)?;
    Ok(true)
}

/// `**strong**` or `__strong__`.
pub(crate) fn strong(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let pedantic = p.options.pedantic;
    let marker = match byte(value, 0) {
        Some(marker @ (b'*' | b'_')) if byte(value, 1) == Some(marker) => marker,
        _ => return Ok(false),
    };
    if pedantic && peek(value, 2).is_some_and(is_whitespace) {
        return Ok(false);
    }

    let mut index = 2;
    let mut prev: Option<char> = None;
    while let Some(mut ch) = peek(value, index) {
        if ch == marker as char
            && byte(value, index + 1) == Some(marker)
            && !(pedantic && prev.is_some_and(is_whitespace))
            && byte(value, index + 2) != Some(marker)
        {
            let content = &value[2..index];
            if is_blank(content) {
                return Ok(false);
            }
            if silent {
                return Ok(true);
            }

            let now = eat.now(p).advanced_by(2);
            let eaten = eat.eat(p, &value[..index + 2])?;
            let node = render::inline(p, Node::Strong, content, now);
            eat.apply(p, &eaten, node);
            return Ok(true);
        }

        if !pedantic && ch == '\\' {
            index += 1;
            match peek(value, index) {
                Some(next) => ch = next,
                None => break,
            }
        }
        index += ch.len_utf8();
        prev = Some(ch);
    }

    Ok(false)
}

/// `*emphasis*` or `_emphasis_`. An underscore does not close before a word
/// character unless pedantic.
pub(crate) fn emphasis(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let pedantic = p.options.pedantic;
    let marker = match peek(value, 0) {
        Some(marker @ ('*' | '_')) => marker,
        _ => return Ok(false),
    };
    if pedantic && peek(value, 1).is_some_and(is_whitespace) {
        return Ok(false);
    }

    let mut index = 1;
    let mut prev: Option<char> = None;
    while let Some(mut ch) = peek(value, index) {
        if ch == marker && !(pedantic && prev.is_some_and(is_whitespace)) {
            index += 1;
            let next = peek(value, index);
            if next != Some(marker) {
                let content = &value[1..index - 1];
                if is_blank(content) || prev == Some(marker) {
                    return Ok(false);
                }
                if pedantic || marker != '_' || !next.is_some_and(is_word_char) {
                    if silent {
                        return Ok(true);
                    }

                    let now = eat.now(p).advanced_by(1);
                    let eaten = eat.eat(p, &value[..index])?;
                    let node = render::inline(p, Node::Emphasis, content, now);
                    eat.apply(p, &eaten, node);
                    return Ok(true);
                }
            }
            match next {
                Some(next) => ch = next,
                None => break,
            }
        }

        if !pedantic && ch == '\\' {
            index += 1;
            match peek(value, index) {
                Some(next) => ch = next,
                None => break,
            }
        }
        index += ch.len_utf8();
        prev = Some(ch);
    }

    Ok(false)
}

/// `~~deleted~~`
pub(crate) fn deletion(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if !p.options.gfm || !value.starts_with("~~") || peek(value, 2).is_some_and(is_whitespace) {
        return Ok(false);
    }

    let mut previous: Option<char> = None;
    let mut preceding: Option<char> = None;
    for (offset, ch) in value[2..].char_indices() {
        let index = 2 + offset;
        if ch == '~' && previous == Some('~') && !preceding.is_some_and(is_whitespace) {
            if silent {
                return Ok(true);
            }

            let content = &value[2..index - 1];
            let now = eat.now(p).advanced_by(2);
            let eaten = eat.eat(p, &value[..=index])?;
            let node = render::inline(p, Node::Delete, content, now);
            eat.apply(p, &eaten, node);
            return Ok(true);
        }
        preceding = previous;
        previous = Some(ch);
    }

    Ok(false)
}

/// Code between backtick runs of equal length.
pub(crate) fn inline_code(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let bytes = value.as_bytes();
    let opening = bytes.iter().take_while(|&&b| b == b'`').count();
    if opening == 0 {
        return Ok(false);
    }

    let mut index = opening;
    let mut found = None;
    while index < bytes.len() {
        if bytes[index] != b'`' {
            index += 1;
            continue;
        }
        let run = bytes[index..].iter().take_while(|&&b| b == b'`').count();
        if run == opening {
            found = Some((index, index + run));
            break;
        }
        index += run;
    }

    let (content, end) = match found {
        Some((close, end)) => (&value[opening..close], end),
        // An unclosed even run is eaten as empty code.
        None if opening % 2 == 0 => ("", opening),
        None => return Ok(false),
    };
    if silent {
        return Ok(true);
    }

    let content = content.trim_matches(is_whitespace);
    eat.push(p, &value[..end], render::literal(Node::InlineCode, content))?;
    Ok(true)
}

/// Two or more spaces before a line feed, or any line feed with `breaks`.
pub(crate) fn hard_break(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let spaces = value.bytes().take_while(|&b| b == b' ').count();
    if byte(value, spaces) != Some(b'\n') {
        return Ok(false);
    }
    if !p.options.breaks && spaces < MIN_BREAK_LENGTH {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    eat.push(p, &value[..=spaces], render::void(Node::Break))?;
    Ok(true)
}

/// Plain text up to the next place another rule could match, with
/// character references decoded.
pub(crate) fn text(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if silent {
        return Ok(true);
    }

    let mut min = value.len();
    for index in 0..p.rules(Mode::Inline).len() {
        let rule = p.rules(Mode::Inline)[index];
        if rule.name == "text" {
            continue;
        }
        let Some(locator) = rule.locate else {
            let at = eat.now(p);
            return Err(p.file.fail(ParseError::missing_locator(rule.name, at)));
        };
        if let Some(position) = locator(value, 1) {
            min = min.min(position);
        }
    }

    let subvalue = &value[..min];
    let now = eat.now(p);
    let mut warnings = Vec::new();
    let chunks = entities::decode(subvalue, &mut warnings);
    for warning in warnings {
        let at = locate(p, now, &subvalue[..warning.index]);
        p.file.entity_warning(warning.reason, at);
    }
    for chunk in chunks {
        eat.push(p, chunk.source, Node::text(chunk.value))?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_locator_prefers_the_bang() {
        assert_eq!(locate_link("a ![b]", 1), Some(2));
        assert_eq!(locate_link("![b]", 1), Some(1));
        assert_eq!(locate_link("a [b]", 1), Some(2));
        assert_eq!(locate_link("abc", 1), None);
    }

    #[test]
    fn break_locator_backs_up_over_spaces() {
        assert_eq!(locate_break("foo  \nbar", 1), Some(3));
        assert_eq!(locate_break("  \n", 1), Some(1));
    }

    #[test]
    fn url_locator_finds_the_earliest_protocol() {
        assert_eq!(locate_url("see https://a or http://b", 1), Some(4));
        assert_eq!(locate_url("write to mailto:x@y", 1), Some(9));
        assert_eq!(locate_url("nothing", 1), None);
    }

    #[test]
    fn strong_and_emphasis_locators() {
        assert_eq!(locate_strong("a __b__ **c**", 1), Some(2));
        assert_eq!(locate_emphasis("a *b* _c_", 1), Some(2));
        assert_eq!(locate_deletion("a ~b ~~c~~", 1), Some(5));
    }

    #[test]
    fn locators_handle_multibyte_starts() {
        assert_eq!(locate_code("é`x`", 1), Some(2));
        assert_eq!(locate_escape("é", 1), None);
    }
}
