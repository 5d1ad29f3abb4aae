//! Block-level tokenizers.
//!
//! Each tokenizer inspects the start of the remaining input. In silent mode
//! it only answers whether it would match there, which is how one construct
//! asks whether the next line starts another (a paragraph ending before a
//! heading, a blockquote refusing a lazy line that opens a list).

use crate::ast::{Align, Definition, List, Node, Table};
use crate::error::ParseError;
use crate::html;
use crate::options::Options;
use crate::parser::Parser;
use crate::render;
use crate::tokenizer::{Eat, Flag, IndentTracker, Rule, Scoped};
use crate::util::{
    byte, is_blank, is_whitespace, leading_blanks, line_end, normalize_identifier, peek,
    trim_trailing_lines, TAB_SIZE,
};

type Outcome = Result<bool, ParseError>;

const CODE_INDENT: &str = "    ";
const MIN_FENCE_COUNT: usize = 3;
const MAX_ATX_COUNT: usize = 6;
const MAX_LINE_HEADING_INDENT: usize = 3;
const THEMATIC_BREAK_MARKER_COUNT: usize = 3;
const MIN_CLOSING_HTML_NEWLINE_COUNT: usize = 2;
const MIN_TABLE_COLUMNS: usize = 2;
const MIN_TABLE_ROWS: usize = 2;
const YAML_FENCE: &str = "---";

/// Block rules in priority order. Rules for disabled extensions are left
/// out.
pub(crate) fn rules(options: &Options) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(14);
    if options.yaml {
        rules.push(Rule::new("yamlFrontMatter", yaml_front_matter).only_at_start());
    }
    rules.push(Rule::new("newline", newline));
    rules.push(Rule::new("indentedCode", indented_code));
    if options.gfm {
        rules.push(Rule::new("fencedCode", fenced_code));
    }
    rules.push(Rule::new("blockquote", blockquote));
    rules.push(Rule::new("atxHeading", atx_heading));
    rules.push(Rule::new("thematicBreak", thematic_break));
    rules.push(Rule::new("list", list));
    rules.push(Rule::new("setextHeading", setext_heading));
    rules.push(Rule::new("html", block_html));
    if options.footnotes {
        rules.push(
            Rule::new("footnote", footnote_definition)
                .not_in_list()
                .not_in_block(),
        );
    }
    rules.push(
        Rule::new("definition", definition)
            .not_in_list()
            .not_in_block(),
    );
    if options.gfm {
        rules.push(Rule::new("table", table).not_in_list());
    }
    rules.push(Rule::new("paragraph", paragraph));
    rules
}

/// Blank lines between blocks. Eaten without a node.
pub(crate) fn newline(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if byte(value, 0) != Some(b'\n') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let mut end = 1;
    for (index, ch) in value[1..].char_indices() {
        if !is_whitespace(ch) {
            break;
        }
        if ch == '\n' {
            end = index + 2;
        }
    }

    eat.eat(p, &value[..end])?;
    Ok(true)
}

/// Lines indented by four spaces or a tab. Blank lines are kept only when
/// more indented lines follow.
pub(crate) fn indented_code(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let bytes = value.as_bytes();
    let len = value.len();
    let mut content = String::new();
    let mut pending_lines = 0;
    let mut end = 0;
    let mut index = 0;

    while index < len {
        let prefix = if value[index..].starts_with(CODE_INDENT) {
            CODE_INDENT.len()
        } else if bytes[index] == b'\t' {
            1
        } else {
            0
        };

        if prefix == 0 {
            index += leading_blanks(&value[index..]);
            if byte(value, index) != Some(b'\n') {
                break;
            }
            pending_lines += 1;
            index += 1;
            continue;
        }

        index += prefix;
        if index >= len {
            break;
        }

        for _ in 0..pending_lines {
            content.push('\n');
        }
        pending_lines = 0;

        let eol = line_end(value, index);
        content.push_str(&value[index..eol]);
        end = eol;
        if eol < len {
            pending_lines = 1;
        }
        index = eol + 1;
    }

    if content.is_empty() {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    eat.push(p, &value[..end], render::code(&content, None))?;
    Ok(true)
}

/// Code between fences of three or more backticks or tildes.
pub(crate) fn fenced_code(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if !p.options.gfm {
        return Ok(false);
    }

    let bytes = value.as_bytes();
    let len = value.len();
    let indent = leading_blanks(value);
    let mut index = indent;

    let marker = match bytes.get(index) {
        Some(&marker @ (b'`' | b'~')) => marker,
        _ => return Ok(false),
    };
    let fence = bytes[index..].iter().take_while(|&&b| b == marker).count();
    if fence < MIN_FENCE_COUNT {
        return Ok(false);
    }
    index += fence;
    index += leading_blanks(&value[index..]);

    let flag_start = index;
    let mut flag_end = index;
    while let Some(&b) = bytes.get(index) {
        if matches!(b, b'\n' | b'`' | b'~') {
            break;
        }
        if !matches!(b, b' ' | b'\t') {
            flag_end = index + 1;
        }
        index += 1;
    }
    if bytes.get(index).is_some_and(|&b| b != b'\n') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let now = eat.now(p).shifted(&value[..flag_start]);
    let flag = p.descape(&value[flag_start..flag_end]);
    let lang = p.decode_raw(&flag, now);

    // `start..end` is the content seen so far, `end..closing` a trailing
    // line that may turn out to be the closing fence.
    let mut start = index;
    let mut end = index;
    let mut closing = index;

    while index <= len {
        end = closing;

        if bytes.get(index) != Some(&b'\n') {
            if index < len {
                end = index + 1;
            }
            closing = end;
            index += 1;
            continue;
        }

        if end == start {
            start = index + 1;
            end = start;
        }
        index += 1;

        let spaces = bytes[index..].iter().take_while(|&&b| b == b' ').count();
        index += spaces;
        closing = index;
        if spaces >= CODE_INDENT.len() {
            continue;
        }

        let markers = bytes[index..].iter().take_while(|&&b| b == marker).count();
        index += markers;
        closing = index;
        if markers < fence {
            continue;
        }

        index += leading_blanks(&value[index..]);
        closing = index;
        if matches!(bytes.get(index), None | Some(b'\n')) {
            break;
        }
    }

    let exdented = value[start..end]
        .split('\n')
        .map(|line| {
            let spaces = line.bytes().take(indent).take_while(|&b| b == b' ').count();
            &line[spaces..]
        })
        .collect::<Vec<_>>()
        .join("\n");

    eat.push(p, &value[..closing], render::code(&exdented, Some(lang)))?;
    Ok(true)
}

/// `# Heading`, with an optional closing sequence of hashes.
pub(crate) fn atx_heading(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let pedantic = p.options.pedantic;
    let bytes = value.as_bytes();
    let mut index = leading_blanks(value);

    let hashes = bytes[index..].iter().take_while(|&&b| b == b'#').count();
    if hashes == 0 || (!pedantic && hashes > MAX_ATX_COUNT) {
        return Ok(false);
    }
    index += hashes;

    let spacing = leading_blanks(&value[index..]);
    if !pedantic && spacing == 0 && !matches!(bytes.get(index), None | Some(b'\n')) {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }
    index += spacing;

    let eol = line_end(value, index);
    let content = value[index..eol].trim_end_matches([' ', '\t', '#']);
    let now = eat.now(p).shifted(&value[..index]);
    let depth = hashes.min(MAX_ATX_COUNT) as u8;

    let eaten = eat.eat(p, &value[..eol])?;
    let node = render::heading(p, content, depth, now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// A line underlined by `=` (depth one) or `-` (depth two).
pub(crate) fn setext_heading(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let bytes = value.as_bytes();
    let len = value.len();
    let indent = bytes
        .iter()
        .take(MAX_LINE_HEADING_INDENT)
        .take_while(|&&b| b == b' ')
        .count();

    let eol = line_end(value, indent);
    if eol == len {
        return Ok(false);
    }
    let (marker, depth) = match bytes.get(eol + 1) {
        Some(b'=') => (b'=', 1),
        Some(b'-') => (b'-', 2),
        _ => return Ok(false),
    };
    let rule_end = eol + 1 + bytes[eol + 1..].iter().take_while(|&&b| b == marker).count();
    if rule_end < len && bytes[rule_end] != b'\n' {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let content = value[indent..eol].trim_end_matches([' ', '\t']);
    let now = eat.now(p).shifted(&value[..indent]);

    let eaten = eat.eat(p, &value[..rule_end])?;
    let node = render::heading(p, content, depth, now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// Three or more `*`, `-` or `_`, optionally separated by spaces.
pub(crate) fn thematic_break(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let bytes = value.as_bytes();
    let mut index = leading_blanks(value);

    let marker = match bytes.get(index) {
        Some(&marker @ (b'*' | b'-' | b'_')) => marker,
        _ => return Ok(false),
    };
    let mut count = 1;
    index += 1;

    loop {
        match bytes.get(index) {
            Some(&b) if b == marker => count += 1,
            Some(b' ') => {}
            None | Some(b'\n') if count >= THEMATIC_BREAK_MARKER_COUNT => break,
            _ => return Ok(false),
        }
        index += 1;
    }
    if silent {
        return Ok(true);
    }

    eat.push(p, &value[..index], render::void(Node::ThematicBreak))?;
    Ok(true)
}

/// Lines starting with `>`, plus lazy continuation lines.
pub(crate) fn blockquote(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let commonmark = p.options.commonmark;
    let bytes = value.as_bytes();
    let len = value.len();

    if byte(value, leading_blanks(value)) != Some(b'>') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let now = eat.now(p);
    let mut lines = Vec::new();
    let mut contents = Vec::new();
    let mut indents = Vec::new();
    let mut index = 0;

    while index < len {
        let start = index;
        let eol = line_end(value, index);

        index += leading_blanks(&value[index..]);
        let prefixed = bytes.get(index) == Some(&b'>');
        if prefixed {
            index += 1;
            if bytes.get(index) == Some(&b' ') {
                index += 1;
            }
        } else {
            index = start;
        }

        let content = &value[index..eol];
        if !prefixed {
            if is_blank(content) {
                break;
            }

            let rest = &value[index..];
            let interrupted = if commonmark {
                indented_code(p, eat, rest, true)?
                    || fenced_code(p, eat, rest, true)?
                    || atx_heading(p, eat, rest, true)?
                    || setext_heading(p, eat, rest, true)?
                    || thematic_break(p, eat, rest, true)?
                    || block_html(p, eat, rest, true)?
                    || list(p, eat, rest, true)?
            } else {
                definition(p, eat, rest, true)? || footnote_definition(p, eat, rest, true)?
            };
            if interrupted {
                break;
            }
        }

        indents.push(index - start);
        lines.push(&value[start..eol]);
        contents.push(content);
        index = eol + 1;
    }

    let eaten = eat.eat(p, &lines.join("\n"))?;
    let mut tracker = IndentTracker::new(now.line);
    for amount in indents {
        tracker.strip(p, amount);
    }
    let node = render::blockquote(p, &contents.join("\n"), now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

struct Item<'a> {
    lines: Vec<&'a str>,
    indent: usize,
    trail: Vec<&'a str>,
}

/// Bullet and ordered lists.
pub(crate) fn list(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let commonmark = p.options.commonmark;
    let pedantic = p.options.pedantic;
    let bytes = value.as_bytes();
    let len = value.len();
    let is_ordered_marker = |b: u8| b == b'.' || (commonmark && b == b')');

    let mut index = leading_blanks(value);
    let (ordered, start, marker) = match bytes.get(index) {
        Some(&marker @ (b'*' | b'+' | b'-')) => (false, None, marker),
        _ => {
            let digits = bytes[index..].iter().take_while(|b| b.is_ascii_digit()).count();
            match bytes.get(index + digits) {
                Some(&marker) if digits > 0 && is_ordered_marker(marker) => {
                    let start = value[index..index + digits].parse::<u64>().ok();
                    index += digits;
                    (true, start, marker)
                }
                _ => return Ok(false),
            }
        }
    };
    if !matches!(bytes.get(index + 1), Some(b' ' | b'\t')) {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let mut items: Vec<Item<'_>> = Vec::new();
    let mut all_lines: Vec<&str> = Vec::new();
    let mut empty_lines: Vec<&str> = Vec::new();
    let mut empty = false;
    index = 0;

    while index < len {
        let line_start = index;
        let eol = line_end(value, index);
        let mut indented = false;
        let mut size = 0;

        while let Some(&b) = bytes.get(index) {
            match b {
                b'\t' => size += TAB_SIZE - size % TAB_SIZE,
                b' ' => size += 1,
                _ => break,
            }
            index += 1;
        }
        if size >= TAB_SIZE {
            indented = true;
        }
        if items.last().is_some_and(|item| size >= item.indent) {
            indented = true;
        }

        let mut current = None;
        if !indented {
            match bytes.get(index) {
                Some(&bullet @ (b'*' | b'+' | b'-')) => {
                    current = Some(bullet);
                    index += 1;
                    size += 1;
                }
                _ => {
                    let digits = bytes[index..].iter().take_while(|b| b.is_ascii_digit()).count();
                    index += digits;
                    let found = bytes.get(index).copied();
                    index += 1;
                    if digits > 0 && found.is_some_and(is_ordered_marker) {
                        current = found;
                        size += digits + 1;
                    }
                }
            }

            if current.is_some() {
                match bytes.get(index) {
                    Some(b'\t') => {
                        size += TAB_SIZE - size % TAB_SIZE;
                        index += 1;
                    }
                    Some(b' ') => {
                        let stop = index + TAB_SIZE;
                        while index < stop && bytes.get(index) == Some(&b' ') {
                            index += 1;
                            size += 1;
                        }
                        // Five or more spaces: the content is indented code
                        // and only one space belongs to the bullet.
                        if index == stop && bytes.get(index) == Some(&b' ') {
                            index -= TAB_SIZE - 1;
                            size -= TAB_SIZE - 1;
                        }
                    }
                    None | Some(b'\n') => {}
                    _ => current = None,
                }
            }
        }

        let prefixed = match current {
            Some(current) => {
                if commonmark && marker != current {
                    break;
                }
                true
            }
            None => {
                if !commonmark && !indented && bytes.get(line_start) == Some(&b' ') {
                    indented = true;
                } else if commonmark {
                    if let Some(item) = items.last() {
                        indented = size >= item.indent || size > TAB_SIZE;
                    }
                }
                index = line_start;
                false
            }
        };

        let line = &value[line_start..eol];
        let content = &value[index..eol];

        if matches!(current, Some(b'*' | b'-')) && thematic_break(p, eat, line, true)? {
            break;
        }

        let prev_empty = empty;
        empty = is_blank(content);

        if indented && !items.is_empty() {
            all_lines.extend_from_slice(&empty_lines);
            all_lines.push(line);
            if let Some(item) = items.last_mut() {
                item.lines.append(&mut empty_lines);
                item.lines.push(line);
            }
        } else if prefixed {
            if !empty_lines.is_empty() {
                if let Some(item) = items.last_mut() {
                    item.lines.push("");
                    item.trail = empty_lines.clone();
                }
            }
            items.push(Item {
                lines: vec![line],
                indent: size,
                trail: Vec::new(),
            });
            all_lines.append(&mut empty_lines);
            all_lines.push(line);
        } else if empty {
            if prev_empty {
                break;
            }
            empty_lines.push(line);
        } else {
            if prev_empty {
                break;
            }
            if !pedantic
                && (fenced_code(p, eat, line, true)? || thematic_break(p, eat, line, true)?)
            {
                break;
            }
            if !commonmark
                && (definition(p, eat, line, true)? || footnote_definition(p, eat, line, true)?)
            {
                break;
            }
            let Some(item) = items.last_mut() else {
                break;
            };
            all_lines.extend_from_slice(&empty_lines);
            all_lines.push(line);
            item.lines.append(&mut empty_lines);
            item.lines.push(line);
        }

        index = eol + 1;
    }

    let eaten = eat.eat(p, &all_lines.join("\n"))?;
    eat.reset(&eaten);
    p.at_start = false;

    let mut children = Vec::with_capacity(items.len());
    let mut loose = false;
    {
        let mut p = Scoped::enter(p, Flag::InList);
        let mut p = Scoped::enter(&mut p, Flag::InBlock);
        let last = items.len().saturating_sub(1);

        for (number, item) in items.iter().enumerate() {
            let content = item.lines.join("\n");
            let now = eat.now(&p);
            let item_eaten = eat.eat(&mut p, &content)?;
            let node = render::list_item(&mut p, &content, now);
            if let Node::ListItem(list_item) = &node {
                loose |= list_item.loose;
            }
            eat.apply_into(&mut p, &item_eaten, node, &mut children);

            let mut trail = item.trail.join("\n");
            if number != last {
                trail.push('\n');
            }
            eat.eat(&mut p, &trail)?;
        }
    }

    let node = Node::List(List {
        ordered,
        start,
        loose,
        children,
        position: None,
    });
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// Raw HTML starting with a comment, CDATA, declaration, processing
/// instruction or block-level tag. Runs until a blank line.
pub(crate) fn block_html(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let offset = leading_blanks(value);
    let Some(matched) = html::eat_block(&value[offset..], &p.options) else {
        return Ok(false);
    };
    if silent {
        return Ok(true);
    }

    let bytes = value.as_bytes();
    let mut index = offset + matched;
    let mut end = index;
    let mut newlines = 0;
    while let Some(&b) = bytes.get(index) {
        if b == b'\n' {
            newlines += 1;
        } else if newlines < MIN_CLOSING_HTML_NEWLINE_COUNT {
            newlines = 0;
            end = index + 1;
        } else {
            break;
        }
        index += 1;
    }

    let subvalue = &value[..end];
    eat.push(p, subvalue, render::literal(Node::Html, subvalue))?;
    Ok(true)
}

/// Byte index of the `]` closing a label that starts at `index`. A
/// backslash escapes the byte after it.
fn label_end(value: &str, mut index: usize) -> Option<usize> {
    let bytes = value.as_bytes();
    while let Some(&b) = bytes.get(index) {
        match b {
            b']' => return Some(index),
            b'\\' => index += 2,
            _ => index += 1,
        }
    }
    None
}

/// `[label]: url "title"`
pub(crate) fn definition(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let commonmark = p.options.commonmark;
    let bytes = value.as_bytes();

    let mut index = leading_blanks(value);
    if bytes.get(index) != Some(&b'[') {
        return Ok(false);
    }
    index += 1;

    let label_start = index;
    let Some(label_stop) = label_end(value, index) else {
        return Ok(false);
    };
    if label_stop == label_start || bytes.get(label_stop + 1) != Some(&b':') {
        return Ok(false);
    }
    let label = &value[label_start..label_stop];
    index = label_stop + 2;

    while matches!(bytes.get(index), Some(b' ' | b'\t' | b'\n')) {
        index += 1;
    }
    let before_url = index;

    let mut url = "";
    if bytes.get(index) == Some(&b'<') {
        let inner = index + 1;
        let enclosed = bytes[inner..]
            .iter()
            .take_while(|b| !matches!(b, b'>' | b'[' | b']'))
            .count();
        if bytes.get(inner + enclosed) == Some(&b'>') {
            url = &value[inner..inner + enclosed];
            index = inner + enclosed + 1;
        } else if commonmark {
            return Ok(false);
        }
    }
    if url.is_empty() {
        let url_start = index;
        while let Some(ch) = peek(value, index) {
            if matches!(ch, '[' | ']') || is_whitespace(ch) {
                break;
            }
            index += ch.len_utf8();
        }
        url = &value[url_start..index];
    }
    if url.is_empty() {
        return Ok(false);
    }

    let url_end = index;
    while matches!(bytes.get(index), Some(b' ' | b'\t' | b'\n')) {
        index += 1;
    }
    let closer = match bytes.get(index) {
        Some(b'"') => Some(b'"'),
        Some(b'\'') => Some(b'\''),
        Some(b'(') => Some(b')'),
        _ => None,
    };

    let mut title = None;
    match closer {
        None => index = url_end,
        Some(_) if index == url_end => return Ok(false),
        Some(closer) => {
            index += 1;
            let title_start = index;
            loop {
                match bytes.get(index) {
                    None => return Ok(false),
                    Some(&b) if b == closer => break,
                    Some(b'\n') => {
                        index += 1;
                        match bytes.get(index) {
                            Some(&b) if b == b'\n' || b == closer => return Ok(false),
                            None => return Ok(false),
                            _ => {}
                        }
                    }
                    _ => {}
                }
                index += 1;
            }
            title = Some((title_start, &value[title_start..index]));
            index += 1;
        }
    }

    index += leading_blanks(&value[index..]);
    if !matches!(bytes.get(index), None | Some(b'\n')) {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let at = eat.test(p, &value[..before_url])?.end;
    let descaped = p.descape(url);
    let url = p.decode_raw(&descaped, at);

    let title = match title {
        Some((title_start, raw)) => {
            let at = eat.test(p, &value[..title_start])?.end;
            let descaped = p.descape(raw);
            Some(p.decode_raw(&descaped, at)).filter(|title| !title.is_empty())
        }
        None => None,
    };

    let node = Node::Definition(Definition {
        identifier: normalize_identifier(label),
        url,
        title,
        position: None,
    });
    eat.push(p, &value[..index], node)?;
    Ok(true)
}

/// `---` fenced front matter at the very start of a document.
pub(crate) fn yaml_front_matter(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    let head = YAML_FENCE.len() + 1;
    if !p.options.yaml || !value.starts_with("---\n") {
        return Ok(false);
    }

    let bytes = value.as_bytes();
    let mut content_end = head;
    let mut index = head;
    while index < bytes.len() {
        let b = bytes[index];
        if b == b'-'
            && (index > content_end || content_end == head)
            && value[index..].starts_with(YAML_FENCE)
        {
            if silent {
                return Ok(true);
            }
            let node = render::literal(Node::Yaml, &value[head..content_end]);
            eat.push(p, &value[..index + YAML_FENCE.len()], node)?;
            return Ok(true);
        }
        if b != b'\n' {
            content_end = index + 1;
        }
        index += 1;
    }
    Ok(false)
}

/// `[^label]: content`, continued by lines indented with spaces.
pub(crate) fn footnote_definition(
    p: &mut Parser,
    eat: &mut Eat<'_>,
    value: &str,
    silent: bool,
) -> Outcome {
    if !p.options.footnotes {
        return Ok(false);
    }

    let bytes = value.as_bytes();
    let len = value.len();
    let mut index = value
        .char_indices()
        .find(|&(_, ch)| !is_whitespace(ch))
        .map_or(len, |(index, _)| index);
    if !value[index..].starts_with("[^") {
        return Ok(false);
    }
    index += 2;

    let label_start = index;
    let Some(label_stop) = label_end(value, index) else {
        return Ok(false);
    };
    if label_stop == label_start || bytes.get(label_stop + 1) != Some(&b':') {
        return Ok(false);
    }
    if silent {
        return Ok(true);
    }

    let identifier = normalize_identifier(&value[label_start..label_stop]);
    index = label_stop + 2;
    index += leading_blanks(&value[index..]);
    let now = eat.now(p).shifted(&value[..index]);

    let content_start = index;
    let mut content_end = index;
    while index < len {
        if bytes[index] == b'\n' {
            let mut cursor = index;
            while bytes.get(cursor) == Some(&b'\n') {
                cursor += 1;
            }
            let spaces = bytes[cursor..].iter().take_while(|&&b| b == b' ').count();
            if spaces == 0 {
                break;
            }
            cursor += spaces;
            if cursor >= len {
                content_end = len;
                break;
            }
            index = cursor;
        }
        index += 1;
        content_end = index;
    }

    let eaten = eat.eat(p, &value[..content_end])?;
    let mut tracker = IndentTracker::new(now.line);
    let mut lines = Vec::new();
    for line in value[content_start..content_end].split('\n') {
        let stripped = if line.starts_with('\t') {
            1
        } else if line.starts_with(CODE_INDENT) {
            CODE_INDENT.len()
        } else {
            0
        };
        tracker.strip(p, stripped);
        lines.push(&line[stripped..]);
    }

    let node = render::footnote_definition(p, identifier, &lines.join("\n"), now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

/// Pipe tables: a header row, an alignment row, then body rows.
pub(crate) fn table(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    if !p.options.gfm {
        return Ok(false);
    }

    let bytes = value.as_bytes();
    let len = value.len();
    let mut lines = Vec::new();
    let mut end = 0;
    let mut index = 0;

    while index <= len {
        let eol = line_end(value, index);
        let pipe = bytes
            .get(index + 1..)
            .and_then(|rest| memchr::memchr(b'|', rest))
            .map(|found| index + 1 + found);
        if !pipe.is_some_and(|pipe| pipe < eol) {
            break;
        }
        lines.push(&value[index..eol]);
        end = eol;
        index = eol + 1;
    }
    if lines.len() < MIN_TABLE_ROWS {
        return Ok(false);
    }

    let alignments = lines.remove(1);
    let Some(align) = alignment_row(alignments) else {
        return Ok(false);
    };
    if silent {
        return Ok(true);
    }

    let table_eaten = eat.eat(p, &value[..end])?;
    eat.reset(&table_eaten);
    p.at_start = false;

    let mut rows = Vec::with_capacity(lines.len());
    for (position, line) in lines.iter().enumerate() {
        if position > 0 {
            eat.eat(p, "\n")?;
        }
        let row_eaten = eat.eat(p, line)?;
        eat.reset(&row_eaten);
        let cells = table_row(p, eat, line)?;
        eat.apply_into(p, &row_eaten, render::parent(Node::TableRow, cells), &mut rows);
        if position == 0 {
            eat.eat(p, &format!("\n{alignments}"))?;
        }
    }

    let node = Node::Table(Table {
        align,
        children: rows,
        position: None,
    });
    eat.apply(p, &table_eaten, node);
    Ok(true)
}

/// Parse `| :-- | :-: | --: |`. `None` when the row is malformed or has
/// fewer than two columns.
fn alignment_row(row: &str) -> Option<Vec<Align>> {
    let mut align = Vec::new();
    let mut current: Option<Align> = None;
    let mut has_dash = false;
    let mut first = true;

    for ch in row.chars() {
        match ch {
            '|' => {
                has_dash = false;
                match current.take() {
                    Some(alignment) => align.push(alignment),
                    None if !first => return None,
                    None => {}
                }
                first = false;
            }
            '-' => {
                has_dash = true;
                current = current.or(Some(Align::None));
            }
            ':' => {
                current = Some(match current {
                    Some(Align::Left) => Align::Center,
                    Some(Align::None) if has_dash => Align::Right,
                    _ => Align::Left,
                });
            }
            ch if is_whitespace(ch) => {}
            _ => return None,
        }
    }
    if let Some(alignment) = current {
        align.push(alignment);
    }

    (align.len() >= MIN_TABLE_COLUMNS).then_some(align)
}

/// Split one row into cells. Pipes inside code spans and escaped pipes do
/// not separate cells.
fn table_row(p: &mut Parser, eat: &mut Eat<'_>, line: &str) -> Result<Vec<Node>, ParseError> {
    let chars: Vec<char> = line.chars().collect();
    let length = chars.len() + 1;
    let mut cells = Vec::new();
    let mut queue = String::new();
    let mut cell = String::new();
    let mut preamble = true;
    let mut opening = 0;
    let mut index = 0;

    while index < length {
        let ch = chars.get(index).copied();
        match ch {
            Some(blank @ (' ' | '\t')) => {
                if cell.is_empty() {
                    eat.eat(p, blank.encode_utf8(&mut [0; 4]))?;
                } else {
                    queue.push(blank);
                }
                index += 1;
                continue;
            }
            None | Some('|') => {
                if preamble {
                    if ch.is_some() {
                        eat.eat(p, "|")?;
                    }
                } else {
                    if ch.is_some() && opening > 0 {
                        queue.push('|');
                        index += 1;
                        continue;
                    }

                    if !cell.is_empty() || ch.is_some() {
                        let mut subvalue = cell.clone();
                        if queue.len() > 1 {
                            if ch.is_some() {
                                let last = queue.pop();
                                subvalue.push_str(&queue);
                                queue = last.map(String::from).unwrap_or_default();
                            } else {
                                subvalue.push_str(&queue);
                                queue.clear();
                            }
                        }
                        let now = eat.now(p);
                        let cell_eaten = eat.eat(p, &subvalue)?;
                        let node = render::inline(p, Node::TableCell, &cell, now);
                        eat.apply_into(p, &cell_eaten, node, &mut cells);
                    }

                    let mut rest = std::mem::take(&mut queue);
                    if ch.is_some() {
                        rest.push('|');
                    }
                    eat.eat(p, &rest)?;
                    cell.clear();
                }
            }
            Some(other) => {
                if !queue.is_empty() {
                    cell.push_str(&queue);
                    queue.clear();
                }
                cell.push(other);

                if other == '\\' && index + 2 != length {
                    if let Some(&next) = chars.get(index + 1) {
                        cell.push(next);
                    }
                    index += 1;
                }

                if other == '`' {
                    let mut count = 1;
                    while chars.get(index + 1) == Some(&'`') {
                        cell.push('`');
                        index += 1;
                        count += 1;
                    }
                    if opening == 0 {
                        opening = count;
                    } else if count >= opening {
                        opening = 0;
                    }
                }
            }
        }
        preamble = false;
        index += 1;
    }

    Ok(cells)
}

/// Everything else: lines up to a blank line or the start of another block.
pub(crate) fn paragraph(p: &mut Parser, eat: &mut Eat<'_>, value: &str, silent: bool) -> Outcome {
    let commonmark = p.options.commonmark;
    let gfm = p.options.gfm;
    let bytes = value.as_bytes();
    let len = value.len();
    let mut next = memchr::memchr(b'\n', bytes);

    let end = loop {
        let Some(newline) = next else {
            break len;
        };
        if bytes.get(newline + 1) == Some(&b'\n') {
            break newline;
        }

        if commonmark {
            let mut size = 0;
            for &b in &bytes[newline + 1..] {
                match b {
                    b'\t' => {
                        size = TAB_SIZE;
                        break;
                    }
                    b' ' => size += 1,
                    _ => break,
                }
            }
            if size >= TAB_SIZE {
                next = memchr::memchr(b'\n', &bytes[newline + 1..]).map(|found| newline + 1 + found);
                continue;
            }
        }

        let rest = &value[newline + 1..];
        if thematic_break(p, eat, rest, true)?
            || atx_heading(p, eat, rest, true)?
            || fenced_code(p, eat, rest, true)?
            || blockquote(p, eat, rest, true)?
            || block_html(p, eat, rest, true)?
        {
            break newline;
        }

        if list(p, eat, rest, true)?
            && (p.in_list
                || commonmark
                || (gfm
                    && !rest
                        .trim_start_matches(is_whitespace)
                        .starts_with(|ch: char| ch.is_ascii_digit())))
        {
            break newline;
        }

        if !commonmark
            && (setext_heading(p, eat, rest, true)?
                || definition(p, eat, rest, true)?
                || footnote_definition(p, eat, rest, true)?)
        {
            break newline;
        }

        next = memchr::memchr(b'\n', &bytes[newline + 1..]).map(|found| newline + 1 + found);
        if let Some(following) = next {
            if is_blank(&value[newline..following]) {
                break newline;
            }
        }
    };

    let subvalue = &value[..end];
    if is_blank(subvalue) {
        if silent {
            return Ok(false);
        }
        eat.eat(p, subvalue)?;
        return Ok(true);
    }
    if silent {
        return Ok(true);
    }

    let now = eat.now(p);
    let subvalue = trim_trailing_lines(subvalue);
    let eaten = eat.eat(p, subvalue)?;
    let node = render::inline(p, Node::Paragraph, subvalue, now);
    eat.apply(p, &eaten, node);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_rows() {
        assert_eq!(
            alignment_row("| :-- | :-: | --: | --- |"),
            Some(vec![Align::Left, Align::Center, Align::Right, Align::None])
        );
        assert_eq!(alignment_row("--|--"), Some(vec![Align::None, Align::None]));
        assert_eq!(alignment_row("| -- |"), None);
        assert_eq!(alignment_row("| -x | -- |"), None);
    }

    #[test]
    fn labels_skip_escapes() {
        assert_eq!(label_end(r"a\]b]:", 0), Some(4));
        assert_eq!(label_end("abc", 0), None);
    }

    #[test]
    fn rules_follow_options() {
        let names = |options: &Options| -> Vec<&'static str> {
            rules(options).iter().map(|rule| rule.name).collect()
        };
        let default = names(&Options::default());
        assert_eq!(default.first(), Some(&"yamlFrontMatter"));
        assert!(default.contains(&"table"));
        assert!(!default.contains(&"footnote"));
        assert_eq!(default.last(), Some(&"paragraph"));

        let plain = names(&Options::default().gfm(false).yaml(false).footnotes(true));
        assert!(!plain.contains(&"fencedCode"));
        assert!(!plain.contains(&"table"));
        assert!(plain.contains(&"footnote"));
    }
}
