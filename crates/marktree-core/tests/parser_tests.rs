//! Integration tests for the markdown parser

use marktree_core::ast::{Code, Heading, Link, List, ListItem, Literal, Table};
use marktree_core::{Align, ConfigError, Node, Options, Parser, ReferenceType};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};

fn parse(input: &str) -> Node {
    parse_with(Options::default(), input)
}

fn parse_with(options: Options, input: &str) -> Node {
    let mut parser = Parser::new(options);
    parser.parse(input).unwrap()
}

/// The tree as mdast JSON, without positions.
fn tree(options: Options, input: &str) -> Value {
    let root = parse_with(options.position(false), input);
    serde_json::to_value(&root).unwrap()
}

fn blocks(root: &Node) -> &[Node] {
    root.children().unwrap()
}

fn first(root: &Node) -> &Node {
    &blocks(root)[0]
}

fn kinds(nodes: &[Node]) -> Vec<&'static str> {
    nodes.iter().map(Node::kind).collect()
}

// ============================================================================
// Headings
// ============================================================================

#[rstest]
#[case("# a", 1)]
#[case("## a", 2)]
#[case("### a", 3)]
#[case("#### a", 4)]
#[case("##### a", 5)]
#[case("###### a", 6)]
fn test_atx_heading_levels(#[case] input: &str, #[case] depth: u8) {
    let root = parse(input);
    match first(&root) {
        Node::Heading(Heading { depth: found, .. }) => assert_eq!(*found, depth),
        other => panic!("expected heading, got {:?}", other),
    }
    assert_eq!(first(&root).text_content(), "a");
}

#[test]
fn test_atx_heading_closing_sequence() {
    let root = parse("## Foo ##");
    assert_eq!(first(&root).kind(), "heading");
    assert_eq!(first(&root).text_content(), "Foo");
}

#[test]
fn test_atx_heading_needs_space() {
    let root = parse("#5 bolt");
    assert_eq!(first(&root).kind(), "paragraph");
    assert_eq!(first(&root).text_content(), "#5 bolt");
}

#[test]
fn test_atx_heading_too_deep() {
    let root = parse("####### a");
    assert_eq!(first(&root).kind(), "paragraph");
    assert_eq!(first(&root).text_content(), "####### a");
}

#[test]
fn test_pedantic_caps_heading_depth() {
    let root = parse_with(Options::default().pedantic(true), "####### a");
    match first(&root) {
        Node::Heading(heading) => assert_eq!(heading.depth, 6),
        other => panic!("expected heading, got {:?}", other),
    }
}

#[rstest]
#[case("Foo\n===", 1)]
#[case("Bar\n---", 2)]
fn test_setext_heading(#[case] input: &str, #[case] depth: u8) {
    let root = parse(input);
    assert_eq!(blocks(&root).len(), 1);
    match first(&root) {
        Node::Heading(heading) => assert_eq!(heading.depth, depth),
        other => panic!("expected heading, got {:?}", other),
    }
}

#[test]
fn test_heading_tree() {
    assert_eq!(
        tree(Options::default(), "# Hello\n"),
        json!({
            "type": "root",
            "children": [{
                "type": "heading",
                "depth": 1,
                "children": [{"type": "text", "value": "Hello"}]
            }]
        })
    );
}

// ============================================================================
// Thematic Breaks
// ============================================================================

#[rstest]
#[case("***")]
#[case("- - -")]
#[case("___")]
#[case("  * * * *")]
fn test_thematic_break(#[case] input: &str) {
    let root = parse(input);
    assert_eq!(kinds(blocks(&root)), vec!["thematicBreak"]);
}

#[test]
fn test_two_markers_are_not_a_break() {
    let root = parse("**");
    assert_eq!(first(&root).kind(), "paragraph");
    assert_eq!(first(&root).text_content(), "**");
}

// ============================================================================
// Code
// ============================================================================

#[test]
fn test_indented_code() {
    let root = parse("    foo\n    bar");
    assert_eq!(
        first(&root),
        &Node::Code(Code {
            lang: None,
            value: "foo\nbar".to_string(),
            position: first(&root).position().cloned(),
        })
    );
}

#[test]
fn test_indented_code_keeps_inner_blank_lines() {
    let root = parse("    foo\n\n    bar\n\n");
    assert_eq!(first(&root).value(), Some("foo\n\nbar"));
}

#[test]
fn test_fenced_code() {
    assert_eq!(
        tree(Options::default(), "```js\nconsole.log(1)\n```\n"),
        json!({
            "type": "root",
            "children": [{"type": "code", "lang": "js", "value": "console.log(1)"}]
        })
    );
}

#[test]
fn test_fenced_code_unclosed() {
    let root = parse("~~~\nabc");
    match first(&root) {
        Node::Code(code) => {
            assert_eq!(code.lang, None);
            assert_eq!(code.value, "abc");
        }
        other => panic!("expected code, got {:?}", other),
    }
}

#[test]
fn test_fenced_code_is_exdented() {
    let root = parse("  ```\n  a\n    b\n  ```");
    assert_eq!(first(&root).value(), Some("a\n  b"));
}

#[test]
fn test_fenced_code_requires_gfm() {
    let root = parse_with(Options::default().gfm(false), "```js\nx\n```");
    assert_eq!(first(&root).kind(), "paragraph");
}

// ============================================================================
// Blockquotes
// ============================================================================

#[test]
fn test_blockquote() {
    assert_eq!(
        tree(Options::default(), "> a\n> b"),
        json!({
            "type": "root",
            "children": [{
                "type": "blockquote",
                "children": [{
                    "type": "paragraph",
                    "children": [{"type": "text", "value": "a\nb"}]
                }]
            }]
        })
    );
}

#[test]
fn test_blockquote_lazy_line() {
    let root = parse("> a\nb");
    assert_eq!(kinds(blocks(&root)), vec!["blockquote"]);
    assert_eq!(first(&root).text_content(), "a\nb");
}

#[test]
fn test_adjacent_blockquotes_merge() {
    let root = parse("> a\n\n> b");
    assert_eq!(kinds(blocks(&root)), vec!["blockquote"]);
    assert_eq!(
        kinds(first(&root).children().unwrap()),
        vec!["paragraph", "paragraph"]
    );
}

#[test]
fn test_commonmark_keeps_blockquotes_apart() {
    let root = parse_with(Options::default().commonmark(true), "> a\n\n> b");
    assert_eq!(kinds(blocks(&root)), vec!["blockquote", "blockquote"]);
}

#[test]
fn test_nested_blockquotes() {
    let root = parse("> > a");
    let outer = first(&root);
    assert_eq!(outer.kind(), "blockquote");
    assert_eq!(outer.children().unwrap()[0].kind(), "blockquote");
    assert_eq!(outer.text_content(), "a");
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_tight_list() {
    let root = parse("- a\n- b\n");
    match first(&root) {
        Node::List(List {
            ordered,
            start,
            loose,
            children,
            ..
        }) => {
            assert!(!ordered);
            assert_eq!(*start, None);
            assert!(!loose);
            assert_eq!(children.len(), 2);
            for item in children {
                assert!(matches!(item, Node::ListItem(ListItem { loose: false, .. })));
            }
        }
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn test_loose_list() {
    let root = parse("- a\n\n- b\n");
    match first(&root) {
        Node::List(list) => {
            assert!(list.loose);
            assert_eq!(list.children.len(), 2);
            assert!(matches!(&list.children[0], Node::ListItem(ListItem { loose: true, .. })));
        }
        other => panic!("expected list, got {:?}", other),
    }
}

#[rstest]
#[case("1. one\n2. two", Some(1))]
#[case("3. a\n4. b", Some(3))]
fn test_ordered_list(#[case] input: &str, #[case] expected: Option<u64>) {
    let root = parse(input);
    match first(&root) {
        Node::List(list) => {
            assert!(list.ordered);
            assert_eq!(list.start, expected);
            assert_eq!(list.children.len(), 2);
        }
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn test_list_item_content() {
    let root = parse("1. one\n2. two");
    let list = first(&root);
    let item = &list.children().unwrap()[0];
    assert_eq!(kinds(item.children().unwrap()), vec!["paragraph"]);
    assert_eq!(item.text_content(), "one");
}

#[test]
fn test_task_list_items() {
    let root = parse("- [x] done\n- [ ] todo");
    let items = first(&root).children().unwrap();
    let checked: Vec<_> = items
        .iter()
        .map(|item| match item {
            Node::ListItem(item) => item.checked,
            _ => None,
        })
        .collect();
    assert_eq!(checked, vec![Some(true), Some(false)]);
    assert_eq!(items[0].text_content(), "done");
}

#[test]
fn test_task_items_need_gfm() {
    let root = parse_with(Options::default().gfm(false), "- [x] done");
    let item = &first(&root).children().unwrap()[0];
    assert!(matches!(item, Node::ListItem(ListItem { checked: None, .. })));
}

#[test]
fn test_empty_list_item() {
    let root = parse("- ");
    let item = &first(&root).children().unwrap()[0];
    assert_eq!(item.children().map(<[Node]>::len), Some(0));
}

// ============================================================================
// HTML
// ============================================================================

#[test]
fn test_block_html() {
    let root = parse("<div>\nhi\n</div>");
    assert_eq!(
        first(&root),
        &Node::Html(Literal {
            value: "<div>\nhi\n</div>".to_string(),
            position: first(&root).position().cloned(),
        })
    );
}

#[test]
fn test_block_html_stops_at_blank_line() {
    let root = parse("<!-- note -->\n\nafter");
    assert_eq!(kinds(blocks(&root)), vec!["html", "paragraph"]);
    assert_eq!(first(&root).value(), Some("<!-- note -->"));
}

#[test]
fn test_inline_html() {
    let root = parse("a <span>b</span>");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["text", "html", "text", "html"]);
    assert_eq!(inline[1].value(), Some("<span>"));
}

#[test]
fn test_raw_anchor_suppresses_links_inside() {
    let root = parse("<a href=\"x\">[b](c)</a>");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["html", "text", "html"]);
    assert_eq!(inline[1].value(), Some("[b](c)"));
}

#[test]
fn test_unclosed_raw_anchor_ends_with_its_paragraph() {
    let root = parse("<a href=\"x\">open\n\n[b](c)\n\n# [d](e)\n");
    let blocks = blocks(&root);
    assert_eq!(kinds(blocks), vec!["paragraph", "paragraph", "heading"]);
    assert_eq!(kinds(blocks[1].children().unwrap()), vec!["link"]);
    assert_eq!(kinds(blocks[2].children().unwrap()), vec!["link"]);
}

// ============================================================================
// Definitions and References
// ============================================================================

#[test]
fn test_reference_and_definition() {
    assert_eq!(
        tree(
            Options::default(),
            "[foo][Bar]\n\n[bar]: https://example.com \"Title\"\n"
        ),
        json!({
            "type": "root",
            "children": [
                {
                    "type": "paragraph",
                    "children": [{
                        "type": "linkReference",
                        "identifier": "bar",
                        "referenceType": "full",
                        "children": [{"type": "text", "value": "foo"}]
                    }]
                },
                {
                    "type": "definition",
                    "identifier": "bar",
                    "url": "https://example.com",
                    "title": "Title"
                }
            ]
        })
    );
}

#[rstest]
#[case("[a][]", ReferenceType::Collapsed, "a")]
#[case("[a]", ReferenceType::Shortcut, "a")]
#[case("[a][B c]", ReferenceType::Full, "b c")]
fn test_reference_types(
    #[case] input: &str,
    #[case] expected: ReferenceType,
    #[case] identifier: &str,
) {
    let root = parse(input);
    match &first(&root).children().unwrap()[0] {
        Node::LinkReference(reference) => {
            assert_eq!(reference.reference_type, expected);
            assert_eq!(reference.identifier, identifier);
        }
        other => panic!("expected linkReference, got {:?}", other),
    }
}

#[test]
fn test_image_reference() {
    let root = parse("![b][c]");
    match &first(&root).children().unwrap()[0] {
        Node::ImageReference(reference) => {
            assert_eq!(reference.identifier, "c");
            assert_eq!(reference.alt.as_deref(), Some("b"));
            assert_eq!(reference.reference_type, ReferenceType::Full);
        }
        other => panic!("expected imageReference, got {:?}", other),
    }
}

#[test]
fn test_definition_with_angle_url() {
    let root = parse("[x]: <a b>");
    match first(&root) {
        Node::Definition(definition) => {
            assert_eq!(definition.url, "a b");
            assert_eq!(definition.title, None);
        }
        other => panic!("expected definition, got {:?}", other),
    }
}

#[test]
fn test_definition_not_inside_blockquote() {
    let root = parse("> [x]: y");
    let inner = first(&root).children().unwrap();
    assert_eq!(kinds(inner), vec!["paragraph"]);
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn test_table() {
    let root = parse("| a | b |\n| :- | -: |\n| 1 | 2 |");
    match first(&root) {
        Node::Table(Table { align, children, .. }) => {
            assert_eq!(align, &vec![Align::Left, Align::Right]);
            assert_eq!(kinds(children), vec!["tableRow", "tableRow"]);
            let cells: Vec<_> = children[1]
                .children()
                .unwrap()
                .iter()
                .map(Node::text_content)
                .collect();
            assert_eq!(cells, vec!["1", "2"]);
        }
        other => panic!("expected table, got {:?}", other),
    }
}

#[test]
fn test_table_alignment_serializes_null() {
    let value = tree(Options::default(), "a | b\n--|:-:\nc | d");
    assert_eq!(value["children"][0]["align"], json!([null, "center"]));
}

#[test]
fn test_table_requires_gfm() {
    let root = parse_with(Options::default().gfm(false), "| a | b |\n| - | - |");
    assert_eq!(first(&root).kind(), "paragraph");
}

#[rstest]
#[case("a | b", &["paragraph"], "a | b")]
#[case("a | b\n", &["paragraph"], "a | b")]
#[case("| a |", &["paragraph"], "| a |")]
#[case("x\n\na|b", &["paragraph", "paragraph"], "a|b")]
#[case("> a | b", &["blockquote"], "a | b")]
#[case("a | b\nc | d", &["paragraph"], "a | b\nc | d")]
fn test_pipe_lines_without_alignment_row(
    #[case] input: &str,
    #[case] expected: &[&str],
    #[case] text: &str,
) {
    let root = parse(input);
    let blocks = blocks(&root);
    assert_eq!(kinds(blocks), expected);
    assert_eq!(blocks[blocks.len() - 1].text_content(), text);
}

// ============================================================================
// Front Matter and Footnotes
// ============================================================================

#[test]
fn test_yaml_front_matter() {
    let root = parse("---\ntitle: x\n---\n# h");
    assert_eq!(kinds(blocks(&root)), vec!["yaml", "heading"]);
    assert_eq!(first(&root).value(), Some("title: x"));
}

#[test]
fn test_yaml_only_at_start() {
    let root = parse("a\n\n---\nb: c\n---");
    assert!(!kinds(blocks(&root)).contains(&"yaml"));
}

#[test]
fn test_yaml_disabled() {
    let root = parse_with(Options::default().yaml(false), "---\ntitle: x\n---");
    assert!(!kinds(blocks(&root)).contains(&"yaml"));
}

#[test]
fn test_footnotes() {
    let root = parse_with(
        Options::default().footnotes(true),
        "Hi[^1].\n\n[^1]: Note.",
    );
    assert_eq!(kinds(blocks(&root)), vec!["paragraph", "footnoteDefinition"]);

    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["text", "footnoteReference", "text"]);
    match &blocks(&root)[1] {
        Node::FootnoteDefinition(definition) => {
            assert_eq!(definition.identifier, "1");
            assert_eq!(kinds(&definition.children), vec!["paragraph"]);
        }
        other => panic!("expected footnoteDefinition, got {:?}", other),
    }
}

#[test]
fn test_inline_footnote() {
    let root = parse_with(Options::default().footnotes(true), "a[^b c]");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["text", "footnote"]);
    assert_eq!(inline[1].text_content(), "b c");
}

#[test]
fn test_footnotes_disabled() {
    let root = parse("[^1]: Note.");
    assert!(!kinds(blocks(&root)).contains(&"footnoteDefinition"));
}

// ============================================================================
// Inline Content
// ============================================================================

#[test]
fn test_nested_emphasis() {
    assert_eq!(
        tree(Options::default(), "*a **b** c*"),
        json!({
            "type": "root",
            "children": [{
                "type": "paragraph",
                "children": [{
                    "type": "emphasis",
                    "children": [
                        {"type": "text", "value": "a "},
                        {"type": "strong", "children": [{"type": "text", "value": "b"}]},
                        {"type": "text", "value": " c"}
                    ]
                }]
            }]
        })
    );
}

#[test]
fn test_intraword_underscore() {
    let root = parse("_foo_bar_");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["emphasis"]);
    assert_eq!(inline[0].text_content(), "foo_bar");
}

#[rstest]
#[case("`a`", "a")]
#[case("`` a ` b ``", "a ` b")]
fn test_inline_code(#[case] input: &str, #[case] expected: &str) {
    let root = parse(input);
    let code = &first(&root).children().unwrap()[0];
    assert_eq!(code.kind(), "inlineCode");
    assert_eq!(code.value(), Some(expected));
}

#[test]
fn test_deletion() {
    let root = parse("~~gone~~");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["delete"]);
    assert_eq!(inline[0].text_content(), "gone");

    let root = parse_with(Options::default().gfm(false), "~~gone~~");
    assert_eq!(kinds(first(&root).children().unwrap()), vec!["text"]);
}

#[test]
fn test_inline_link() {
    let root = parse("[a](http://x.com \"T\")");
    match &first(&root).children().unwrap()[0] {
        Node::Link(Link {
            url,
            title,
            children,
            ..
        }) => {
            assert_eq!(url, "http://x.com");
            assert_eq!(title.as_deref(), Some("T"));
            assert_eq!(kinds(children), vec!["text"]);
        }
        other => panic!("expected link, got {:?}", other),
    }
}

#[test]
fn test_image() {
    let value = tree(Options::default(), "![alt](i.png)");
    assert_eq!(
        value["children"][0]["children"][0],
        json!({"type": "image", "url": "i.png", "title": null, "alt": "alt"})
    );
}

#[rstest]
#[case("<https://a.b>", "https://a.b", "https://a.b")]
#[case("<foo@bar.com>", "mailto:foo@bar.com", "foo@bar.com")]
#[case("<mailto:foo@bar.com>", "mailto:foo@bar.com", "foo@bar.com")]
fn test_autolinks(#[case] input: &str, #[case] url: &str, #[case] text: &str) {
    let root = parse(input);
    let link = &first(&root).children().unwrap()[0];
    match link {
        Node::Link(link) => assert_eq!(link.url, url),
        other => panic!("expected link, got {:?}", other),
    }
    assert_eq!(link.text_content(), text);
}

#[test]
fn test_bare_url() {
    let root = parse("see https://example.com.");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["text", "link", "text"]);
    assert_eq!(inline[1].text_content(), "https://example.com");
    assert_eq!(inline[2].value(), Some("."));
}

#[test]
fn test_bare_url_needs_gfm() {
    let root = parse_with(Options::default().gfm(false), "see https://example.com");
    assert_eq!(kinds(first(&root).children().unwrap()), vec!["text"]);
}

#[test]
fn test_hard_break() {
    let root = parse("a  \nb");
    assert_eq!(
        kinds(first(&root).children().unwrap()),
        vec!["text", "break", "text"]
    );
}

#[test]
fn test_soft_break_stays_text() {
    let root = parse("a\nb");
    assert_eq!(kinds(first(&root).children().unwrap()), vec!["text"]);

    let root = parse_with(Options::default().breaks(true), "a\nb");
    assert_eq!(
        kinds(first(&root).children().unwrap()),
        vec!["text", "break", "text"]
    );
}

#[test]
fn test_escapes() {
    let root = parse("\\*a\\*");
    let inline = first(&root).children().unwrap();
    assert_eq!(kinds(inline), vec!["text"]);
    assert_eq!(inline[0].value(), Some("*a*"));
}

#[test]
fn test_character_references() {
    let root = parse("AT&amp;T &copy; &#169; &#xA9;");
    assert_eq!(first(&root).text_content(), "AT&T © © ©");
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_options_from_json() {
    let options = Options::from_json(&json!({"commonmark": true, "gfm": null})).unwrap();
    assert!(options.commonmark);
    assert!(options.gfm);

    assert_eq!(Options::from_json(&Value::Null).unwrap(), Options::default());
}

#[rstest]
#[case(json!({"gfm": "yes"}), ConfigError::InvalidSetting { key: "gfm".into(), value: "\"yes\"".into() })]
#[case(json!({"html": true}), ConfigError::UnknownSetting("html".into()))]
#[case(json!([1]), ConfigError::InvalidOptions("[1]".into()))]
fn test_invalid_options(#[case] value: Value, #[case] expected: ConfigError) {
    assert_eq!(Options::from_json(&value).unwrap_err(), expected);
    assert!(Parser::from_json(&value).is_err());
}

#[test]
fn test_position_option() {
    let root = parse_with(Options::default().position(false), "# a\n\n- b");
    root.walk(&mut |node| assert!(node.position().is_none(), "{:?}", node));
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_parse_empty_input() {
    let root = parse("");
    assert_eq!(blocks(&root).len(), 0);
}

#[test]
fn test_parse_whitespace_only() {
    let root = parse("   \n\n   \n");
    assert_eq!(blocks(&root).len(), 0);
}

#[test]
fn test_crlf_line_endings() {
    assert_eq!(
        tree(Options::default(), "# a\r\n\r\nb\r\n"),
        tree(Options::default(), "# a\n\nb\n")
    );
}

#[test]
fn test_paragraph_interrupted_by_heading() {
    let root = parse("a\n# b");
    assert_eq!(kinds(blocks(&root)), vec!["paragraph", "heading"]);
}

#[test]
fn test_complex_document() {
    let input = r#"---
title: Test Document
---

# Introduction

This is a **complex** document with *multiple* features.

- First item
- Second item

> A quote

```rust
fn main() {}
```

| a | b |
| - | - |
| 1 | 2 |

[link]: https://example.com
"#;
    let root = parse(input);
    assert_eq!(
        kinds(blocks(&root)),
        vec![
            "yaml",
            "heading",
            "paragraph",
            "list",
            "blockquote",
            "code",
            "table",
            "definition"
        ]
    );
}
