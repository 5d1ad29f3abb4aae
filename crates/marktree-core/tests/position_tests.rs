//! Source positions attached to parsed nodes

use marktree_core::{Node, Options, Parser, Point, Position};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn parse(input: &str) -> Node {
    Parser::default().parse(input).unwrap()
}

fn child<'a>(node: &'a Node, path: &[usize]) -> &'a Node {
    path.iter()
        .fold(node, |node, &index| &node.children().unwrap()[index])
}

fn span(node: &Node) -> (Point, Point) {
    let position = node.position().unwrap();
    (position.start, position.end)
}

#[test]
fn test_heading_positions() {
    let root = parse("# Hello\n");
    assert_eq!(
        serde_json::to_value(&root).unwrap(),
        json!({
            "type": "root",
            "children": [{
                "type": "heading",
                "depth": 1,
                "children": [{
                    "type": "text",
                    "value": "Hello",
                    "position": {
                        "start": {"line": 1, "column": 3, "offset": 2},
                        "end": {"line": 1, "column": 8, "offset": 7}
                    }
                }],
                "position": {
                    "start": {"line": 1, "column": 1, "offset": 0},
                    "end": {"line": 1, "column": 8, "offset": 7}
                }
            }],
            "position": {
                "start": {"line": 1, "column": 1, "offset": 0},
                "end": {"line": 2, "column": 1, "offset": 8}
            }
        })
    );
}

#[test]
fn test_inline_positions() {
    let root = parse("*a **b** c*");
    let emphasis = child(&root, &[0, 0]);
    assert_eq!(span(emphasis), (Point::new(1, 1, 0), Point::new(1, 12, 11)));

    let strong = child(emphasis, &[1]);
    assert_eq!(span(strong), (Point::new(1, 4, 3), Point::new(1, 9, 8)));
    assert_eq!(
        span(child(strong, &[0])),
        (Point::new(1, 6, 5), Point::new(1, 7, 6))
    );
    assert_eq!(
        span(child(emphasis, &[2])),
        (Point::new(1, 9, 8), Point::new(1, 11, 10))
    );
}

#[test]
fn test_blockquote_content_is_offset() {
    let root = parse("> a\n> b");
    let quote = child(&root, &[0]);
    assert_eq!(span(quote), (Point::new(1, 1, 0), Point::new(2, 4, 7)));

    let paragraph = child(quote, &[0]);
    assert_eq!(
        paragraph.position(),
        Some(&Position {
            start: Point::new(1, 3, 2),
            end: Point::new(2, 4, 7),
            indent: vec![3],
        })
    );
    assert_eq!(
        span(child(paragraph, &[0])),
        (Point::new(1, 3, 2), Point::new(2, 4, 7))
    );
}

#[test]
fn test_list_item_content_is_offset() {
    let root = parse("- a\n- b");
    let list = child(&root, &[0]);
    assert_eq!(span(list), (Point::new(1, 1, 0), Point::new(2, 4, 7)));

    assert_eq!(
        span(child(list, &[0, 0, 0])),
        (Point::new(1, 3, 2), Point::new(1, 4, 3))
    );
    assert_eq!(
        span(child(list, &[1, 0, 0])),
        (Point::new(2, 3, 6), Point::new(2, 4, 7))
    );
}

#[test]
fn test_table_cell_positions() {
    let root = parse("| a | b |\n| - | - |\n| c | d |");
    let cell = child(&root, &[0, 1, 0]);
    assert_eq!(cell.text_content(), "c");
    assert_eq!(span(cell), (Point::new(3, 3, 22), Point::new(3, 4, 23)));
}

#[test]
fn test_offsets_count_characters() {
    let root = parse("é *a*");
    let paragraph = child(&root, &[0]);
    assert_eq!(
        span(child(paragraph, &[0])),
        (Point::new(1, 1, 0), Point::new(1, 3, 2))
    );
    assert_eq!(
        span(child(paragraph, &[1])),
        (Point::new(1, 3, 2), Point::new(1, 6, 5))
    );
}

#[test]
fn test_byte_order_mark_is_skipped() {
    let root = parse("\u{feff}# a");
    assert_eq!(span(&root), (Point::new(1, 1, 0), Point::new(1, 5, 4)));
    assert_eq!(
        span(child(&root, &[0])),
        (Point::new(1, 2, 1), Point::new(1, 5, 4))
    );
}

#[rstest]
#[case("a &#; b", Point::new(1, 3, 2))]
#[case("> &#;", Point::new(1, 3, 2))]
#[case("x\n\n- y &#;", Point::new(3, 5, 7))]
fn test_warning_positions(#[case] input: &str, #[case] expected: Point) {
    let mut parser = Parser::default();
    let result = parser.parse_with_recovery(input);
    assert!(!result.has_fatal_errors());

    let warnings: Vec<_> = result.messages.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].position, Some(expected));
    assert_eq!(
        warnings[0].message,
        "Numeric character references cannot be empty"
    );
}

#[test]
fn test_positions_can_be_disabled() {
    let mut parser = Parser::new(Options::default().position(false));
    let root = parser.parse("# a\n\n> b").unwrap();
    let json = serde_json::to_string(&root).unwrap();
    assert!(!json.contains("position"));
}
