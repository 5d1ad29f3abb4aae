//! Whole-tree properties that hold for any input

use marktree_core::{Node, Options, Parser, Point};
use pulldown_cmark::{Event, Options as MdOptions, Parser as MdParser, Tag};
use proptest::prelude::*;
use rstest::rstest;

const CORPUS: &[&str] = &[
    "# Hello\n",
    "*a **b** c*",
    "```js\nconsole.log(1)\n```\n",
    "[foo][bar]\n\n[bar]: https://example.com \"Title\"\n",
    "- a\n- b\n",
    "- a\n\n- b\n",
    "> a\n> b\n\n> c\nlazy",
    "1. one\n2. two\n\n   nested paragraph\n3. three",
    "| a | b |\n| :- | -: |\n| 1 | 2 |\n",
    "Setext\n======\n\nAnother\n---",
    "    code\n\n    more\nafter",
    "AT&amp;T &copy 2024 &#x1F600; &#;",
    "see https://example.com, <foo@bar.com> and ![img](a.png \"t\")",
    "a  \nb\\\nc",
    "<div>\nblock\n</div>\n\ntext <em>inline</em>",
    "---\nkey: value\n---\n\n# Title",
    "* * *\n\n_a_ __b__ ~~c~~ `d`",
    "> - a\n>   b\n> - c",
    "\u{feff}é *ü* 日本語 **強調**\r\nnext line\r\n",
];

fn parse(options: Options, input: &str) -> Node {
    Parser::new(options).parse(input).unwrap()
}

fn leaves<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    match node.children() {
        Some(children) if !children.is_empty() => {
            for child in children {
                leaves(child, out);
            }
        }
        _ => out.push(node),
    }
}

fn check_nesting(node: &Node) {
    let Some(position) = node.position() else {
        panic!("missing position on {:?}", node);
    };
    assert!(position.start.offset <= position.end.offset, "{:?}", node);

    for child in node.children().unwrap_or_default() {
        let inner = child.position().unwrap();
        assert!(
            inner.start.offset >= position.start.offset && inner.end.offset <= position.end.offset,
            "{:?} escapes {:?}",
            child,
            node.kind()
        );
        check_nesting(child);
    }
}

fn check_merged(node: &Node, commonmark: bool) {
    let children = node.children().unwrap_or_default();
    for pair in children.windows(2) {
        let kinds = (pair[0].kind(), pair[1].kind());
        assert_ne!(kinds, ("text", "text"), "adjacent text in {:?}", node);
        if !commonmark {
            assert_ne!(kinds, ("blockquote", "blockquote"), "adjacent quotes");
        }
    }
    for child in children {
        check_merged(child, commonmark);
    }
}

#[rstest]
fn test_parsing_is_deterministic(#[values(0, 1, 2, 3, 4, 5, 6, 7, 8, 9)] index: usize) {
    let input = CORPUS[index];
    let first = parse(Options::default(), input);

    let mut reused = Parser::default();
    reused.parse("> unrelated\n\n- state\n\n| a | b |\n| - | - |").unwrap();
    let second = reused.parse(input).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_adjacent_nodes_are_merged() {
    for commonmark in [false, true] {
        for input in CORPUS {
            let root = parse(Options::default().commonmark(commonmark), input);
            check_merged(&root, commonmark);
        }
    }
}

#[test]
fn test_children_nest_within_parents() {
    for input in CORPUS {
        check_nesting(&parse(Options::default(), input));
    }
}

#[test]
fn test_leaves_appear_in_source_order() {
    for input in CORPUS {
        let root = parse(Options::default(), input);
        let mut found = Vec::new();
        leaves(&root, &mut found);

        let mut last = Point::start();
        for leaf in found {
            let position = leaf.position().unwrap();
            assert!(
                position.start.offset >= last.offset,
                "{:?} starts before {:?} in {:?}",
                leaf,
                last,
                input
            );
            last = position.end;
        }
    }
}

#[test]
fn test_root_spans_the_whole_document() {
    for input in CORPUS {
        let root = parse(Options::default(), input);
        let normalized = input.replace("\r\n", "\n");
        let end = root.position().unwrap().end;
        assert_eq!(end.offset, normalized.chars().count(), "{:?}", input);
    }
}

#[rstest]
#[case("[")]
#[case("![")]
#[case("<")]
#[case("<a")]
#[case("`")]
#[case("``")]
#[case("*")]
#[case("**")]
#[case("~~")]
#[case("\\")]
#[case("&")]
#[case("&#")]
#[case("- ")]
#[case("1.")]
#[case("> ")]
#[case("|")]
#[case("a | b")]
#[case("> a | b")]
#[case("| a |")]
#[case("x\n\na|b")]
#[case("---")]
#[case("```")]
#[case("    ")]
#[case("\t")]
#[case("[^")]
#[case("[a]:")]
#[case("\n\n\n")]
#[case("-\tfoo")]
#[case("> > > > deep")]
#[case("[a](<b")]
#[case("[a](b \"c)")]
#[case("<!-- open")]
fn test_malformed_input_never_fails(#[case] input: &str) {
    for options in [
        Options::default(),
        Options::default().commonmark(true),
        Options::default().pedantic(true).footnotes(true),
        Options::default().gfm(false),
    ] {
        let mut parser = Parser::new(options);
        let result = parser.parse_with_recovery(input);
        assert!(!result.has_fatal_errors(), "{:?}: {:?}", input, result.messages);
        check_nesting(&result.root);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Counts {
    headings: usize,
    code_blocks: usize,
    lists: usize,
    list_items: usize,
    tables: usize,
    block_quotes: usize,
}

fn count_marktree(input: &str) -> Counts {
    let mut counts = Counts::default();
    parse(Options::default().yaml(false), input).walk(&mut |node| match node {
        Node::Heading(_) => counts.headings += 1,
        Node::Code(_) => counts.code_blocks += 1,
        Node::List(_) => counts.lists += 1,
        Node::ListItem(_) => counts.list_items += 1,
        Node::Table(_) => counts.tables += 1,
        Node::Blockquote(_) => counts.block_quotes += 1,
        _ => {}
    });
    counts
}

fn count_pulldown(input: &str) -> Counts {
    let mut counts = Counts::default();
    for event in MdParser::new_ext(input, MdOptions::ENABLE_TABLES) {
        match event {
            Event::Start(Tag::Heading { .. }) => counts.headings += 1,
            Event::Start(Tag::CodeBlock(_)) => counts.code_blocks += 1,
            Event::Start(Tag::List(_)) => counts.lists += 1,
            Event::Start(Tag::Item) => counts.list_items += 1,
            Event::Start(Tag::Table(_)) => counts.tables += 1,
            Event::Start(Tag::BlockQuote) => counts.block_quotes += 1,
            _ => {}
        }
    }
    counts
}

#[rstest]
#[case("# One\n\n## Two\n\nText\n")]
#[case("- a\n- b\n- c\n")]
#[case("1. a\n2. b\n")]
#[case("```\ncode\n```\n\n    indented\n")]
#[case("| a | b |\n| - | - |\n| 1 | 2 |\n")]
#[case("> quote\n> more\n")]
#[case("Title\n=====\n\nBody\n\n---\n")]
fn test_block_structure_agrees_with_pulldown_cmark(#[case] input: &str) {
    assert_eq!(count_marktree(input), count_pulldown(input));
}

fn dialects() -> [Options; 5] {
    [
        Options::default(),
        Options::default().commonmark(true),
        Options::default().pedantic(true),
        Options::default().gfm(false).footnotes(true),
        Options::default().footnotes(true).breaks(true),
    ]
}

/// Short documents over the characters that drive block and inline markup.
const MARKUP: &str = "[a-c1 |>*_`#:!<&;~.()\\[\\]\\\\\t\n-]{0,48}";

proptest! {
    #[test]
    fn test_generated_markup_never_fails(input in MARKUP) {
        for options in dialects() {
            let result = Parser::new(options).parse_with_recovery(&input);
            prop_assert!(
                !result.has_fatal_errors(),
                "{:?} with {:?}: {:?}",
                input,
                options,
                result.messages
            );
        }
    }

    #[test]
    fn test_generated_pipe_rows_never_fail(
        rows in prop::collection::vec("[a |:-]{0,8}", 1..5),
        trailing in any::<bool>(),
    ) {
        let mut input = rows.join("\n");
        if trailing {
            input.push('\n');
        }
        for options in dialects() {
            let result = Parser::new(options).parse_with_recovery(&input);
            prop_assert!(!result.has_fatal_errors(), "{:?}: {:?}", input, result.messages);
        }
    }
}
