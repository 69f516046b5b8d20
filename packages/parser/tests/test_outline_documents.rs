//! # Outline documents
//!
//! Whole-document parsing plus the inline lexer driven through a typing
//! session the way the editor drives it.

use outline_parser::{looks_like_block, parse_blocks, parse_document, InlineTree, Node, TextEdit};
use serde_json::json;

const NOTES: &str = "# Inbox
* [ ] call [[Alice]] #work
* ship it

> remember

## Later
```
code
```";

#[test]
fn test_notes_document() {
    let doc = parse_document(NOTES);

    let expected = Node::document(vec![Node::section(
        "# ",
        "Inbox",
        vec![
            Node::list(vec![
                Node::ListItem {
                    marker: "* ".to_string(),
                    checked: Some(false),
                    children: vec![Node::paragraph("call [[Alice]] #work")],
                },
                Node::list_item("* ", vec![Node::paragraph("ship it")]),
            ]),
            Node::block_quote(vec![Node::paragraph("remember")]),
            Node::section(
                "## ",
                "Later",
                vec![Node::CodeBlock {
                    content: "```\ncode\n```".to_string(),
                }],
            ),
        ],
    )]);
    assert_eq!(doc, expected);
}

#[test]
fn test_json_shape() {
    let blocks = parse_blocks("- [x] done");
    let value = serde_json::to_value(&blocks).unwrap();

    assert_eq!(
        value,
        json!([{
            "type": "list",
            "children": [{
                "type": "list-item",
                "marker": "- ",
                "checked": true,
                "children": [{ "type": "paragraph", "content": "done" }]
            }]
        }])
    );
}

#[test]
fn test_text_edit_json() {
    let edit: TextEdit =
        serde_json::from_str(r#"{ "start": 0, "oldEnd": 0, "newEnd": 2, "newText": "* " }"#).unwrap();
    assert_eq!(edit, TextEdit::insert(0, "* "));
}

#[test]
fn test_block_prefixes_parse_to_structure() {
    for text in ["* a", "1. a", "> a", "# a", "```\na\n```"] {
        assert!(looks_like_block(text));
        assert_ne!(parse_blocks(text), vec![Node::paragraph(text)], "{text:?}");
    }
}

#[test]
fn test_typing_session_matches_full_lex() {
    let mut text = String::from("first line\nsecond");
    let mut tree = InlineTree::parse(&text);

    let mut edits: Vec<TextEdit> = Vec::new();
    // type a link and a tag at the end of the first line, one char at a time
    for (i, c) in " [[Bob]] #x".char_indices() {
        edits.push(TextEdit::insert(10 + i, c.to_string()));
    }
    edits.push(TextEdit::replace(0, 5, "1st"));
    edits.push(TextEdit::insert(0, "`code` "));
    edits.push(TextEdit::delete(4, 5));

    for edit in edits {
        tree.edit(&edit);
        text = edit.apply(&text).unwrap();
        tree.reparse(&text);

        assert!(!tree.is_stale());
        assert_eq!(tree.tokens(), InlineTree::parse(&text).tokens(), "after {edit:?} on {text:?}");
    }

    assert_eq!(text, "`cod` 1st line [[Bob]] #x\nsecond");
    assert_eq!(tree.links(&text), vec!["Bob"]);
    assert_eq!(tree.tags(&text), vec!["x"]);
}

#[test]
fn test_edit_joining_lines() {
    let mut text = String::from("a #one\n#two b");
    let mut tree = InlineTree::parse(&text);

    let edit = TextEdit::delete(6, 7);
    tree.edit(&edit);
    text = edit.apply(&text).unwrap();
    tree.reparse(&text);

    assert_eq!(text, "a #one#two b");
    assert_eq!(tree.tokens(), InlineTree::parse(&text).tokens());
    assert_eq!(tree.tags(&text), vec!["one", "two"]);
}
