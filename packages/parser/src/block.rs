//! Line-oriented block grammar.
//!
//! Produces raw [`Node`] values from markdown text. [`parse_blocks`] returns
//! top-level blocks with sections left flat (the editor's normalizer nests
//! them), [`parse_document`] nests sections by heading depth.

use crate::ast::Node;
use regex::Regex;
use std::sync::LazyLock;

static BLOCK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ {0,3}(?:[*+-][ \t]|\d{1,9}[.)][ \t]|>|#{1,6}[ \t]|`{3,}|~{3,}|-{3,}|\*{3,}|_{3,})")
        .expect("block prefix pattern")
});

static ATX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t]*$").expect("atx pattern"));

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("fence pattern"));

static THEMATIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").expect("thematic pattern")
});

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^( {0,3})([*+-]|\d{1,9}[.)])(?:[ \t]+|$)").expect("list item pattern")
});

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([ xX])\](?:[ \t]+|$)").expect("checkbox pattern"));

static QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}> ?").expect("quote pattern"));

/// True when some line of `text` starts with block syntax: a list marker, a
/// quote marker, an ATX heading marker, a code fence or a thematic break.
pub fn looks_like_block(text: &str) -> bool {
    BLOCK_PREFIX.is_match(text)
}

/// Parses text into top-level blocks without nesting sections
pub fn parse_blocks(text: &str) -> Vec<Node> {
    let lines: Vec<&str> = text.split('\n').collect();
    BlockParser::new(&lines, Context::Top).parse()
}

/// Parses text found inside a list item or quote, where headings cannot
/// own blocks and stay [`Node::Heading`]
pub fn parse_inner_blocks(text: &str) -> Vec<Node> {
    let lines: Vec<&str> = text.split('\n').collect();
    BlockParser::new(&lines, Context::Nested).parse()
}

/// Parses a whole document, nesting sections by heading depth
pub fn parse_document(text: &str) -> Node {
    Node::Document {
        children: nest_sections(parse_blocks(text)),
    }
}

/// Moves every block following a section into it and nests deeper sections
/// under shallower ones.
pub fn nest_sections(blocks: Vec<Node>) -> Vec<Node> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<Node> = Vec::new();

    fn close(stack: &mut Vec<Node>, roots: &mut Vec<Node>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut().and_then(Node::children_mut) {
                Some(children) => children.push(done),
                None => roots.push(done),
            }
        }
    }

    for block in blocks {
        if let Some(depth) = block.depth().filter(|_| matches!(block, Node::Section { .. })) {
            while stack
                .last()
                .and_then(Node::depth)
                .is_some_and(|top| top >= depth)
            {
                close(&mut stack, &mut roots);
            }
            stack.push(block);
        } else {
            match stack.last_mut().and_then(Node::children_mut) {
                Some(children) => children.push(block),
                None => roots.push(block),
            }
        }
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Document level, headings become sections
    Top,
    /// Inside list items and quotes, headings stay headings
    Nested,
}

struct BlockParser<'a, 'src> {
    lines: &'a [&'src str],
    pos: usize,
    context: Context,
}

impl<'a, 'src> BlockParser<'a, 'src> {
    fn new(lines: &'a [&'src str], context: Context) -> Self {
        Self {
            lines,
            pos: 0,
            context,
        }
    }

    fn parse(&mut self) -> Vec<Node> {
        let mut blocks = Vec::new();

        while let Some(line) = self.peek() {
            if is_blank(line) {
                self.pos += 1;
                continue;
            }

            let block = if let Some(caps) = ATX.captures(line) {
                self.pos += 1;
                let marker = format!("{} ", &caps[1]);
                let content = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
                match self.context {
                    Context::Top => Node::Section {
                        marker,
                        content,
                        children: vec![],
                    },
                    Context::Nested => Node::Heading { marker, content },
                }
            } else if FENCE.is_match(line) {
                self.parse_fence()
            } else if THEMATIC.is_match(line) {
                self.pos += 1;
                Node::paragraph(line.trim())
            } else if QUOTE.is_match(line) {
                self.parse_quote()
            } else if LIST_ITEM.is_match(line) {
                self.parse_list()
            } else {
                self.parse_paragraph()
            };
            blocks.push(block);
        }

        blocks
    }

    fn peek(&self) -> Option<&'src str> {
        self.lines.get(self.pos).copied()
    }

    fn parse_fence(&mut self) -> Node {
        let opener = self.lines[self.pos];
        let fence = FENCE
            .captures(opener)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        let fence_char = fence.chars().next().unwrap_or('`');
        let start = self.pos;
        self.pos += 1;

        while let Some(line) = self.peek() {
            self.pos += 1;
            let trimmed = line.trim();
            if trimmed.len() >= fence.len() && trimmed.chars().all(|c| c == fence_char) {
                break;
            }
        }

        Node::CodeBlock {
            content: self.lines[start..self.pos].join("\n"),
        }
    }

    fn parse_quote(&mut self) -> Node {
        let mut body: Vec<&str> = Vec::new();
        while let Some(line) = self.peek() {
            match QUOTE.find(line) {
                Some(m) => {
                    body.push(&line[m.end()..]);
                    self.pos += 1;
                }
                None => break,
            }
        }

        Node::BlockQuote {
            marker: "> ".to_string(),
            children: non_empty(BlockParser::new(&body, Context::Nested).parse()),
        }
    }

    fn parse_list(&mut self) -> Node {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            let Some(caps) = LIST_ITEM.captures(line) else {
                break;
            };
            let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let indent = caps[1].len();
            let bullet = &caps[2];
            let marker = format!("{} ", bullet);
            let bullet_end = indent + bullet.len();
            let width = if whole > bullet_end && whole - bullet_end <= 4 {
                whole
            } else {
                bullet_end + 1
            };
            self.pos += 1;

            let mut rest = &line[whole..];
            let mut checked = None;
            if let Some(check) = CHECKBOX.captures(rest) {
                checked = Some(&check[1] != " ");
                rest = &rest[check.get(0).map(|m| m.end()).unwrap_or(0)..];
            }

            let mut body: Vec<&str> = vec![rest];
            while let Some(next) = self.peek() {
                if is_blank(next) {
                    let continues = self.lines[self.pos + 1..]
                        .iter()
                        .find(|l| !is_blank(l))
                        .is_some_and(|l| indentation(l) >= width);
                    if !continues {
                        break;
                    }
                    body.push("");
                    self.pos += 1;
                } else if indentation(next) >= width {
                    body.push(&next[width..]);
                    self.pos += 1;
                } else {
                    break;
                }
            }

            items.push(Node::ListItem {
                marker,
                checked,
                children: non_empty(BlockParser::new(&body, Context::Nested).parse()),
            });
        }

        Node::List { children: items }
    }

    fn parse_paragraph(&mut self) -> Node {
        let start = self.pos;
        self.pos += 1;
        while let Some(line) = self.peek() {
            if is_blank(line) || starts_block(line) {
                break;
            }
            self.pos += 1;
        }

        let lines: Vec<&str> = self.lines[start..self.pos]
            .iter()
            .map(|l| l.trim_start())
            .collect();
        Node::paragraph(lines.join("\n"))
    }
}

fn starts_block(line: &str) -> bool {
    ATX.is_match(line)
        || FENCE.is_match(line)
        || THEMATIC.is_match(line)
        || QUOTE.is_match(line)
        || LIST_ITEM.is_match(line)
}

fn non_empty(children: Vec<Node>) -> Vec<Node> {
    if children.is_empty() {
        vec![Node::paragraph("")]
    } else {
        children
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}
