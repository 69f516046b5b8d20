//! Inline markdown lexing with incremental re-lexing.
//!
//! Inline tokens never span a line break, so an edit only invalidates the
//! lines it touches. [`InlineTree::edit`] drops the tokens of those lines,
//! shifts the tokens after them and remembers the dirty window;
//! [`InlineTree::reparse`] re-lexes just that window.

use crate::edit::TextEdit;
use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineToken {
    #[token("**")]
    Strong,

    #[token("*")]
    Star,

    #[token("_")]
    Underscore,

    #[regex(r"`[^`\n]*`")]
    Code,

    #[token("`")]
    Backtick,

    #[regex(r"\[\[[^\[\]\n]+\]\]")]
    WikiLink,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[regex(r"#[A-Za-z][A-Za-z0-9_-]*")]
    Tag,

    #[token("#")]
    Hash,

    #[token("\n")]
    Newline,

    #[regex(r"[^*_`\[\]()#\n]+")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub kind: InlineToken,
    pub range: Range<usize>,
}

/// Window of text whose tokens are missing, in edited-text coordinates.
/// `end == None` means the window runs to the end of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dirty {
    start: usize,
    end: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineTree {
    tokens: Vec<InlineSpan>,
    dirty: Option<Dirty>,
}

pub fn tokenize(source: &str) -> Vec<InlineSpan> {
    lex_at(source, 0)
}

fn lex_at(source: &str, offset: usize) -> Vec<InlineSpan> {
    InlineToken::lexer(source)
        .spanned()
        .map(|(result, span)| InlineSpan {
            kind: result.unwrap_or(InlineToken::Text),
            range: span.start + offset..span.end + offset,
        })
        .collect()
}

impl InlineTree {
    pub fn parse(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
            dirty: None,
        }
    }

    /// True when an edit has been recorded but not yet re-lexed
    pub fn is_stale(&self) -> bool {
        self.dirty.is_some()
    }

    pub fn tokens(&self) -> &[InlineSpan] {
        &self.tokens
    }

    /// Records an edit applied to the text this tree was parsed from.
    pub fn edit(&mut self, edit: &TextEdit) {
        let line_start = self
            .tokens
            .iter()
            .filter(|t| t.kind == InlineToken::Newline && t.range.end <= edit.start)
            .map(|t| t.range.end)
            .last()
            .unwrap_or(0);

        match self.dirty.take() {
            None => {
                let suffix_at = self
                    .tokens
                    .iter()
                    .position(|t| t.kind == InlineToken::Newline && t.range.start >= edit.old_end);
                let mut suffix = match suffix_at {
                    Some(i) => self.tokens.split_off(i),
                    None => Vec::new(),
                };
                self.tokens.retain(|t| t.range.end <= line_start);

                let delta = edit.delta();
                for token in &mut suffix {
                    token.range = shift(token.range.start, delta)..shift(token.range.end, delta);
                }
                let end = suffix.first().map(|t| t.range.start);
                self.tokens.extend(suffix);
                self.dirty = Some(Dirty {
                    start: line_start,
                    end,
                });
            }
            Some(previous) => {
                // a second edit before re-lexing widens the window to the end
                let start = line_start.min(previous.start);
                self.tokens.retain(|t| t.range.end <= start);
                self.dirty = Some(Dirty { start, end: None });
            }
        }
    }

    /// Re-lexes the dirty window of `text`, which must be the edited text.
    pub fn reparse(&mut self, text: &str) {
        let Some(dirty) = self.dirty.take() else {
            return;
        };
        let end = dirty.end.unwrap_or(text.len()).min(text.len());
        let start = dirty.start.min(end);
        let fresh = lex_at(&text[start..end], start);
        let at = self
            .tokens
            .iter()
            .position(|t| t.range.start >= start)
            .unwrap_or(self.tokens.len());
        self.tokens.splice(at..at, fresh);
    }

    /// Targets of `[[wiki links]]`
    pub fn links<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans_of(InlineToken::WikiLink, text)
            .map(|s| s[2..s.len() - 2].trim())
            .collect()
    }

    /// `#tags` without the leading hash
    pub fn tags<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.spans_of(InlineToken::Tag, text).map(|s| &s[1..]).collect()
    }

    fn spans_of<'s, 'a: 's>(
        &'s self,
        kind: InlineToken,
        text: &'a str,
    ) -> impl Iterator<Item = &'a str> + 's {
        self.tokens
            .iter()
            .filter(move |t| t.kind == kind)
            .filter_map(move |t| text.get(t.range.clone()))
    }
}

fn shift(pos: usize, delta: isize) -> usize {
    (pos as isize + delta).max(0) as usize
}
