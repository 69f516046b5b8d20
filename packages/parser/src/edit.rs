//! Byte-offset text edits shared by the editor and the inline parser.

use crate::error::{ParseError, ParseResult};
use serde::{Deserialize, Serialize};

/// Replacement of `text[start..old_end]` by `new_text`.
///
/// Offsets are byte offsets into UTF-8 text. `new_end` is the end of the
/// inserted text in the edited buffer, i.e. `start + new_text.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(start: usize, old_end: usize, new_text: impl Into<String>) -> Self {
        let new_text = new_text.into();
        Self {
            start,
            old_end,
            new_end: start + new_text.len(),
            new_text,
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, String::new())
    }

    /// Signed change in buffer length
    pub fn delta(&self) -> isize {
        self.new_end as isize - self.old_end as isize
    }

    pub fn validate(&self, text: &str) -> ParseResult<()> {
        if self.start > self.old_end {
            return Err(ParseError::InvertedRange {
                start: self.start,
                end: self.old_end,
            });
        }
        if self.old_end > text.len() {
            return Err(ParseError::out_of_bounds(self.start, self.old_end, text.len()));
        }
        for pos in [self.start, self.old_end] {
            if !text.is_char_boundary(pos) {
                return Err(ParseError::not_char_boundary(pos));
            }
        }
        if self.new_end != self.start + self.new_text.len() {
            return Err(ParseError::MismatchedEnd {
                start: self.start,
                new_end: self.new_end,
                len: self.new_text.len(),
            });
        }
        Ok(())
    }

    /// Returns the edited text, leaving `text` untouched
    pub fn apply(&self, text: &str) -> ParseResult<String> {
        self.validate(text)?;
        let mut out = String::with_capacity(text.len() + self.new_text.len());
        out.push_str(&text[..self.start]);
        out.push_str(&self.new_text);
        out.push_str(&text[self.old_end..]);
        Ok(out)
    }

    /// Edit that undoes this one, given the text it was applied to
    pub fn invert(&self, original: &str) -> ParseResult<TextEdit> {
        self.validate(original)?;
        Ok(TextEdit {
            start: self.start,
            old_end: self.new_end,
            new_end: self.old_end,
            new_text: original[self.start..self.old_end].to_string(),
        })
    }
}
