use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Edit range {start}..{end} is out of bounds for text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("Edit range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },

    #[error("Offset {pos} is not on a character boundary")]
    NotCharBoundary { pos: usize },

    #[error("Edit end {new_end} does not match start {start} plus inserted length {len}")]
    MismatchedEnd { start: usize, new_end: usize, len: usize },
}

impl ParseError {
    pub fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfBounds { start, end, len }
    }

    pub fn not_char_boundary(pos: usize) -> Self {
        Self::NotCharBoundary { pos }
    }
}
