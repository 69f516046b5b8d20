//! # Outline Parser
//!
//! Markdown grammars used by the outline editor:
//!
//! - [`ast`]: the raw [`Node`] shape, also used for exports
//! - [`block`]: block grammar turning text into nodes
//! - [`inline`]: incremental inline lexer behind each content node
//! - [`edit`]: byte-offset [`TextEdit`] shared by both

pub mod ast;
pub mod block;
pub mod edit;
pub mod error;
pub mod inline;

pub use ast::{Node, NodeKind};
pub use block::{looks_like_block, nest_sections, parse_blocks, parse_document, parse_inner_blocks};
pub use edit::TextEdit;
pub use error::{ParseError, ParseResult};
pub use inline::{tokenize, InlineSpan, InlineToken, InlineTree};
