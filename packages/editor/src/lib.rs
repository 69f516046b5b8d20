//! # Outline Editor
//!
//! Transactional, observable editing engine for markdown outlines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text ↔ Node, inline lexer, edits    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: MarkdownTree                        │
//! │  - Arena of linked nodes with versions      │
//! │  - Node and content mutations → Op log      │
//! │  - Reentrant edit scopes                    │
//! │  - Normalization on commit                  │
//! │  - Lifecycle events and notifications       │
//! │  - Subtree-scoped undo/redo                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ observers: EditDelegate, subscriptions      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Identity survives edits**: a [`NodeId`] names the same node across
//!    moves, removals and undo
//! 2. **One commit, one notification**: observers never see a half-applied
//!    transaction
//! 3. **Repairs are edits**: normalization goes through the same
//!    primitives, so it is undone with the edit that caused it
//! 4. **No rollback**: a failed mutation leaves earlier ones in place
//!
//! ## Usage
//!
//! ```rust
//! use outline_editor::{MarkdownTree, TextEdit};
//!
//! let mut tree = MarkdownTree::parse("item");
//! let root = tree.root();
//! let para = tree.node(root)?.first_child().unwrap();
//!
//! // Typing a list marker turns the paragraph into a list
//! let mut scope = tree.edit();
//! scope.edit_content(para, TextEdit::insert(0, "* "))?;
//! scope.commit(None, None)?;
//!
//! tree.undo(root)?;
//! assert_eq!(tree.node(para)?.content(), Some("item"));
//! # Ok::<(), outline_editor::EditError>(())
//! ```

mod arena;
mod config;
mod delegate;
mod errors;
mod inline_view_model;
mod normalize;
mod ops;
mod signals;
mod tree;
mod undo_stack;
mod view_model;

pub use arena::{Children, NodeId, NodeRef};
pub use config::{HistoryConfig, TreeConfig};
pub use delegate::{Change, EditDelegate};
pub use errors::EditError;
pub use inline_view_model::EditOutcome;
pub use normalize::{MergeAdjacentLists, NestSections, NormalizePass, Normalizer, PruneEmptyContainers};
pub use ops::Op;
pub use signals::Subscription;
pub use tree::{EditScope, HistoryStep, MarkdownTree};
pub use undo_stack::{Batch, Classification, Focus, UndoStack};

// Re-export common types for convenience
pub use outline_parser::{InlineTree, Node, NodeKind, TextEdit};
