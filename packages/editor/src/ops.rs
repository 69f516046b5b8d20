//! # Operations
//!
//! Every primitive mutation records one [`Op`] holding exactly what is
//! needed to run it backwards or forwards again:
//!
//! | op       | undo                                 | redo                          |
//! |----------|--------------------------------------|-------------------------------|
//! | `Remove` | `insert_before(parent, next_sibling)` | `remove()`                   |
//! | `Insert` | `remove()`                           | `insert_before(parent, next)` |
//! | `Edit`   | apply `inverse`                      | apply `edit`                  |
//! | `Marker` | set `old`                            | set `new`                     |
//! | `Check`  | set `old`                            | set `new`                     |
//!
//! Moving an attached node records a `Remove` followed by an `Insert`.

use crate::{EditError, MarkdownTree, NodeId};
use outline_parser::TextEdit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Remove {
        node: NodeId,
        parent: NodeId,
        next_sibling: Option<NodeId>,
    },

    Insert {
        node: NodeId,
        parent: NodeId,
        next_sibling: Option<NodeId>,
    },

    /// Content replacement; `inverse` restores the previous text
    Edit {
        node: NodeId,
        edit: TextEdit,
        inverse: TextEdit,
    },

    Marker {
        node: NodeId,
        old: String,
        new: String,
    },

    Check {
        node: NodeId,
        old: Option<bool>,
        new: Option<bool>,
    },
}

impl Op {
    /// The node the operation was applied to
    pub fn node(&self) -> NodeId {
        match self {
            Op::Remove { node, .. }
            | Op::Insert { node, .. }
            | Op::Edit { node, .. }
            | Op::Marker { node, .. }
            | Op::Check { node, .. } => *node,
        }
    }

    /// Nodes whose position or content the operation affects
    pub fn touched(&self) -> impl Iterator<Item = NodeId> {
        let parent = match self {
            Op::Remove { parent, .. } | Op::Insert { parent, .. } => Some(*parent),
            _ => None,
        };
        std::iter::once(self.node()).chain(parent)
    }

    pub fn is_content_edit(&self) -> bool {
        matches!(self, Op::Edit { .. })
    }

    pub(crate) fn undo(&self, tree: &mut MarkdownTree) -> Result<(), EditError> {
        match self {
            Op::Remove {
                node,
                parent,
                next_sibling,
            } => tree.insert_before(*node, *parent, *next_sibling),
            Op::Insert { node, .. } => tree.remove(*node),
            Op::Edit { node, inverse, .. } => tree.apply_text_edit(*node, inverse),
            Op::Marker { node, old, .. } => tree.update_marker(*node, old.clone()),
            Op::Check { node, old, .. } => tree.update_checked(*node, *old),
        }
    }

    pub(crate) fn redo(&self, tree: &mut MarkdownTree) -> Result<(), EditError> {
        match self {
            Op::Remove { node, .. } => tree.remove(*node),
            Op::Insert {
                node,
                parent,
                next_sibling,
            } => tree.insert_before(*node, *parent, *next_sibling),
            Op::Edit { node, edit, .. } => tree.apply_text_edit(*node, edit),
            Op::Marker { node, new, .. } => tree.update_marker(*node, new.clone()),
            Op::Check { node, new, .. } => tree.update_checked(*node, *new),
        }
    }
}
