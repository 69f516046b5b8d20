//! Lifecycle notifications for indexing consumers.

use crate::{MarkdownTree, NodeId};
use serde::Serialize;

/// What happened to a node in a committed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Change {
    /// Became reachable from the root
    Connected,
    /// Stopped being reachable from the root
    Disconnected,
    /// Stayed reachable and was touched
    Changed,
}

/// Receives one call per affected node after each committed transaction:
/// first every `Disconnected`, then `Connected`/`Changed` in document order.
pub trait EditDelegate {
    fn post_edit_update(&mut self, tree: &MarkdownTree, node: NodeId, change: Change);
}

impl<F> EditDelegate for F
where
    F: FnMut(&MarkdownTree, NodeId, Change),
{
    fn post_edit_update(&mut self, tree: &MarkdownTree, node: NodeId, change: Change) {
        self(tree, node, change)
    }
}
