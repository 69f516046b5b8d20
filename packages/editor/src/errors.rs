//! Error types for the editor

use crate::NodeId;
use outline_parser::{NodeKind, ParseError};
use thiserror::Error;

/// Contract violations raised by tree mutations.
///
/// These signal a bug in the caller, not a condition to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Mutations require an open edit scope")]
    NotEditing,

    #[error("Undo and redo cannot run inside an open edit scope")]
    HistoryWhileEditing,

    #[error("Node {0} has no parent")]
    Detached(NodeId),

    #[error("Node {0} does not belong to this tree")]
    ForeignNode(NodeId),

    #[error("{op} is not applicable to {kind} nodes")]
    NotApplicable { op: &'static str, kind: NodeKind },

    #[error("Node {0} cannot hold children")]
    NotAContainer(NodeId),

    #[error("Node {next} is not a child of {parent}")]
    NotAChild { parent: NodeId, next: NodeId },

    #[error("Inserting {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("Invalid text edit: {0}")]
    InvalidEdit(#[from] ParseError),

    #[error("Edit scope closed more times than it was opened")]
    DepthMismatch,
}
