//! Replay scripts: a JSON list of edits applied to an outline.
//!
//! Nodes are addressed by child-index paths from the document root, so
//! `[0, 2]` is the third child of the first top-level block. Paths are
//! resolved when the step runs.
//!
//! ```json
//! { "steps": [
//!     { "op": "edit", "path": [0], "start": 0, "oldEnd": 0, "text": "* " },
//!     { "op": "move", "path": [1], "parent": [], "before": 0 },
//!     { "op": "group", "steps": [
//!         { "op": "marker", "path": [0, 0], "marker": "- " },
//!         { "op": "check", "path": [0, 0], "checked": false }
//!     ] },
//!     { "op": "undo" }
//! ] }
//! ```

use outline_editor::{EditError, EditOutcome, HistoryStep, MarkdownTree, Node, NodeId, TextEdit};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Step {
    /// Replace `content[start..old_end]` with `text`
    Edit {
        path: Vec<usize>,
        start: usize,
        old_end: usize,
        text: String,
    },
    Marker {
        path: Vec<usize>,
        marker: String,
    },
    Check {
        path: Vec<usize>,
        checked: Option<bool>,
    },
    /// Move a node under `parent`, before its child at index `before`
    /// (appended when absent)
    Move {
        path: Vec<usize>,
        parent: Vec<usize>,
        before: Option<usize>,
    },
    /// Insert a new raw node
    Insert {
        node: Node,
        parent: Vec<usize>,
        before: Option<usize>,
    },
    Remove {
        path: Vec<usize>,
    },
    /// Steps applied in one transaction
    Group {
        steps: Vec<Step>,
    },
    /// Undo within the subtree at `scope` (the whole document by default)
    Undo {
        #[serde(default)]
        scope: Vec<usize>,
    },
    Redo {
        #[serde(default)]
        scope: Vec<usize>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Edit { .. } => "edit",
            Step::Marker { .. } => "marker",
            Step::Check { .. } => "check",
            Step::Move { .. } => "move",
            Step::Insert { .. } => "insert",
            Step::Remove { .. } => "remove",
            Step::Group { .. } => "group",
            Step::Undo { .. } => "undo",
            Step::Redo { .. } => "redo",
        }
    }
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Path {0:?} does not name a node")]
    BadPath(Vec<usize>),

    #[error("{0} cannot run inside a group")]
    HistoryInGroup(&'static str),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// What a step did, for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    Applied,
    Promoted(usize),
    History(HistoryStep),
}

pub fn resolve(tree: &MarkdownTree, path: &[usize]) -> Result<NodeId, ScriptError> {
    let mut node = tree.root();
    for &index in path {
        node = tree
            .node(node)?
            .children()
            .nth(index)
            .ok_or_else(|| ScriptError::BadPath(path.to_vec()))?;
    }
    Ok(node)
}

fn resolve_before(tree: &MarkdownTree, parent: NodeId, before: Option<usize>, path: &[usize]) -> Result<Option<NodeId>, ScriptError> {
    match before {
        None => Ok(None),
        Some(index) => tree
            .node(parent)?
            .children()
            .nth(index)
            .map(Some)
            .ok_or_else(|| ScriptError::BadPath(path.to_vec())),
    }
}

/// Runs one top-level step, in its own transaction unless it is undo/redo
pub fn run_step(tree: &mut MarkdownTree, step: &Step) -> Result<StepReport, ScriptError> {
    debug!(op = step.name(), "Running step");
    match step {
        Step::Undo { scope } => {
            let scope = resolve(tree, scope)?;
            Ok(StepReport::History(tree.undo(scope)?))
        }
        Step::Redo { scope } => {
            let scope = resolve(tree, scope)?;
            Ok(StepReport::History(tree.redo(scope)?))
        }
        _ => {
            let mut scope = tree.edit();
            let report = apply(&mut scope, step)?;
            scope.commit(None, None)?;
            Ok(report)
        }
    }
}

fn apply(tree: &mut MarkdownTree, step: &Step) -> Result<StepReport, ScriptError> {
    match step {
        Step::Edit {
            path,
            start,
            old_end,
            text,
        } => {
            let node = resolve(tree, path)?;
            let edit = TextEdit::replace(*start, *old_end, text.clone());
            match tree.edit_content(node, edit)? {
                EditOutcome::Promoted(created) => Ok(StepReport::Promoted(created.len())),
                EditOutcome::Edited | EditOutcome::Unchanged => Ok(StepReport::Applied),
            }
        }
        Step::Marker { path, marker } => {
            let node = resolve(tree, path)?;
            tree.update_marker(node, marker.clone())?;
            Ok(StepReport::Applied)
        }
        Step::Check { path, checked } => {
            let node = resolve(tree, path)?;
            tree.update_checked(node, *checked)?;
            Ok(StepReport::Applied)
        }
        Step::Move { path, parent, before } => {
            let node = resolve(tree, path)?;
            let target = resolve(tree, parent)?;
            let next = resolve_before(tree, target, *before, parent)?;
            tree.insert_before(node, target, next)?;
            Ok(StepReport::Applied)
        }
        Step::Insert { node, parent, before } => {
            let target = resolve(tree, parent)?;
            let next = resolve_before(tree, target, *before, parent)?;
            let node = tree.add(node.clone());
            tree.insert_before(node, target, next)?;
            Ok(StepReport::Applied)
        }
        Step::Remove { path } => {
            let node = resolve(tree, path)?;
            tree.remove(node)?;
            Ok(StepReport::Applied)
        }
        Step::Group { steps } => {
            let mut scope = tree.edit();
            for inner in steps {
                apply(&mut scope, inner)?;
            }
            scope.commit(None, None)?;
            Ok(StepReport::Applied)
        }
        Step::Undo { .. } | Step::Redo { .. } => Err(ScriptError::HistoryInGroup(step.name())),
    }
}
