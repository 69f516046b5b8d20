//! # Undo/Redo Stack
//!
//! Keeps committed operation batches for undo and redo.
//!
//! ## Design
//!
//! - Each committed transaction becomes one [`Batch`]
//! - A batch made only of content edits on one node absorbs the next such
//!   batch on the same node if it arrives within the coalescing window, so a
//!   burst of keystrokes undoes as one step
//! - Undo/redo are scoped to a subtree: batches entirely outside it are
//!   skipped, a batch straddling it blocks the scan
//! - New batches clear the redo stack

use crate::arena::Arena;
use crate::config::HistoryConfig;
use crate::{NodeId, Op};
use std::time::Instant;

/// Cursor hint stored with a batch, restored after undo/redo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focus {
    pub node: NodeId,
    pub offset: usize,
    pub selection: Option<Vec<NodeId>>,
}

impl Focus {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self {
            node,
            offset,
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: Vec<NodeId>) -> Self {
        self.selection = Some(selection);
        self
    }
}

/// A group of operations undone/redone together
#[derive(Debug, Clone)]
pub struct Batch {
    /// Operations in application order
    pub ops: Vec<Op>,

    /// Focus before the batch, returned by undo
    pub start_focus: Option<Focus>,

    /// Focus after the batch, returned by redo
    pub end_focus: Option<Focus>,

    /// Time of the last commit merged into this batch
    pub timestamp: Instant,
}

impl Batch {
    /// The node every op edits, if the batch is content edits on one node
    fn edited_node(&self) -> Option<NodeId> {
        edited_node(&self.ops)
    }
}

fn edited_node(ops: &[Op]) -> Option<NodeId> {
    let first = ops.first()?.node();
    ops.iter()
        .all(|op| op.is_content_edit() && op.node() == first)
        .then_some(first)
}

/// Position of a batch's touched nodes relative to a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Inside,
    Outside,
    Both,
}

/// Classifies `batch` against the subtree rooted at `root`, looking only at
/// touched nodes that are still connected.
pub(crate) fn classify(arena: &Arena, document: NodeId, root: NodeId, batch: &Batch) -> Classification {
    let mut inside = false;
    let mut outside = false;

    for node in batch.ops.iter().flat_map(Op::touched) {
        if !arena[node].connected {
            continue;
        }
        if arena.contains(root, node) {
            inside = true;
        } else {
            outside = true;
        }
    }

    match (inside, outside) {
        (true, true) => Classification::Both,
        (true, false) => Classification::Inside,
        (false, true) => Classification::Outside,
        (false, false) if root == document => Classification::Inside,
        (false, false) => Classification::Outside,
    }
}

/// Result of looking for the next batch to undo or redo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
    Found(usize),
    Blocked,
    Empty,
}

/// Undo/redo stack for tree editing
#[derive(Debug)]
pub struct UndoStack {
    /// Committed batches (most recent last)
    undo_stack: Vec<Batch>,

    /// Undone batches (most recent last)
    redo_stack: Vec<Batch>,

    config: HistoryConfig,
}

impl UndoStack {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    /// Records a committed batch. Returns true when it was merged into the
    /// previous batch.
    pub(crate) fn record(
        &mut self,
        ops: Vec<Op>,
        start_focus: Option<Focus>,
        end_focus: Option<Focus>,
        now: Instant,
    ) -> bool {
        // a forward edit invalidates the future
        self.redo_stack.clear();

        if let Some(last) = self.undo_stack.last_mut() {
            let same_node = last.edited_node().is_some_and(|n| edited_node(&ops) == Some(n));
            let recent = now.saturating_duration_since(last.timestamp) < self.config.coalesce_window();
            if same_node && recent {
                last.ops.extend(ops);
                last.timestamp = now;
                if end_focus.is_some() {
                    last.end_focus = end_focus;
                }
                return true;
            }
        }

        self.undo_stack.push(Batch {
            ops,
            start_focus,
            end_focus,
            timestamp: now,
        });

        if self.config.max_levels > 0 && self.undo_stack.len() > self.config.max_levels {
            self.undo_stack.remove(0);
        }
        false
    }

    pub(crate) fn find_undo(&self, classify: impl Fn(&Batch) -> Classification) -> Lookup {
        find(&self.undo_stack, classify)
    }

    pub(crate) fn find_redo(&self, classify: impl Fn(&Batch) -> Classification) -> Lookup {
        find(&self.redo_stack, classify)
    }

    pub(crate) fn take_undo(&mut self, index: usize) -> Batch {
        self.undo_stack.remove(index)
    }

    pub(crate) fn take_redo(&mut self, index: usize) -> Batch {
        self.redo_stack.remove(index)
    }

    pub(crate) fn push_undo(&mut self, batch: Batch) {
        self.undo_stack.push(batch);
    }

    pub(crate) fn push_redo(&mut self, batch: Batch) {
        self.redo_stack.push(batch);
    }

    /// Put a batch back where it was taken from
    pub(crate) fn restore_undo(&mut self, index: usize, batch: Batch) {
        self.undo_stack.insert(index, batch);
    }

    pub(crate) fn restore_redo(&mut self, index: usize, batch: Batch) {
        self.redo_stack.insert(index, batch);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Undo batches, oldest first
    pub fn undo_batches(&self) -> &[Batch] {
        &self.undo_stack
    }

    pub fn redo_batches(&self) -> &[Batch] {
        &self.redo_stack
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn find(stack: &[Batch], classify: impl Fn(&Batch) -> Classification) -> Lookup {
    for (index, batch) in stack.iter().enumerate().rev() {
        match classify(batch) {
            Classification::Inside => return Lookup::Found(index),
            Classification::Both => return Lookup::Blocked,
            Classification::Outside => {}
        }
    }
    Lookup::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_parser::{Node, TextEdit};
    use std::time::Duration;

    fn nodes() -> (NodeId, NodeId) {
        let mut arena = Arena::new();
        let root = arena.wrap(Node::document(vec![Node::paragraph("a"), Node::paragraph("b")]));
        let mut children = arena.children(root);
        let a = children.next().unwrap();
        let b = children.next().unwrap();
        (a, b)
    }

    fn edit(node: NodeId) -> Op {
        Op::Edit {
            node,
            edit: TextEdit::insert(0, "x"),
            inverse: TextEdit::delete(0, 1),
        }
    }

    fn stack(window_ms: u64, max_levels: usize) -> UndoStack {
        UndoStack::new(HistoryConfig {
            coalesce_window_ms: window_ms,
            max_levels,
        })
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new(HistoryConfig::default());
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_edits_on_same_node_coalesce_within_window() {
        let (a, _) = nodes();
        let mut stack = stack(1000, 100);
        let t0 = Instant::now();

        assert!(!stack.record(vec![edit(a)], None, None, t0));
        assert!(stack.record(vec![edit(a)], None, None, t0 + Duration::from_millis(400)));
        // window is measured from the last merge
        assert!(stack.record(vec![edit(a)], None, None, t0 + Duration::from_millis(1200)));
        assert!(!stack.record(vec![edit(a)], None, None, t0 + Duration::from_millis(2500)));

        assert_eq!(stack.undo_levels(), 2);
        assert_eq!(stack.undo_batches()[0].ops.len(), 3);
    }

    #[test]
    fn test_edits_on_different_nodes_do_not_coalesce() {
        let (a, b) = nodes();
        let mut stack = stack(1000, 100);
        let t0 = Instant::now();

        stack.record(vec![edit(a)], None, None, t0);
        stack.record(vec![edit(b)], None, None, t0);
        assert_eq!(stack.undo_levels(), 2);
    }

    #[test]
    fn test_structural_batches_never_coalesce() {
        let (a, b) = nodes();
        let mut stack = stack(1000, 100);
        let t0 = Instant::now();
        let marker = Op::Marker {
            node: a,
            old: "* ".to_string(),
            new: "- ".to_string(),
        };

        stack.record(vec![edit(a), marker], None, None, t0);
        stack.record(vec![edit(a)], None, None, t0);
        stack.record(
            vec![
                edit(a),
                Op::Insert {
                    node: b,
                    parent: a,
                    next_sibling: None,
                },
            ],
            None,
            None,
            t0,
        );
        assert_eq!(stack.undo_levels(), 3);
    }

    #[test]
    fn test_record_clears_redo() {
        let (a, _) = nodes();
        let mut stack = stack(0, 100);
        let t0 = Instant::now();

        stack.record(vec![edit(a)], None, None, t0);
        let batch = stack.take_undo(0);
        stack.push_redo(batch);
        assert_eq!(stack.redo_levels(), 1);

        stack.record(vec![edit(a)], None, None, t0);
        assert_eq!(stack.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let (a, _) = nodes();
        let mut stack = stack(0, 2);
        let t0 = Instant::now();

        for _ in 0..3 {
            stack.record(vec![edit(a)], None, None, t0);
        }
        assert_eq!(stack.undo_levels(), 2);
    }

    #[test]
    fn test_find_skips_outside_and_stops_at_both() {
        let (a, b) = nodes();
        let mut stack = stack(0, 100);
        let t0 = Instant::now();
        stack.record(vec![edit(a)], None, None, t0);
        stack.record(vec![edit(b)], None, None, t0);

        let only_a = |batch: &Batch| {
            if batch.ops.iter().all(|op| op.node() == a) {
                Classification::Inside
            } else {
                Classification::Outside
            }
        };
        assert_eq!(stack.find_undo(only_a), Lookup::Found(0));
        assert_eq!(stack.find_undo(|_| Classification::Both), Lookup::Blocked);
        assert_eq!(stack.find_redo(|_| Classification::Inside), Lookup::Empty);
    }
}
