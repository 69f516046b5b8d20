//! # Markdown Tree
//!
//! Owns the node arena and runs every mutation inside an edit scope.
//!
//! ## Transaction lifecycle
//!
//! ```text
//! idle ──edit()──> editing ──(nested edit() / drop)──> editing
//!                     │
//!                     └─ outermost commit/drop ──> post-edit ──> idle
//! ```
//!
//! The outermost commit:
//! 1. runs the [`Normalizer`]
//! 2. disconnects nodes removed and not re-attached
//! 3. connects or reports as changed every reachable node stamped since
//!    the scope opened
//! 4. records the ops as one history batch
//! 5. flushes node notifications and tells tree observers the new root
//!    version
//!
//! Partial mutations are never rolled back.

use crate::arena::{Arena, NodeRef};
use crate::config::TreeConfig;
use crate::delegate::{Change, EditDelegate};
use crate::normalize::Normalizer;
use crate::signals::{Signals, Subscription};
use crate::undo_stack::{self, Batch, Classification, Focus, Lookup, UndoStack};
use crate::{EditError, NodeId, Op};
use indexmap::IndexSet;
use outline_parser::{parse_document, Node};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tracing::{debug, instrument, trace, warn};

/// Outcome of [`MarkdownTree::undo`] and [`MarkdownTree::redo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    /// A batch was replayed; carries its focus hint
    Applied { focus: Option<Focus> },
    /// Nothing to undo or redo inside the requested subtree
    Empty,
    /// The most recent eligible batch straddles the subtree boundary
    Blocked,
}

impl HistoryStep {
    pub fn is_applied(&self) -> bool {
        matches!(self, HistoryStep::Applied { .. })
    }

    pub fn focus(&self) -> Option<&Focus> {
        match self {
            HistoryStep::Applied { focus } => focus.as_ref(),
            _ => None,
        }
    }
}

/// What an outermost scope does on commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Normalized and recorded in history
    #[default]
    Edit,
    /// Normalized, kept out of history; used once on construction
    Setup,
    /// Applied verbatim and kept out of history; undo/redo ops already
    /// carry their normalization
    Replay,
}

#[derive(Debug, Default)]
pub(crate) struct Transaction {
    pub depth: usize,
    /// Root version when the scope opened
    pub start_version: u64,
    /// Arena clock when the scope opened; anything stamped later was touched
    pub start_clock: u64,
    /// Nodes removed in this transaction, possibly re-attached since
    pub removed: IndexSet<NodeId>,
    pub ops: Vec<Op>,
    pub mode: Mode,
}

pub struct MarkdownTree {
    pub(crate) arena: Arena,
    pub(crate) root: NodeId,
    pub(crate) signals: Signals,
    pub(crate) tx: Transaction,
    history: UndoStack,
    normalizer: Normalizer,
    delegate: Option<Box<dyn EditDelegate>>,
}

impl MarkdownTree {
    pub fn new(document: Node) -> Self {
        Self::with_config(document, TreeConfig::default())
    }

    /// Wraps `document` as the root; everything in it starts connected.
    /// The document is normalized once, outside history.
    pub fn with_config(document: Node, config: TreeConfig) -> Self {
        let mut arena = Arena::new();
        let root = arena.wrap(document);
        for node in arena.descendants(root) {
            arena[node].connected = true;
        }

        let mut tree = Self {
            arena,
            root,
            signals: Signals::default(),
            tx: Transaction::default(),
            history: UndoStack::new(config.history),
            normalizer: Normalizer::new(),
            delegate: None,
        };

        tree.begin(Mode::Setup);
        if let Err(error) = tree.finish(None, None) {
            warn!(%error, "Normalizing the initial document failed");
        }
        tree
    }

    /// Parses markdown text into a fresh tree
    pub fn parse(text: &str) -> Self {
        Self::new(parse_document(text))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Wraps a raw node without attaching it; insert it inside a scope.
    pub fn add(&mut self, raw: Node) -> NodeId {
        self.arena.wrap(raw)
    }

    pub fn node(&self, id: NodeId) -> Result<NodeRef<'_>, EditError> {
        let id = self.arena.check(id)?;
        Ok(NodeRef {
            arena: &self.arena,
            id,
        })
    }

    /// Deep copy of a subtree as raw nodes
    pub fn export(&self, id: NodeId) -> Result<Node, EditError> {
        let id = self.arena.check(id)?;
        Ok(self.arena.export(id))
    }

    pub fn is_editing(&self) -> bool {
        self.tx.depth > 0
    }

    // -- observers --

    pub fn set_delegate(&mut self, delegate: impl EditDelegate + 'static) {
        self.delegate = Some(Box::new(delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    /// Calls `listener` after each commit that touched `node` or its
    /// child list
    pub fn subscribe(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&NodeId) + 'static,
    ) -> Result<Subscription, EditError> {
        let node = self.arena.check(node)?;
        Ok(self.signals.subscribe_node(node, listener))
    }

    /// Calls `listener` with the new root version after each commit that
    /// changed the tree
    pub fn subscribe_tree(&mut self, listener: impl FnMut(&u64) + 'static) -> Subscription {
        self.signals.subscribe_tree(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.signals.unsubscribe(subscription)
    }

    // -- transactions --

    /// Opens an edit scope. Scopes nest; only the outermost one commits.
    pub fn edit(&mut self) -> EditScope<'_> {
        self.begin(Mode::Edit);
        EditScope {
            tree: self,
            done: false,
        }
    }

    /// Runs `f` in an edit scope and commits it
    pub fn transact<R>(
        &mut self,
        f: impl FnOnce(&mut MarkdownTree) -> Result<R, EditError>,
    ) -> Result<R, EditError> {
        let mut scope = self.edit();
        let value = f(&mut *scope)?;
        scope.commit(None, None)?;
        Ok(value)
    }

    fn begin(&mut self, mode: Mode) {
        if self.tx.depth == 0 {
            self.tx.start_version = self.arena[self.root].version;
            self.tx.start_clock = self.arena.clock();
            self.tx.removed.clear();
            self.tx.ops.clear();
            self.tx.mode = mode;
            self.signals.suspend();
            trace!(version = self.tx.start_version, "Edit scope opened");
        }
        self.tx.depth += 1;
    }

    fn finish(&mut self, start_focus: Option<Focus>, end_focus: Option<Focus>) -> Result<Vec<Op>, EditError> {
        match self.tx.depth {
            0 => return Err(EditError::DepthMismatch),
            1 => {}
            _ => {
                self.tx.depth -= 1;
                return Ok(Vec::new());
            }
        }

        let normalized = match self.tx.mode {
            Mode::Replay => Ok(0),
            Mode::Edit | Mode::Setup => self.normalize(),
        };
        let events = self.update_lifecycle();
        self.dispatch(&events);

        let ops = std::mem::take(&mut self.tx.ops);
        if self.tx.mode == Mode::Edit && !ops.is_empty() {
            let merged = self
                .history
                .record(ops.clone(), start_focus, end_focus, Instant::now());
            debug!(ops = ops.len(), merged, levels = self.history.undo_levels(), "Recorded history batch");
        }

        self.tx.depth = 0;
        self.tx.removed.clear();
        self.signals.resume();

        let version = self.arena[self.root].version;
        if version != self.tx.start_version {
            self.signals.notify_tree(version);
        }
        debug!(ops = ops.len(), events = events.len(), version, "Edit scope committed");

        normalized.map(|_| ops)
    }

    /// Releases a scope dropped during a panic without committing it
    fn abandon(&mut self) {
        if self.tx.depth == 0 {
            return;
        }
        self.tx.depth -= 1;
        if self.tx.depth == 0 {
            self.tx.removed.clear();
            self.tx.ops.clear();
            self.signals.resume_discarding();
            warn!("Edit scope abandoned during unwind");
        }
    }

    fn normalize(&mut self) -> Result<usize, EditError> {
        let normalizer = std::mem::replace(&mut self.normalizer, Normalizer::empty());
        let result = normalizer.run(self);
        self.normalizer = normalizer;
        result
    }

    fn update_lifecycle(&mut self) -> Vec<(NodeId, Change)> {
        let mut events = Vec::new();

        let removed: Vec<NodeId> = self.tx.removed.iter().copied().collect();
        for node in removed {
            if self.arena.contains(self.root, node) {
                continue;
            }
            for id in self.arena.descendants(node) {
                if self.arena[id].connected {
                    self.arena[id].connected = false;
                    events.push((id, Change::Disconnected));
                }
            }
        }

        // only stamped nodes can hold stamped descendants
        let start = self.tx.start_clock;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.arena[id].version <= start {
                continue;
            }
            let slot = &mut self.arena[id];
            if slot.connected {
                events.push((id, Change::Changed));
            } else {
                slot.connected = true;
                events.push((id, Change::Connected));
            }
            let mut child = self.arena[id].last;
            while let Some(c) = child {
                stack.push(c);
                child = self.arena[c].prev;
            }
        }
        events
    }

    fn dispatch(&mut self, events: &[(NodeId, Change)]) {
        let Some(mut delegate) = self.delegate.take() else {
            return;
        };
        for (node, change) in events {
            delegate.post_edit_update(self, *node, *change);
        }
        self.delegate = Some(delegate);
    }

    // -- history --

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Where a batch's touched, still-connected nodes sit relative to the
    /// subtree rooted at `root`
    pub fn classify(&self, root: NodeId, batch: &Batch) -> Result<Classification, EditError> {
        let root = self.arena.check(root)?;
        Ok(undo_stack::classify(&self.arena, self.root, root, batch))
    }

    /// Undoes the most recent batch inside the subtree rooted at `root`
    #[instrument(skip(self))]
    pub fn undo(&mut self, root: NodeId) -> Result<HistoryStep, EditError> {
        let root = self.ready_for_history(root)?;
        let lookup = self
            .history
            .find_undo(|batch| undo_stack::classify(&self.arena, self.root, root, batch));

        let index = match lookup {
            Lookup::Found(index) => index,
            Lookup::Empty => return Ok(HistoryStep::Empty),
            Lookup::Blocked => {
                warn!("Undo blocked by a batch straddling the subtree");
                return Ok(HistoryStep::Blocked);
            }
        };

        let batch = self.history.take_undo(index);
        let replayed = self.replay(batch.ops.iter().rev(), Op::undo);
        if let Err(error) = replayed {
            self.history.restore_undo(index, batch);
            return Err(error);
        }

        debug!(ops = batch.ops.len(), "Undid batch");
        let focus = batch.start_focus.clone();
        self.history.push_redo(batch);
        Ok(HistoryStep::Applied { focus })
    }

    /// Redoes the most recently undone batch inside the subtree rooted at
    /// `root`
    #[instrument(skip(self))]
    pub fn redo(&mut self, root: NodeId) -> Result<HistoryStep, EditError> {
        let root = self.ready_for_history(root)?;
        let lookup = self
            .history
            .find_redo(|batch| undo_stack::classify(&self.arena, self.root, root, batch));

        let index = match lookup {
            Lookup::Found(index) => index,
            Lookup::Empty => return Ok(HistoryStep::Empty),
            Lookup::Blocked => {
                warn!("Redo blocked by a batch straddling the subtree");
                return Ok(HistoryStep::Blocked);
            }
        };

        let batch = self.history.take_redo(index);
        let replayed = self.replay(batch.ops.iter(), Op::redo);
        if let Err(error) = replayed {
            self.history.restore_redo(index, batch);
            return Err(error);
        }

        debug!(ops = batch.ops.len(), "Redid batch");
        let focus = batch.end_focus.clone();
        self.history.push_undo(batch);
        Ok(HistoryStep::Applied { focus })
    }

    fn ready_for_history(&self, root: NodeId) -> Result<NodeId, EditError> {
        if self.is_editing() {
            return Err(EditError::HistoryWhileEditing);
        }
        self.arena.check(root)
    }

    /// Applies ops in a transaction that is neither normalized nor recorded
    fn replay<'a>(
        &mut self,
        ops: impl Iterator<Item = &'a Op>,
        apply: fn(&Op, &mut MarkdownTree) -> Result<(), EditError>,
    ) -> Result<(), EditError> {
        self.begin(Mode::Replay);
        let applied = ops.into_iter().try_for_each(|op| apply(op, self));
        let committed = self.finish(None, None);
        applied.and(committed.map(drop))
    }
}

impl fmt::Debug for MarkdownTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownTree")
            .field("root", &self.root)
            .field("nodes", &self.arena.len())
            .field("depth", &self.tx.depth)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

/// An open edit scope.
///
/// Dereferences to the tree so mutations are called on the scope. Dropping
/// an uncommitted scope commits it; committing twice is impossible because
/// [`commit`](EditScope::commit) consumes the scope.
pub struct EditScope<'t> {
    tree: &'t mut MarkdownTree,
    done: bool,
}

impl EditScope<'_> {
    /// Closes the scope. The outermost scope returns the ops of the whole
    /// transaction, nested scopes return nothing.
    pub fn commit(mut self, start_focus: Option<Focus>, end_focus: Option<Focus>) -> Result<Vec<Op>, EditError> {
        self.done = true;
        self.tree.finish(start_focus, end_focus)
    }
}

impl Deref for EditScope<'_> {
    type Target = MarkdownTree;

    fn deref(&self) -> &MarkdownTree {
        self.tree
    }
}

impl DerefMut for EditScope<'_> {
    fn deref_mut(&mut self) -> &mut MarkdownTree {
        self.tree
    }
}

impl Drop for EditScope<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if std::thread::panicking() {
            self.tree.abandon();
        } else if let Err(error) = self.tree.finish(None, None) {
            warn!(%error, "Edit scope dropped with an error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_new_tree_is_connected() {
        let tree = MarkdownTree::parse("# A\ntext\n* item");
        let root = tree.node(tree.root()).unwrap();
        assert!(root.is_connected());
        assert!(tree.arena.descendants(tree.root()).iter().all(|n| tree.arena[*n].connected));
    }

    #[test]
    fn test_construction_normalizes_outside_history() {
        let tree = MarkdownTree::new(Node::document(vec![
            Node::section("# ", "a", vec![]),
            Node::paragraph("body"),
            Node::list(vec![]),
        ]));

        assert_eq!(
            tree.export(tree.root()).unwrap(),
            Node::document(vec![Node::section("# ", "a", vec![Node::paragraph("body")])])
        );
        assert!(!tree.is_editing());
        assert!(!tree.can_undo());
    }

    #[test]
    fn test_replay_applies_ops_verbatim() {
        let mut tree = MarkdownTree::parse("* a\n\nb");
        let list = tree.node(tree.root()).unwrap().first_child().unwrap();
        let item = tree.node(list).unwrap().first_child().unwrap();

        // a normal commit would prune the emptied list
        let op = Op::Remove {
            node: item,
            parent: list,
            next_sibling: None,
        };
        tree.replay(std::iter::once(&op), Op::redo).unwrap();

        let list = tree.node(list).unwrap();
        assert!(list.is_connected());
        assert_eq!(list.first_child(), None);
        assert!(!tree.node(item).unwrap().is_connected());
        assert!(!tree.can_undo());
    }

    #[test]
    fn test_nested_scopes_commit_once() {
        let mut tree = MarkdownTree::new(Node::document(vec![Node::paragraph("a")]));
        let para = tree.node(tree.root()).unwrap().first_child().unwrap();

        let mut outer = tree.edit();
        {
            let mut inner = outer.edit();
            inner.remove(para).unwrap();
            assert!(inner.commit(None, None).unwrap().is_empty());
        }
        assert!(outer.is_editing());
        let ops = outer.commit(None, None).unwrap();

        assert_eq!(ops.len(), 1);
        assert!(!tree.is_editing());
        assert!(!tree.node(para).unwrap().is_connected());
    }

    #[test]
    fn test_dropped_scope_commits() {
        let mut tree = MarkdownTree::new(Node::document(vec![Node::paragraph("a")]));
        let para = tree.node(tree.root()).unwrap().first_child().unwrap();
        {
            let mut scope = tree.edit();
            scope.remove(para).unwrap();
        }
        assert!(!tree.is_editing());
        assert!(tree.can_undo());
    }

    #[test]
    fn test_tree_observer_sees_new_root_version() {
        let mut tree = MarkdownTree::new(Node::document(vec![Node::paragraph("a")]));
        let para = tree.node(tree.root()).unwrap().first_child().unwrap();
        let versions = Rc::new(RefCell::new(Vec::new()));
        let seen = versions.clone();
        tree.subscribe_tree(move |v| seen.borrow_mut().push(*v));

        tree.transact(|t| t.remove(para)).unwrap();
        tree.transact(|_| Ok(())).unwrap();

        let root_version = tree.node(tree.root()).unwrap().version();
        assert_eq!(*versions.borrow(), vec![root_version]);
    }

    #[test]
    fn test_history_rejected_while_editing() {
        let mut tree = MarkdownTree::parse("text");
        let root = tree.root();
        let mut scope = tree.edit();
        assert_eq!(scope.undo(root), Err(EditError::HistoryWhileEditing));
    }

    #[test]
    fn test_panicking_scope_releases_depth() {
        let mut tree = MarkdownTree::parse("text");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = tree.edit();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!tree.is_editing());
        assert!(!tree.signals.is_suspended());
    }
}
