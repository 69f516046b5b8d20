//! # Node Arena
//!
//! Every node of a tree lives in one slot of an append-only arena and is
//! addressed by a [`NodeId`]. Structural links (parent, siblings, first and
//! last child) are ids, so moving a node is a handful of id swaps.
//!
//! Slots are never freed: a removed node keeps its slot so that undo can put
//! the very same node back.

use crate::EditError;
use outline_parser::{InlineTree, Node, NodeKind};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(1);

/// Handle of a node inside one tree.
///
/// The handle remembers which tree allocated it; using it with another tree
/// fails with [`EditError::ForeignNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u32,
    index: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index)
    }
}

/// Per-node view-model state: links, version and lifecycle flag
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    /// Node fields with an always-empty child list
    pub data: Node,
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    pub first: Option<NodeId>,
    pub last: Option<NodeId>,
    pub version: u64,
    pub connected: bool,
    /// Lazily built, `None` until first requested
    pub inline: Option<InlineTree>,
}

impl Slot {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }
}

#[derive(Debug)]
pub(crate) struct Arena {
    tree: u32,
    slots: Vec<Slot>,
    clock: u64,
}

impl Arena {
    pub fn new() -> Self {
        Self {
            tree: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            clock: 0,
        }
    }

    pub fn check(&self, id: NodeId) -> Result<NodeId, EditError> {
        if id.tree == self.tree && (id.index as usize) < self.slots.len() {
            Ok(id)
        } else {
            Err(EditError::ForeignNode(id))
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Recursively wraps a raw node, linking its children in order
    pub fn wrap(&mut self, raw: Node) -> NodeId {
        let (shell, children) = raw.into_parts();
        let id = NodeId {
            tree: self.tree,
            index: self.slots.len() as u32,
        };
        self.slots.push(Slot {
            data: shell,
            parent: None,
            prev: None,
            next: None,
            first: None,
            last: None,
            version: self.clock,
            connected: false,
            inline: None,
        });

        let mut prev: Option<NodeId> = None;
        for child in children {
            let child = self.wrap(child);
            self[child].parent = Some(id);
            self[child].prev = prev;
            match prev {
                Some(p) => self[p].next = Some(child),
                None => self[id].first = Some(child),
            }
            prev = Some(child);
        }
        self[id].last = prev;
        id
    }

    /// Deep copy of a subtree with all view-model state stripped
    pub fn export(&self, id: NodeId) -> Node {
        let mut node = self[id].data.clone();
        if let Some(children) = node.children_mut() {
            children.extend(self.children(id).map(|child| self.export(child)));
        }
        node
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            arena: self,
            next: self[id].first,
        }
    }

    /// Pre-order walk of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut child = self[node].last;
            while let Some(c) = child {
                stack.push(c);
                child = self[c].prev;
            }
        }
        out
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self[n].parent;
        }
        false
    }

    /// Splices a parentless node in before `next`, or at the end
    pub fn link(&mut self, node: NodeId, parent: NodeId, next: Option<NodeId>) {
        let prev = match next {
            Some(n) => self[n].prev,
            None => self[parent].last,
        };

        self[node].parent = Some(parent);
        self[node].prev = prev;
        self[node].next = next;

        match prev {
            Some(p) => self[p].next = Some(node),
            None => self[parent].first = Some(node),
        }
        match next {
            Some(n) => self[n].prev = Some(node),
            None => self[parent].last = Some(node),
        }
    }

    pub fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self[node].parent else {
            return;
        };
        let prev = self[node].prev;
        let next = self[node].next;

        match prev {
            Some(p) => self[p].next = next,
            None => self[parent].first = next,
        }
        match next {
            Some(n) => self[n].prev = prev,
            None => self[parent].last = prev,
        }

        let slot = &mut self[node];
        slot.parent = None;
        slot.prev = None;
        slot.next = None;
    }
}

impl Index<NodeId> for Arena {
    type Output = Slot;

    fn index(&self, id: NodeId) -> &Slot {
        &self.slots[id.index as usize]
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.index as usize]
    }
}

pub struct Children<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.arena[current].next;
        Some(current)
    }
}

/// Read-only view of one node
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) arena: &'a Arena,
    pub(crate) id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn slot(&self) -> &'a Slot {
        &self.arena[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.slot().kind()
    }

    pub fn content(&self) -> Option<&'a str> {
        self.slot().data.content()
    }

    pub fn marker(&self) -> Option<&'a str> {
        self.slot().data.marker()
    }

    /// Checklist state of a list item, `None` when not a checklist item
    pub fn checked(&self) -> Option<bool> {
        match &self.slot().data {
            Node::ListItem { checked, .. } => *checked,
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.slot().parent
    }

    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.slot().prev
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.slot().next
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.slot().first
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.slot().last
    }

    pub fn children(&self) -> Children<'a> {
        self.arena.children(self.id)
    }

    pub fn version(&self) -> u64 {
        self.slot().version
    }

    pub fn is_connected(&self) -> bool {
        self.slot().connected
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("content", &self.content())
            .field("connected", &self.is_connected())
            .finish()
    }
}
