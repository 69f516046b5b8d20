//! # Node Mutations
//!
//! Structural and scalar-field mutations. Each one requires an open edit
//! scope, stamps a fresh version, records an [`Op`] and notifies the
//! affected node's observers (queued until commit).

use crate::{EditError, MarkdownTree, NodeId, Op};
use outline_parser::{Node, NodeKind};
use tracing::trace;

impl MarkdownTree {
    pub(crate) fn ensure_editing(&self) -> Result<(), EditError> {
        if self.tx.depth == 0 {
            return Err(EditError::NotEditing);
        }
        Ok(())
    }

    /// Stamps a new version on `node` and its ancestors, and on descendants
    /// that are not connected yet
    pub(crate) fn stamp(&mut self, node: NodeId) {
        let version = self.arena.tick();

        let mut cur = Some(node);
        while let Some(n) = cur {
            self.arena[n].version = version;
            cur = self.arena[n].parent;
        }

        let mut pending: Vec<NodeId> = self.disconnected_children(node);
        while let Some(n) = pending.pop() {
            self.arena[n].version = version;
            pending.extend(self.disconnected_children(n));
        }
    }

    fn disconnected_children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .children(node)
            .filter(|c| !self.arena[*c].connected)
            .collect()
    }

    /// Detaches `node` from its parent. The node keeps its subtree and can
    /// be inserted again.
    pub fn remove(&mut self, node: NodeId) -> Result<(), EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let Some(parent) = self.arena[node].parent else {
            return Err(EditError::Detached(node));
        };
        let next_sibling = self.arena[node].next;

        // stamp while the ancestor chain is still reachable
        self.stamp(node);
        self.arena.unlink(node);
        self.tx.removed.insert(node);
        self.tx.ops.push(Op::Remove {
            node,
            parent,
            next_sibling,
        });
        self.signals.notify(parent);

        trace!(%node, %parent, "Removed node");
        Ok(())
    }

    /// Moves `node` under `parent`, before `next_sibling` or at the end.
    /// Does nothing if the node is already there.
    pub fn insert_before(
        &mut self,
        node: NodeId,
        parent: NodeId,
        next_sibling: Option<NodeId>,
    ) -> Result<(), EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let parent = self.arena.check(parent)?;
        if let Some(next) = next_sibling {
            self.arena.check(next)?;
        }

        let kind = self.arena[node].kind();
        if kind == NodeKind::Document {
            return Err(EditError::NotApplicable {
                op: "insert_before",
                kind,
            });
        }
        if !self.arena[parent].kind().is_container() {
            return Err(EditError::NotAContainer(parent));
        }

        let current_parent = self.arena[node].parent;
        if let Some(next) = next_sibling {
            if self.arena[next].parent != Some(parent) {
                return Err(EditError::NotAChild { parent, next });
            }
            if next == node {
                return Ok(());
            }
        }
        if current_parent == Some(parent) && self.arena[node].next == next_sibling {
            return Ok(());
        }
        if self.arena.contains(node, parent) {
            return Err(EditError::Cycle { node, parent });
        }

        if current_parent.is_some() {
            self.remove(node)?;
        }
        self.arena.link(node, parent, next_sibling);
        self.stamp(node);
        self.tx.ops.push(Op::Insert {
            node,
            parent,
            next_sibling,
        });
        self.signals.notify(parent);

        trace!(%node, %parent, "Inserted node");
        Ok(())
    }

    /// Appends `node` as the last child of `parent`
    pub fn append(&mut self, node: NodeId, parent: NodeId) -> Result<(), EditError> {
        self.insert_before(node, parent, None)
    }

    pub fn update_marker(&mut self, node: NodeId, marker: impl Into<String>) -> Result<(), EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let marker = marker.into();
        let kind = self.arena[node].kind();

        let Some(field) = self.arena[node].data.marker_mut() else {
            return Err(EditError::NotApplicable {
                op: "update_marker",
                kind,
            });
        };
        if *field == marker {
            return Ok(());
        }
        let old = std::mem::replace(field, marker.clone());

        self.stamp(node);
        self.tx.ops.push(Op::Marker { node, old, new: marker });
        self.signals.notify(node);
        Ok(())
    }

    /// Sets the checklist state of a list item (`None` removes the box)
    pub fn update_checked(&mut self, node: NodeId, checked: Option<bool>) -> Result<(), EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let kind = self.arena[node].kind();

        let Node::ListItem { checked: field, .. } = &mut self.arena[node].data else {
            return Err(EditError::NotApplicable {
                op: "update_checked",
                kind,
            });
        };
        if *field == checked {
            return Ok(());
        }
        let old = std::mem::replace(field, checked);

        self.stamp(node);
        self.tx.ops.push(Op::Check {
            node,
            old,
            new: checked,
        });
        self.signals.notify(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (MarkdownTree, Vec<NodeId>) {
        let tree = MarkdownTree::new(Node::document(vec![
            Node::paragraph("a"),
            Node::paragraph("b"),
            Node::list(vec![Node::list_item("* ", vec![Node::paragraph("c")])]),
        ]));
        let children = tree.node(tree.root()).unwrap().children().collect();
        (tree, children)
    }

    #[test]
    fn test_mutations_require_scope() {
        let (mut tree, ids) = tree();
        assert_eq!(tree.remove(ids[0]), Err(EditError::NotEditing));
        assert_eq!(tree.update_marker(ids[2], "- "), Err(EditError::NotEditing));
    }

    #[test]
    fn test_insert_at_current_position_is_noop() {
        let (mut tree, ids) = tree();
        let root = tree.root();
        let mut scope = tree.edit();

        scope.insert_before(ids[0], root, Some(ids[1])).unwrap();
        scope.insert_before(ids[0], root, Some(ids[0])).unwrap();
        scope.append(ids[2], root).unwrap();

        assert!(scope.commit(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_move_records_remove_then_insert() {
        let (mut tree, ids) = tree();
        let root = tree.root();
        let mut scope = tree.edit();
        scope.append(ids[0], root).unwrap();
        let ops = scope.commit(None, None).unwrap();

        assert_eq!(
            ops,
            vec![
                Op::Remove {
                    node: ids[0],
                    parent: root,
                    next_sibling: Some(ids[1]),
                },
                Op::Insert {
                    node: ids[0],
                    parent: root,
                    next_sibling: None,
                },
            ]
        );
    }

    #[test]
    fn test_insert_rejects_cycles_and_leaves() {
        let (mut tree, ids) = tree();
        let item = tree.node(ids[2]).unwrap().first_child().unwrap();
        let root = tree.root();
        let mut scope = tree.edit();

        assert_eq!(
            scope.insert_before(ids[2], item, None),
            Err(EditError::Cycle {
                node: ids[2],
                parent: item
            })
        );
        assert_eq!(scope.insert_before(ids[1], ids[0], None), Err(EditError::NotAContainer(ids[0])));
        assert_eq!(
            scope.insert_before(ids[0], root, Some(item)),
            Err(EditError::NotAChild { parent: root, next: item })
        );
        assert!(matches!(
            scope.insert_before(root, ids[2], None),
            Err(EditError::NotApplicable { .. })
        ));
    }

    #[test]
    fn test_remove_detached_node_fails() {
        let (mut tree, ids) = tree();
        let mut scope = tree.edit();
        scope.remove(ids[0]).unwrap();
        assert_eq!(scope.remove(ids[0]), Err(EditError::Detached(ids[0])));
    }

    #[test]
    fn test_scalar_updates() {
        let (mut tree, ids) = tree();
        let item = tree.node(ids[2]).unwrap().first_child().unwrap();
        let mut scope = tree.edit();

        scope.update_marker(item, "* ").unwrap();
        scope.update_marker(item, "- ").unwrap();
        scope.update_checked(item, Some(false)).unwrap();
        assert!(matches!(
            scope.update_checked(ids[0], Some(true)),
            Err(EditError::NotApplicable { op: "update_checked", .. })
        ));
        assert!(matches!(
            scope.update_marker(ids[0], "# "),
            Err(EditError::NotApplicable { op: "update_marker", .. })
        ));
        let ops = scope.commit(None, None).unwrap();

        assert_eq!(ops.len(), 2);
        let item = tree.node(item).unwrap();
        assert_eq!(item.marker(), Some("- "));
        assert_eq!(item.checked(), Some(false));
    }

    #[test]
    fn test_stamp_propagates_to_ancestors() {
        let (mut tree, ids) = tree();
        let item = tree.node(ids[2]).unwrap().first_child().unwrap();
        let before = tree.node(ids[0]).unwrap().version();

        tree.transact(|t| t.update_checked(item, Some(true))).unwrap();

        let version = tree.node(item).unwrap().version();
        assert!(version > before);
        assert_eq!(tree.node(ids[2]).unwrap().version(), version);
        assert_eq!(tree.node(tree.root()).unwrap().version(), version);
        assert_eq!(tree.node(ids[0]).unwrap().version(), before);
    }
}
