//! # Content Mutations
//!
//! Text edits on content nodes. The inline parse tree of a node is built on
//! first use and afterwards kept in step with edits incrementally: an edit
//! only marks the affected window stale, and the next read re-lexes it.
//!
//! Typing a block prefix into a paragraph (`* `, `> `, `# `, a fence...)
//! promotes it: the text is parsed as blocks which replace the paragraph.

use crate::arena::Slot;
use crate::{EditError, MarkdownTree, NodeId, Op};
use outline_parser::{looks_like_block, parse_blocks, parse_inner_blocks, InlineTree, Node, NodeKind, TextEdit};
use tracing::{debug, trace};

/// Result of [`MarkdownTree::edit_content`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit left the text as it was
    Unchanged,
    /// The content was updated in place
    Edited,
    /// The paragraph was replaced by these block nodes
    Promoted(Vec<NodeId>),
}

impl MarkdownTree {
    /// Replaces `content[edit.start..edit.old_end]` with `edit.new_text`,
    /// promoting paragraphs that now start with a block prefix.
    pub fn edit_content(&mut self, node: NodeId, edit: TextEdit) -> Result<EditOutcome, EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let slot = &self.arena[node];
        let kind = slot.kind();
        let Some(content) = slot.data.content() else {
            return Err(EditError::NotApplicable { op: "edit_content", kind });
        };

        let updated = edit.apply(content)?;
        if updated == content {
            return Ok(EditOutcome::Unchanged);
        }

        if kind == NodeKind::Paragraph && looks_like_block(&updated) {
            if let Some(parent) = slot.parent {
                let blocks = match self.arena[parent].kind() {
                    NodeKind::Document | NodeKind::Section => parse_blocks(&updated),
                    _ => parse_inner_blocks(&updated),
                };
                let unchanged_paragraph =
                    matches!(blocks.as_slice(), [Node::Paragraph { content }] if *content == updated);
                if !blocks.is_empty() && !unchanged_paragraph {
                    return self.promote(node, parent, blocks).map(EditOutcome::Promoted);
                }
            }
        }

        self.apply_text_edit(node, &edit)?;
        Ok(EditOutcome::Edited)
    }

    /// Replaces the whole content of a node
    pub fn set_content(&mut self, node: NodeId, text: impl Into<String>) -> Result<EditOutcome, EditError> {
        let node = self.arena.check(node)?;
        let len = self.arena[node].data.content().map_or(0, str::len);
        self.edit_content(node, TextEdit::replace(0, len, text))
    }

    fn promote(&mut self, node: NodeId, parent: NodeId, blocks: Vec<Node>) -> Result<Vec<NodeId>, EditError> {
        let mut created = Vec::with_capacity(blocks.len());
        for block in blocks {
            let id = self.arena.wrap(block);
            self.insert_before(id, parent, Some(node))?;
            created.push(id);
        }
        self.remove(node)?;

        debug!(%node, blocks = created.len(), "Promoted paragraph to blocks");
        Ok(created)
    }

    /// In-place content update, also used to replay history
    pub(crate) fn apply_text_edit(&mut self, node: NodeId, edit: &TextEdit) -> Result<(), EditError> {
        self.ensure_editing()?;
        let node = self.arena.check(node)?;
        let kind = self.arena[node].kind();

        let Slot { data, inline, .. } = &mut self.arena[node];
        let Some(content) = data.content_mut() else {
            return Err(EditError::NotApplicable { op: "edit_content", kind });
        };
        let updated = edit.apply(content)?;
        if updated == *content {
            return Ok(());
        }
        let inverse = edit.invert(content)?;
        *content = updated;
        if let Some(inline) = inline {
            inline.edit(edit);
        }

        self.stamp(node);
        self.tx.ops.push(Op::Edit {
            node,
            edit: edit.clone(),
            inverse,
        });
        self.signals.notify(node);

        trace!(%node, start = edit.start, old_end = edit.old_end, new_end = edit.new_end, "Edited content");
        Ok(())
    }

    /// Inline parse tree of a content node, re-lexed if an edit left it stale
    pub fn inline_tree(&mut self, node: NodeId) -> Result<&InlineTree, EditError> {
        let node = self.arena.check(node)?;
        let kind = self.arena[node].kind();
        if !kind.has_inline() {
            return Err(EditError::NotApplicable { op: "inline_tree", kind });
        }

        let Slot { data, inline, .. } = &mut self.arena[node];
        let text = data.content().unwrap_or_default();
        let tree = inline.get_or_insert_with(|| InlineTree::parse(text));
        if tree.is_stale() {
            tree.reparse(text);
        }
        Ok(tree)
    }

    /// Wiki-link targets in a node's content
    pub fn links(&mut self, node: NodeId) -> Result<Vec<String>, EditError> {
        self.inline_tree(node)?;
        let slot = &self.arena[node];
        Ok(match (&slot.inline, slot.data.content()) {
            (Some(tree), Some(text)) => tree.links(text).into_iter().map(str::to_string).collect(),
            _ => Vec::new(),
        })
    }

    /// `#tags` in a node's content
    pub fn tags(&mut self, node: NodeId) -> Result<Vec<String>, EditError> {
        self.inline_tree(node)?;
        let slot = &self.arena[node];
        Ok(match (&slot.inline, slot.data.content()) {
            (Some(tree), Some(text)) => tree.tags(text).into_iter().map(str::to_string).collect(),
            _ => Vec::new(),
        })
    }
}
