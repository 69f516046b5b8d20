//! # Normalization
//!
//! Edits may leave the tree in shapes markdown cannot express. Before an
//! outermost scope commits, the normalizer repairs them with ordinary
//! mutations, so repairs are recorded, undone and observed like any edit.
//!
//! Passes run in order:
//! - [`PruneEmptyContainers`]: drop childless lists, list items and quotes
//! - [`MergeAdjacentLists`]: join lists that ended up side by side
//! - [`NestSections`]: re-nest sections by heading depth
//! - [`MergeAdjacentLists`] again, since re-nesting can bring lists together
//!
//! Each pass is idempotent; a well-formed tree produces no mutations.

use crate::{EditError, MarkdownTree, NodeId};
use outline_parser::NodeKind;
use std::collections::HashMap;
use tracing::debug;

/// A repair run over the whole tree
pub trait NormalizePass: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Applies the repair, returning the number of nodes it moved or removed
    fn run(&self, tree: &mut MarkdownTree) -> Result<usize, EditError>;
}

/// Removes `list`, `list-item` and `block-quote` nodes without children,
/// including parents emptied by the removal
#[derive(Debug)]
pub struct PruneEmptyContainers;

impl NormalizePass for PruneEmptyContainers {
    fn name(&self) -> &'static str {
        "prune-empty-containers"
    }

    fn run(&self, tree: &mut MarkdownTree) -> Result<usize, EditError> {
        let mut pruned = 0;
        // children come before their parents in reverse pre-order
        for node in tree.arena.descendants(tree.root).into_iter().rev() {
            let slot = &tree.arena[node];
            let prunable = matches!(
                slot.kind(),
                NodeKind::List | NodeKind::ListItem | NodeKind::BlockQuote
            );
            if prunable && slot.first.is_none() && slot.parent.is_some() {
                tree.remove(node)?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }
}

/// Moves the items of a list into the list right before it
#[derive(Debug)]
pub struct MergeAdjacentLists;

impl NormalizePass for MergeAdjacentLists {
    fn name(&self) -> &'static str {
        "merge-adjacent-lists"
    }

    fn run(&self, tree: &mut MarkdownTree) -> Result<usize, EditError> {
        let mut merged = 0;
        for node in tree.arena.descendants(tree.root) {
            if tree.arena[node].kind() != NodeKind::List || tree.arena[node].parent.is_none() {
                continue;
            }
            while let Some(next) = tree.arena[node].next {
                if tree.arena[next].kind() != NodeKind::List {
                    break;
                }
                let items: Vec<NodeId> = tree.arena.children(next).collect();
                for item in items {
                    tree.append(item, node)?;
                }
                tree.remove(next)?;
                merged += 1;
            }
        }
        Ok(merged)
    }
}

/// Rebuilds section nesting from heading depth.
///
/// Reading the document top to bottom, a section closes every open section
/// at its depth or deeper and opens under the one left on top; any other
/// block belongs to the innermost open section.
#[derive(Debug)]
pub struct NestSections;

impl NestSections {
    /// Document-order walk of the root's children, descending into sections
    fn linearize(tree: &MarkdownTree, parent: NodeId, out: &mut Vec<NodeId>) {
        for child in tree.arena.children(parent) {
            out.push(child);
            if tree.arena[child].kind() == NodeKind::Section {
                Self::linearize(tree, child, out);
            }
        }
    }
}

impl NormalizePass for NestSections {
    fn name(&self) -> &'static str {
        "nest-sections"
    }

    fn run(&self, tree: &mut MarkdownTree) -> Result<usize, EditError> {
        let root = tree.root;
        let mut order = Vec::new();
        Self::linearize(tree, root, &mut order);

        let mut open: Vec<(NodeId, usize)> = Vec::new();
        let mut last_placed: HashMap<NodeId, NodeId> = HashMap::new();
        let mut moved = 0;

        for node in order {
            let depth = tree.arena[node].data.depth().filter(|_| tree.arena[node].kind() == NodeKind::Section);
            if let Some(depth) = depth {
                while open.last().is_some_and(|(_, d)| *d >= depth) {
                    open.pop();
                }
            }
            let parent = open.last().map_or(root, |(section, _)| *section);

            let next = match last_placed.get(&parent) {
                Some(prev) => tree.arena[*prev].next,
                None => tree.arena[parent].first,
            };
            if next != Some(node) {
                tree.insert_before(node, parent, next)?;
                moved += 1;
            }
            last_placed.insert(parent, node);

            if let Some(depth) = depth {
                open.push((node, depth));
            }
        }
        Ok(moved)
    }
}

/// Runs the normalization passes in order
#[derive(Debug)]
pub struct Normalizer {
    passes: Vec<Box<dyn NormalizePass>>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(PruneEmptyContainers),
                Box::new(MergeAdjacentLists),
                Box::new(NestSections),
                Box::new(MergeAdjacentLists),
            ],
        }
    }

    /// Placeholder held by the tree while the real normalizer runs
    pub(crate) fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn run(&self, tree: &mut MarkdownTree) -> Result<usize, EditError> {
        let mut total = 0;
        for pass in &self.passes {
            let count = pass.run(tree)?;
            if count > 0 {
                debug!(pass = pass.name(), count, "Normalized tree");
            }
            total += count;
        }
        Ok(total)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_parser::Node;

    #[test]
    fn test_normalizer_creation() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.passes.len(), 4);
        assert_eq!(normalizer.passes[2].name(), "nest-sections");
    }

    #[test]
    fn test_well_formed_tree_needs_no_repair() {
        let mut tree = MarkdownTree::parse("intro\n# A\ntext\n## B\n* x\n* y\n# C\n> quote");
        let before = tree.export(tree.root()).unwrap();
        let mut scope = tree.edit();
        assert_eq!(Normalizer::new().run(&mut scope).unwrap(), 0);
        assert!(scope.commit(None, None).unwrap().is_empty());
        assert_eq!(tree.export(tree.root()).unwrap(), before);
    }

    #[test]
    fn test_prune_walks_upward() {
        let mut tree = MarkdownTree::new(Node::document(vec![Node::block_quote(vec![Node::list(vec![
            Node::list_item("* ", vec![Node::paragraph("x")]),
        ])])]));
        let quote = tree.node(tree.root()).unwrap().first_child().unwrap();
        let list = tree.node(quote).unwrap().first_child().unwrap();
        let item = tree.node(list).unwrap().first_child().unwrap();
        let para = tree.node(item).unwrap().first_child().unwrap();

        tree.transact(|t| t.remove(para)).unwrap();

        assert_eq!(tree.export(tree.root()).unwrap(), Node::document(vec![]));
        for node in [quote, list, item, para] {
            assert!(!tree.node(node).unwrap().is_connected());
        }
    }

    #[test]
    fn test_adjacent_lists_merge() {
        let mut tree = MarkdownTree::new(Node::document(vec![
            Node::list(vec![Node::list_item("* ", vec![Node::paragraph("a")])]),
            Node::paragraph("gap"),
            Node::list(vec![Node::list_item("* ", vec![Node::paragraph("b")])]),
        ]));
        let gap = tree.node(tree.root()).unwrap().children().nth(1).unwrap();

        tree.transact(|t| t.remove(gap)).unwrap();

        assert_eq!(
            tree.export(tree.root()).unwrap(),
            Node::document(vec![Node::list(vec![
                Node::list_item("* ", vec![Node::paragraph("a")]),
                Node::list_item("* ", vec![Node::paragraph("b")]),
            ])])
        );
    }

    #[test]
    fn test_sections_nest_by_depth() {
        let mut tree = MarkdownTree::new(Node::document(vec![]));
        let root = tree.root();
        let a = tree.add(Node::section("# ", "a", vec![]));
        let b = tree.add(Node::section("## ", "b", vec![]));
        let c = tree.add(Node::section("# ", "c", vec![]));

        tree.transact(|t| {
            for node in [a, b, c] {
                t.append(node, root)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(
            tree.export(root).unwrap(),
            Node::document(vec![
                Node::section("# ", "a", vec![Node::section("## ", "b", vec![])]),
                Node::section("# ", "c", vec![]),
            ])
        );
    }

    #[test]
    fn test_trailing_blocks_move_into_section() {
        let mut tree = MarkdownTree::new(Node::document(vec![
            Node::paragraph("intro"),
            Node::section("# ", "a", vec![]),
        ]));
        let root = tree.root();
        let para = tree.add(Node::paragraph("body"));

        tree.transact(|t| t.append(para, root)).unwrap();

        assert_eq!(
            tree.export(root).unwrap(),
            Node::document(vec![
                Node::paragraph("intro"),
                Node::section("# ", "a", vec![Node::paragraph("body")]),
            ])
        );
    }

    #[test]
    fn test_demoted_section_releases_followers() {
        let mut tree = MarkdownTree::parse("# a\n## b\ntext\n## c");
        let a = tree.node(tree.root()).unwrap().first_child().unwrap();
        let b = tree.node(a).unwrap().first_child().unwrap();

        // promoting b to depth 1 makes it a sibling of a, taking c along
        tree.transact(|t| t.update_marker(b, "# ")).unwrap();

        assert_eq!(
            tree.export(tree.root()).unwrap(),
            Node::document(vec![
                Node::section("# ", "a", vec![]),
                Node::section("# ", "b", vec![
                    Node::paragraph("text"),
                    Node::section("## ", "c", vec![]),
                ]),
            ])
        );
    }
}
