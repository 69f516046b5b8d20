use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw outline node.
///
/// This is the shape handed to the editor when a tree is constructed or a
/// node is added, and the shape produced when a subtree is exported. It
/// carries no structural links: children are owned by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Document {
        #[serde(default)]
        children: Vec<Node>,
    },

    /// ATX heading that owns the blocks following it
    Section {
        marker: String,
        content: String,
        #[serde(default)]
        children: Vec<Node>,
    },

    List {
        #[serde(default)]
        children: Vec<Node>,
    },

    ListItem {
        marker: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(default)]
        children: Vec<Node>,
    },

    BlockQuote {
        marker: String,
        #[serde(default)]
        children: Vec<Node>,
    },

    Paragraph { content: String },

    /// Heading that cannot own blocks (inside list items and quotes)
    Heading { marker: String, content: String },

    /// Fenced code, content includes the fences
    CodeBlock { content: String },
}

/// Discriminant of [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Document,
    Section,
    List,
    ListItem,
    BlockQuote,
    Paragraph,
    Heading,
    CodeBlock,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::Section
                | NodeKind::List
                | NodeKind::ListItem
                | NodeKind::BlockQuote
        )
    }

    pub fn has_content(self) -> bool {
        matches!(
            self,
            NodeKind::Section | NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock
        )
    }

    pub fn has_marker(self) -> bool {
        matches!(
            self,
            NodeKind::Section | NodeKind::ListItem | NodeKind::BlockQuote | NodeKind::Heading
        )
    }

    /// Content of these kinds is inline markdown and gets an inline parse tree
    pub fn has_inline(self) -> bool {
        matches!(
            self,
            NodeKind::Section | NodeKind::Paragraph | NodeKind::Heading
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Section => "section",
            NodeKind::List => "list",
            NodeKind::ListItem => "list-item",
            NodeKind::BlockQuote => "block-quote",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::CodeBlock => "code-block",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    pub fn document(children: Vec<Node>) -> Self {
        Node::Document { children }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Node::Paragraph {
            content: content.into(),
        }
    }

    pub fn section(marker: impl Into<String>, content: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Section {
            marker: marker.into(),
            content: content.into(),
            children,
        }
    }

    pub fn list(children: Vec<Node>) -> Self {
        Node::List { children }
    }

    pub fn list_item(marker: impl Into<String>, children: Vec<Node>) -> Self {
        Node::ListItem {
            marker: marker.into(),
            checked: None,
            children,
        }
    }

    pub fn block_quote(children: Vec<Node>) -> Self {
        Node::BlockQuote {
            marker: "> ".to_string(),
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document { .. } => NodeKind::Document,
            Node::Section { .. } => NodeKind::Section,
            Node::List { .. } => NodeKind::List,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::BlockQuote { .. } => NodeKind::BlockQuote,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children }
            | Node::Section { children, .. }
            | Node::List { children }
            | Node::ListItem { children, .. }
            | Node::BlockQuote { children, .. } => children,
            Node::Paragraph { .. } | Node::Heading { .. } | Node::CodeBlock { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children }
            | Node::Section { children, .. }
            | Node::List { children }
            | Node::ListItem { children, .. }
            | Node::BlockQuote { children, .. } => Some(children),
            Node::Paragraph { .. } | Node::Heading { .. } | Node::CodeBlock { .. } => None,
        }
    }

    /// Splits the node into its own fields and its children
    pub fn into_parts(self) -> (Node, Vec<Node>) {
        match self {
            Node::Document { children } => (Node::Document { children: vec![] }, children),
            Node::Section {
                marker,
                content,
                children,
            } => (
                Node::Section {
                    marker,
                    content,
                    children: vec![],
                },
                children,
            ),
            Node::List { children } => (Node::List { children: vec![] }, children),
            Node::ListItem {
                marker,
                checked,
                children,
            } => (
                Node::ListItem {
                    marker,
                    checked,
                    children: vec![],
                },
                children,
            ),
            Node::BlockQuote { marker, children } => (
                Node::BlockQuote {
                    marker,
                    children: vec![],
                },
                children,
            ),
            leaf => (leaf, vec![]),
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Node::Section { content, .. }
            | Node::Paragraph { content }
            | Node::Heading { content, .. }
            | Node::CodeBlock { content } => Some(content),
            _ => None,
        }
    }

    pub fn content_mut(&mut self) -> Option<&mut String> {
        match self {
            Node::Section { content, .. }
            | Node::Paragraph { content }
            | Node::Heading { content, .. }
            | Node::CodeBlock { content } => Some(content),
            _ => None,
        }
    }

    pub fn marker_mut(&mut self) -> Option<&mut String> {
        match self {
            Node::Section { marker, .. }
            | Node::ListItem { marker, .. }
            | Node::BlockQuote { marker, .. }
            | Node::Heading { marker, .. } => Some(marker),
            _ => None,
        }
    }

    pub fn marker(&self) -> Option<&str> {
        match self {
            Node::Section { marker, .. }
            | Node::ListItem { marker, .. }
            | Node::BlockQuote { marker, .. }
            | Node::Heading { marker, .. } => Some(marker),
            _ => None,
        }
    }

    /// Heading depth of a section or heading marker (`"## "` is 2)
    pub fn depth(&self) -> Option<usize> {
        match self {
            Node::Section { marker, .. } | Node::Heading { marker, .. } => Some(heading_depth(marker)),
            _ => None,
        }
    }
}

pub fn heading_depth(marker: &str) -> usize {
    marker.trim().chars().take_while(|c| *c == '#').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_json_shape() {
        let node = Node::list(vec![Node::list_item("* ", vec![Node::paragraph("item")])]);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "list");
        assert_eq!(json["children"][0]["type"], "list-item");
        assert_eq!(json["children"][0]["marker"], "* ");
        assert!(json["children"][0].get("checked").is_none());
        assert_eq!(json["children"][0]["children"][0]["content"], "item");
    }

    #[test]
    fn test_into_parts_keeps_fields() {
        let section = Node::section("## ", "Title", vec![Node::paragraph("body")]);
        let (shell, children) = section.into_parts();

        assert_eq!(shell, Node::section("## ", "Title", vec![]));
        assert_eq!(children, vec![Node::paragraph("body")]);
    }

    #[test]
    fn test_marker_kinds_carry_markers() {
        let heading = Node::Heading {
            marker: "# ".to_string(),
            content: "x".to_string(),
        };
        let code = Node::CodeBlock {
            content: "```".to_string(),
        };
        let marked = [
            Node::section("# ", "x", vec![]),
            Node::list_item("* ", vec![]),
            Node::block_quote(vec![]),
            heading,
        ];
        let unmarked = [Node::document(vec![]), Node::list(vec![]), Node::paragraph("x"), code];

        for node in &marked {
            assert!(node.kind().has_marker(), "{} should have a marker", node.kind());
            assert!(node.marker().is_some());
        }
        for node in &unmarked {
            assert!(!node.kind().has_marker(), "{} should not have a marker", node.kind());
            assert!(node.marker().is_none());
        }
    }

    #[test]
    fn test_heading_depth() {
        assert_eq!(heading_depth("# "), 1);
        assert_eq!(heading_depth("### "), 3);
        assert_eq!(Node::section("## ", "x", vec![]).depth(), Some(2));
        assert_eq!(Node::paragraph("## x").depth(), None);
    }
}
