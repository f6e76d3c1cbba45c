//! Document tree.
//!
//! Nodes live in an arena owned by [`Tree`] and refer to each other by
//! [`NodeId`]. A node's parent link is a plain index, so there is no shared
//! ownership and dropping the tree frees every node without recursion.

use std::ops::Index;

use crate::store::ChainedMap;
use crate::{ParseError, TreeError};

/// Attribute name to value. First write wins on duplicate names.
pub type Attributes = ChainedMap<String, String>;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One markup element.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attributes: Attributes,
    pub(crate) text: String,
    pub(crate) self_closing: bool,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            text: String::new(),
            self_closing: false,
            children: Vec::new(),
            parent: None,
        }
    }

    /// A node written as a single `<tag .../>`.
    pub fn self_closing(tag: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.self_closing = true;
        node
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the node's text. Self-closing nodes cannot hold text.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), TreeError> {
        let text = text.into();
        if self.self_closing && !text.is_empty() {
            return Err(TreeError::SelfClosingContent {
                tag: self.tag.clone(),
            });
        }
        self.text = text;
        Ok(())
    }

    /// Add an attribute. Returns `false` and keeps the old value when the
    /// name is already present.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        self.attributes.insert(name.into(), value.into())
    }

    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A parsed document: one root element and everything below it.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tree's content with the document parsed from `source`.
    ///
    /// The previous content is discarded first, so a failed load leaves the
    /// tree empty rather than holding a partial document.
    pub fn load(&mut self, source: &str) -> Result<(), ParseError> {
        self.clear();
        *self = crate::Parser::parse(source)?;
        Ok(())
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of elements in the tree.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Install `node` as the root, discarding any previous content.
    pub fn set_root(&mut self, node: Node) -> NodeId {
        self.clear();
        self.attach(None, node)
    }

    /// Append `node` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId, TreeError> {
        let target = self.get(parent).ok_or(TreeError::UnknownNode(parent.0))?;
        if target.self_closing {
            return Err(TreeError::SelfClosingContent {
                tag: target.tag.clone(),
            });
        }
        Ok(self.attach(Some(parent), node))
    }

    /// Link a confirmed node into the arena. The caller guarantees `parent`
    /// exists and is not self-closing, and that `None` is only passed for the
    /// first node.
    pub(crate) fn attach(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.root = Some(id),
        }
        id
    }

    /// Distance from the root; the root itself has depth 0.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.get(id).and_then(Node::parent);
        while let Some(p) = cursor {
            depth += 1;
            cursor = self[p].parent;
        }
        depth
    }

    /// Every node id in document (pre-order) order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        order
    }

    /// Compare two trees by tags, attributes, self-closing flags,
    /// whitespace-collapsed text and child order. Arena layout is ignored.
    pub fn structurally_eq(&self, other: &Tree) -> bool {
        let mut stack = match (self.root, other.root) {
            (None, None) => return true,
            (Some(a), Some(b)) => vec![(a, b)],
            _ => return false,
        };

        while let Some((a, b)) = stack.pop() {
            let (a, b) = (&self[a], &other[b]);
            if a.tag != b.tag
                || a.self_closing != b.self_closing
                || a.attributes != b.attributes
                || a.children.len() != b.children.len()
                || collapse_whitespace(&a.text) != collapse_whitespace(&b.text)
            {
                return false;
            }
            stack.extend(a.children.iter().copied().zip(b.children.iter().copied()));
        }
        true
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::new("a"));
        let b = tree.append_child(root, Node::new("b")).unwrap();
        let c = tree.append_child(b, Node::self_closing("c")).unwrap();
        (tree, root, b, c)
    }

    #[test]
    fn test_empty_tree() {
        let tree = Tree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.size(), 0);
        assert!(tree.descendants().is_empty());
    }

    #[test]
    fn test_parent_links() {
        let (tree, root, b, c) = sample();
        assert_eq!(tree[root].parent(), None);
        assert_eq!(tree[b].parent(), Some(root));
        assert_eq!(tree[c].parent(), Some(b));
        assert_eq!(tree[root].children(), &[b]);
        assert_eq!(tree.depth(c), 2);
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn test_leaf_follows_children() {
        let (tree, root, _, c) = sample();
        assert!(!tree[root].is_leaf());
        assert!(tree[c].is_leaf());
    }

    #[test]
    fn test_self_closing_rejects_children() {
        let (mut tree, _, _, c) = sample();
        let err = tree.append_child(c, Node::new("d")).unwrap_err();
        assert_eq!(
            err,
            TreeError::SelfClosingContent {
                tag: "c".to_string()
            }
        );
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn test_self_closing_rejects_text() {
        let mut node = Node::self_closing("br");
        assert!(node.set_text("x").is_err());
        assert!(node.set_text("").is_ok());
        assert_eq!(node.text(), "");
    }

    #[test]
    fn test_unknown_parent() {
        let (mut tree, ..) = sample();
        let err = tree.append_child(NodeId(99), Node::new("x")).unwrap_err();
        assert_eq!(err, TreeError::UnknownNode(99));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::new("r"));
        let x = tree.append_child(root, Node::new("x")).unwrap();
        let y = tree.append_child(root, Node::new("y")).unwrap();
        let x1 = tree.append_child(x, Node::new("x1")).unwrap();
        assert_eq!(tree.descendants(), vec![root, x, x1, y]);
    }

    #[test]
    fn test_set_root_discards_previous() {
        let (mut tree, ..) = sample();
        tree.set_root(Node::new("z"));
        assert_eq!(tree.size(), 1);
        assert_eq!(tree[tree.root().unwrap()].tag, "z");
    }

    #[test]
    fn test_structural_equality_collapses_text() {
        let mut a = Tree::new();
        let ra = a.set_root(Node::new("p"));
        a.get_mut(ra).unwrap().set_text("one\n   two").unwrap();

        let mut b = Tree::new();
        let rb = b.set_root(Node::new("p"));
        b.get_mut(rb).unwrap().set_text("one two").unwrap();

        assert!(a.structurally_eq(&b));

        b.get_mut(rb).unwrap().add_attribute("k", "v");
        assert!(!a.structurally_eq(&b));
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let mut tree = Tree::new();
        let mut cursor = tree.set_root(Node::new("d"));
        for _ in 0..100_000 {
            cursor = tree.append_child(cursor, Node::new("d")).unwrap();
        }
        assert_eq!(tree.depth(cursor), 100_000);
        assert_eq!(tree.descendants().len(), 100_001);
        let copy = tree.clone();
        assert!(tree.structurally_eq(&copy));
        drop(tree);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
