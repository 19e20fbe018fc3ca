//! DOM node representation.
//!
//! Uses [`NodeId`] (u32) for compact node references into the arena.

use std::fmt;

/// Compact node identifier (index into the document arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Type of DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
        })
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Tag name for elements, empty otherwise.
    pub name: String,
    /// Character data for text and comment nodes.
    pub data: String,
    pub attributes: Vec<(String, String)>,
}

impl DomNode {
    fn new(kind: NodeKind, name: String, data: String) -> Self {
        DomNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name,
            data,
            attributes: Vec::new(),
        }
    }

    pub fn element(tag: &str) -> Self {
        Self::new(NodeKind::Element, tag.to_string(), String::new())
    }

    pub fn text(data: &str) -> Self {
        Self::new(NodeKind::Text, String::new(), data.to_string())
    }

    pub fn comment(data: &str) -> Self {
        Self::new(NodeKind::Comment, String::new(), data.to_string())
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }
}
