//! Arena-backed document used as the renderer.
//!
//! - Nodes live in one `Vec`, referenced by [`NodeId`]; ids are never reused.
//! - Tree structure is kept as parent / first / last / prev / next links.
//! - [`Dom`] is a cheap clonable handle, like a browser `document` reference:
//!   every clone sees the same tree.

use std::cell::RefCell;
use std::rc::Rc;

use super::html;
use super::node::{DomNode, NodeId, NodeKind};

#[derive(Debug, Clone, Default)]
pub(crate) struct DomTree {
    pub(crate) nodes: Vec<DomNode>,
}

impl DomTree {
    fn push(&mut self, node: DomNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.index())
    }

    fn detach(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id.index()) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        let Some(parent) = parent else { return };

        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }

        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.get(parent).is_none() || self.get(child).is_none() || parent == child {
            return;
        }
        // A reference that is not a child of `parent` degrades to append, like
        // a renderer that cannot honour the position.
        let reference = reference.filter(|r| r != &child && self.get(*r).and_then(|n| n.parent) == Some(parent));

        self.detach(child);

        match reference {
            Some(reference) => {
                let prev = self.nodes[reference.index()].prev_sibling;
                {
                    let node = &mut self.nodes[child.index()];
                    node.parent = Some(parent);
                    node.prev_sibling = prev;
                    node.next_sibling = Some(reference);
                }
                self.nodes[reference.index()].prev_sibling = Some(child);
                match prev {
                    Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
                    None => self.nodes[parent.index()].first_child = Some(child),
                }
            }
            None => {
                let last = self.nodes[parent.index()].last_child;
                {
                    let node = &mut self.nodes[child.index()];
                    node.parent = Some(parent);
                    node.prev_sibling = last;
                    node.next_sibling = None;
                }
                match last {
                    Some(last) => self.nodes[last.index()].next_sibling = Some(child),
                    None => self.nodes[parent.index()].first_child = Some(child),
                }
                self.nodes[parent.index()].last_child = Some(child);
            }
        }
    }
}

/// Shared handle to a document.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    tree: Rc<RefCell<DomTree>>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep copy of the whole document. Node ids stay valid in the copy.
    ///
    /// Stands in for "the same markup, produced by another process".
    pub fn fork(&self) -> Dom {
        Dom {
            tree: Rc::new(RefCell::new(self.tree.borrow().clone())),
        }
    }

    /// Number of nodes ever created in this document.
    pub fn node_count(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    // =========================================================================
    // Creation
    // =========================================================================

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree.borrow_mut().push(DomNode::element(tag))
    }

    pub fn create_text(&self, data: &str) -> NodeId {
        self.tree.borrow_mut().push(DomNode::text(data))
    }

    pub fn create_comment(&self, data: &str) -> NodeId {
        self.tree.borrow_mut().push(DomNode::comment(data))
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.tree.borrow().get(id).map(|n| n.kind)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .get(id)
            .filter(|n| n.is_element())
            .map(|n| n.name.clone())
    }

    /// Character data of a text or comment node.
    pub fn data(&self, id: NodeId) -> Option<String> {
        self.tree
            .borrow()
            .get(id)
            .filter(|n| !n.is_element())
            .map(|n| n.data.clone())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.tree.borrow().get(id).and_then(|n| {
            n.attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
    }

    pub fn attributes(&self, id: NodeId) -> Vec<(String, String)> {
        self.tree
            .borrow()
            .get(id)
            .map(|n| n.attributes.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id).and_then(|n| n.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id).and_then(|n| n.last_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id).and_then(|n| n.next_sibling)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.borrow().get(id).and_then(|n| n.prev_sibling)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut out = Vec::new();
        let mut next = tree.get(id).and_then(|n| n.first_child);
        while let Some(child) = next {
            out.push(child);
            next = tree.get(child).and_then(|n| n.next_sibling);
        }
        out
    }

    /// Position of `id` among its parent's children.
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        html::collect_text(&tree, id, &mut out);
        out
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    pub fn set_data(&self, id: NodeId, value: &str) {
        if let Some(node) = self.tree.borrow_mut().nodes.get_mut(id.index()) {
            if !node.is_element() {
                node.data = value.to_string();
            }
        }
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        let mut tree = self.tree.borrow_mut();
        let Some(node) = tree.nodes.get_mut(id.index()) else { return };
        if !node.is_element() {
            return;
        }
        match node.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) {
        if let Some(node) = self.tree.borrow_mut().nodes.get_mut(id.index()) {
            node.attributes.retain(|(key, _)| key != name);
        }
    }

    /// Append `child` as last child of `parent`, moving it if already attached.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.tree.borrow_mut().insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (append when `None`).
    pub fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.tree.borrow_mut().insert_before(parent, child, reference);
    }

    /// Detach a node (and its subtree) from its parent.
    pub fn remove(&self, id: NodeId) {
        self.tree.borrow_mut().detach(id);
    }

    pub fn clear_children(&self, id: NodeId) {
        for child in self.children(id) {
            self.remove(child);
        }
    }

    // =========================================================================
    // Serialisation
    // =========================================================================

    /// Markup of the node including itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        html::write_node(&tree, id, &mut out);
        out
    }

    /// Markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        let mut next = tree.get(id).and_then(|n| n.first_child);
        while let Some(child) = next {
            html::write_node(&tree, child, &mut out);
            next = tree.get(child).and_then(|n| n.next_sibling);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(dom: &Dom, parent: NodeId) -> Vec<NodeId> {
        dom.children(parent)
    }

    #[test]
    fn test_append_and_links() {
        let dom = Dom::new();
        let root = dom.create_element("div");
        let a = dom.create_text("a");
        let b = dom.create_element("b");

        dom.append_child(root, a);
        dom.append_child(root, b);

        assert_eq!(list(&dom, root), vec![a, b]);
        assert_eq!(dom.first_child(root), Some(a));
        assert_eq!(dom.last_child(root), Some(b));
        assert_eq!(dom.next_sibling(a), Some(b));
        assert_eq!(dom.previous_sibling(b), Some(a));
        assert_eq!(dom.parent(b), Some(root));
    }

    #[test]
    fn test_insert_before_moves_node() {
        let dom = Dom::new();
        let root = dom.create_element("div");
        let a = dom.create_text("a");
        let b = dom.create_text("b");
        let c = dom.create_text("c");
        dom.append_child(root, a);
        dom.append_child(root, b);
        dom.append_child(root, c);

        dom.insert_before(root, c, Some(a));
        assert_eq!(list(&dom, root), vec![c, a, b]);

        // Moving to the end.
        dom.insert_before(root, c, None);
        assert_eq!(list(&dom, root), vec![a, b, c]);
    }

    #[test]
    fn test_remove_and_clear() {
        let dom = Dom::new();
        let root = dom.create_element("ul");
        let items: Vec<_> = (0..3).map(|_| dom.create_element("li")).collect();
        for item in &items {
            dom.append_child(root, *item);
        }

        dom.remove(items[1]);
        assert_eq!(list(&dom, root), vec![items[0], items[2]]);
        assert_eq!(dom.parent(items[1]), None);

        dom.clear_children(root);
        assert!(list(&dom, root).is_empty());
        assert_eq!(dom.first_child(root), None);
        assert_eq!(dom.last_child(root), None);
    }

    #[test]
    fn test_attributes() {
        let dom = Dom::new();
        let el = dom.create_element("input");
        dom.set_attribute(el, "type", "text");
        dom.set_attribute(el, "type", "checkbox");
        dom.set_attribute(el, "id", "x");
        assert_eq!(dom.attribute(el, "type").as_deref(), Some("checkbox"));
        dom.remove_attribute(el, "id");
        assert_eq!(dom.attributes(el), vec![("type".to_string(), "checkbox".to_string())]);
    }

    #[test]
    fn test_fork_is_independent() {
        let dom = Dom::new();
        let root = dom.create_element("div");
        let text = dom.create_text("x");
        dom.append_child(root, text);

        let copy = dom.fork();
        copy.set_data(text, "y");

        assert_eq!(dom.text_content(root), "x");
        assert_eq!(copy.text_content(root), "y");
        assert_eq!(copy.first_child(root), Some(text));
    }
}
