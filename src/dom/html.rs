//! HTML serialisation of the arena document.

use super::document::DomTree;
use super::node::{NodeId, NodeKind};

pub(crate) fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else { return };
    match node.kind {
        NodeKind::Text => escape_text(&node.data, out),
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&node.data);
            out.push_str("-->");
        }
        NodeKind::Element => {
            out.push('<');
            out.push_str(&node.name);
            for (name, value) in &node.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attribute(value, out);
                out.push('"');
            }
            out.push('>');
            let mut next = node.first_child;
            while let Some(child) = next {
                write_node(tree, child, out);
                next = tree.get(child).and_then(|n| n.next_sibling);
            }
            out.push_str("</");
            out.push_str(&node.name);
            out.push('>');
        }
    }
}

pub(crate) fn collect_text(tree: &DomTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else { return };
    match node.kind {
        NodeKind::Text => out.push_str(&node.data),
        NodeKind::Comment => {}
        NodeKind::Element => {
            let mut next = node.first_child;
            while let Some(child) = next {
                collect_text(tree, child, out);
                next = tree.get(child).and_then(|n| n.next_sibling);
            }
        }
    }
}

fn escape_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::Dom;

    #[test]
    fn test_outer_html() {
        let dom = Dom::new();
        let div = dom.create_element("div");
        dom.set_attribute(div, "title", "a \"b\"");
        let text = dom.create_text("1 < 2");
        let comment = dom.create_comment("ng-container");
        dom.append_child(div, text);
        dom.append_child(div, comment);

        assert_eq!(
            dom.outer_html(div),
            "<div title=\"a &quot;b&quot;\">1 &lt; 2<!--ng-container--></div>"
        );
        assert_eq!(dom.inner_html(div), "1 &lt; 2<!--ng-container-->");
    }
}
