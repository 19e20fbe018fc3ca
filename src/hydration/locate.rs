//! Locating the server-rendered node for the next instruction.

use tracing::trace;

use crate::dom::{Dom, NodeId};
use crate::engine::{LView, TNode, TView};
use crate::error::{HydrationError, RenderResult};
use crate::types::{SlotIndex, TNodeType};

use super::info::{DehydratedView, HydrationInfo, SerializedView};
use super::path::find_existing_node;

/// Find the DOM node a fresh render would have produced for `tnode`.
///
/// First match wins:
/// 1. an explicit path recorded for the slot;
/// 2. the view's first DOM node, for the template's first root node;
/// 3. relative to the previously processed node: the first content node of
///    an open parent (`<ng-container>` contents start where the server said
///    they start), otherwise the next sibling of the previous node.
pub fn locate_next_rnode(
    dom: &Dom,
    info: &HydrationInfo,
    tview: &TView,
    lview: &LView,
    tnode: &TNode,
    previous: Option<&TNode>,
    previous_is_parent: bool,
) -> RenderResult<NodeId> {
    let index = tnode.index;

    if let Some(path) = info.path(index) {
        trace!(%index, path, "locating node by path");
        return find_existing_node(dom, lview, path);
    }

    let located = if tview.first_child == Some(index) {
        info.first_child
    } else {
        match previous {
            None => None,
            Some(previous) if previous_is_parent => {
                if previous.node_type == TNodeType::ElementContainer {
                    info.container_start(previous.index)
                } else {
                    lview
                        .native(previous.index)
                        .and_then(|native| dom.first_child(native))
                }
            }
            Some(previous) => lview
                .native(previous.index)
                .and_then(|native| dom.next_sibling(native)),
        }
    };

    located.ok_or_else(|| HydrationError::MissingNode { index }.into())
}

/// Split the nodes starting at `current` into the container's serialized
/// views, returning the anchor comment that follows them.
pub fn locate_dehydrated_views_in_container(
    dom: &Dom,
    index: SlotIndex,
    current: Option<NodeId>,
    views: &[SerializedView],
) -> RenderResult<(NodeId, Vec<DehydratedView>)> {
    let mut current = current;
    let mut dehydrated = Vec::with_capacity(views.len());

    for view in views {
        let size = view.num_root_nodes.unwrap_or(0);
        let first_child = if size > 0 { current } else { None };
        for _ in 0..size {
            let node = current.ok_or(HydrationError::ViewsOverrun { index })?;
            current = dom.next_sibling(node);
        }
        dehydrated.push(DehydratedView {
            first_child,
            data: view.clone(),
        });
    }

    let anchor = current.ok_or(HydrationError::ViewsOverrun { index })?;
    Ok((anchor, dehydrated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Slot, TViewDef, ViewRegistry};

    #[test]
    fn test_locate_dehydrated_views() {
        let dom = Dom::new();
        let host = dom.create_element("div");
        let nodes: Vec<_> = ["a", "b", "c"].iter().map(|t| dom.create_text(t)).collect();
        let anchor = dom.create_comment("container");
        for node in nodes.iter().chain([&anchor]) {
            dom.append_child(host, *node);
        }

        let views = vec![
            SerializedView {
                num_root_nodes: Some(2),
                template: Some("t".into()),
                ..Default::default()
            },
            SerializedView {
                num_root_nodes: Some(0),
                ..Default::default()
            },
            SerializedView {
                num_root_nodes: Some(1),
                ..Default::default()
            },
        ];

        let (found, dehydrated) =
            locate_dehydrated_views_in_container(&dom, SlotIndex(0), Some(nodes[0]), &views).unwrap();
        assert_eq!(found, anchor);
        assert_eq!(dehydrated.len(), 3);
        assert_eq!(dehydrated[0].first_child, Some(nodes[0]));
        assert_eq!(dehydrated[1].first_child, None);
        assert_eq!(dehydrated[2].first_child, Some(nodes[2]));

        let too_many = vec![SerializedView {
            num_root_nodes: Some(4),
            ..Default::default()
        }];
        assert!(locate_dehydrated_views_in_container(&dom, SlotIndex(0), Some(nodes[0]), &too_many).is_err());
    }

    #[test]
    fn test_locate_relative_to_previous() {
        // <host><p>x</p><b></b></host>
        let dom = Dom::new();
        let host = dom.create_element("host");
        let p = dom.create_element("p");
        let x = dom.create_text("x");
        let b = dom.create_element("b");
        dom.append_child(host, p);
        dom.append_child(p, x);
        dom.append_child(host, b);

        let mut registry = ViewRegistry::new();
        let tview_id = registry.create_tview(TViewDef::new(3, 0, |_, _| Ok(())));
        let tview = registry.tview_mut(tview_id).unwrap();
        let p_tnode = TNode::new(TNodeType::Element, SlotIndex(0), None);
        tview.register_tnode(p_tnode.clone(), None, false).unwrap();
        let x_tnode = TNode::new(TNodeType::Text, SlotIndex(1), Some(SlotIndex(0)));
        let b_tnode = TNode::new(TNodeType::Element, SlotIndex(2), None);

        let mut lview = LView::new(tview_id, 3);
        lview.header.host = Some(host);
        let info = HydrationInfo::new(SerializedView::default(), Some(p));
        let tview = registry.tview(tview_id).unwrap();

        let found = locate_next_rnode(&dom, &info, tview, &lview, &p_tnode, None, false).unwrap();
        assert_eq!(found, p);
        lview.set(SlotIndex(0), Slot::Node(p));

        let found = locate_next_rnode(&dom, &info, tview, &lview, &x_tnode, Some(&p_tnode), true).unwrap();
        assert_eq!(found, x);

        let found = locate_next_rnode(&dom, &info, tview, &lview, &b_tnode, Some(&p_tnode), false).unwrap();
        assert_eq!(found, b);

        let err = locate_next_rnode(&dom, &info, tview, &lview, &b_tnode, None, false).unwrap_err();
        assert!(err.to_string().contains("no DOM node"));
    }
}
