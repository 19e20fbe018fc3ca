//! Producing `ngh` records from a create-only render.
//!
//! The record is kept minimal: a slot only gets an explicit path when the
//! runtime would not find its node by looking at the previously processed
//! node. Nodes produced inside i18n blocks always get a path, since a
//! translation may reorder them relative to instruction order.

use std::collections::HashMap;

use tracing::debug;

use crate::dom::{Dom, NodeId};
use crate::engine::{LView, Slot, TNode, TView, ViewRegistry};
use crate::error::{HydrationError, RenderResult};
use crate::types::{LViewId, SlotIndex, TNodeFlags, TNodeType};

use super::info::{SerializedContainer, SerializedView};
use super::path::{sibling_before, NodePath, PathAnchor};

/// Serialize a root view (its first DOM node is the host's first child).
pub fn serialize_view(dom: &Dom, registry: &ViewRegistry, view: LViewId) -> RenderResult<SerializedView> {
    let lview = registry.lview(view)?;
    let first_child = lview.header.host.and_then(|host| dom.first_child(host));
    Serializer { dom, registry }.view(view, first_child)
}

/// Serialize a root view and store the record as JSON on its host element.
pub fn annotate_for_hydration(
    dom: &Dom,
    registry: &ViewRegistry,
    view: LViewId,
    attribute: &str,
) -> RenderResult<SerializedView> {
    let record = serialize_view(dom, registry, view)?;
    let host = registry.lview(view)?.header.host.ok_or(HydrationError::MissingHost)?;
    let json = record.to_json()?;
    debug!(%view, bytes = json.len(), "annotated host for hydration");
    dom.set_attribute(host, attribute, &json);
    Ok(record)
}

struct Serializer<'a> {
    dom: &'a Dom,
    registry: &'a ViewRegistry,
}

impl Serializer<'_> {
    fn view(&self, id: LViewId, first_child: Option<NodeId>) -> RenderResult<SerializedView> {
        let (tview, lview) = self.registry.view_pair(id)?;
        let anchors = self.anchor_elements(tview, lview);
        let mut out = SerializedView::default();

        for tnode in tview.tnodes() {
            if in_skipped_subtree(tview, tnode) {
                continue;
            }
            let index = tnode.index;
            let Some(native) = lview.native(index) else { continue };

            if tnode.flags.contains(TNodeFlags::IS_DETACHED) || self.dom.parent(native).is_none() {
                out.disconnected.push(index.get());
                continue;
            }

            let expected = match tnode.node_type {
                TNodeType::ElementContainer | TNodeType::Container => {
                    out.containers
                        .insert(index.get(), self.container(tview, lview, tnode)?);
                    self.region_start(tview, lview, tnode)?
                }
                _ => native,
            };

            let inferred = self.inferred(tview, lview, tnode, first_child)?;
            if tnode.flags.contains(TNodeFlags::IN_I18N) || inferred != Some(expected) {
                let path = self.path_to(lview, &anchors, expected)?;
                out.nodes.insert(index.get(), path.to_string());
            }
        }

        Ok(out)
    }

    fn container(&self, tview: &TView, lview: &LView, tnode: &TNode) -> RenderResult<SerializedContainer> {
        let num_root_nodes = match tnode.node_type {
            TNodeType::ElementContainer => self.content(tview, lview, tnode.index)?,
            _ => 0,
        };
        let mut views = Vec::new();

        if let Slot::Container { container, anchor } = lview.slot(tnode.index) {
            let child_views = &self.registry.container(*container)?.views;
            let total = self.views_footprint(child_views)?;
            let mut current =
                sibling_before(self.dom, total, *anchor).ok_or(HydrationError::Unreachable { node: *anchor })?;

            for child in child_views {
                let size = self.root_footprint(*child)?;
                let first_child = (size > 0).then_some(current);
                let mut record = self.view(*child, first_child)?;
                let (child_tview, _) = self.registry.view_pair(*child)?;
                record.template = child_tview.ssr_id.clone();
                record.num_root_nodes = Some(size);
                views.push(record);
                for _ in 0..size {
                    current = self.dom.next_sibling(current).unwrap_or(*anchor);
                }
            }
        }

        Ok(SerializedContainer { num_root_nodes, views })
    }

    /// Node the runtime would pick for `tnode` without an explicit path.
    fn inferred(
        &self,
        tview: &TView,
        lview: &LView,
        tnode: &TNode,
        first_child: Option<NodeId>,
    ) -> RenderResult<Option<NodeId>> {
        let index = tnode.index;
        if tview.first_child == Some(index) {
            return Ok(first_child);
        }

        let parent = tnode.parent.and_then(|p| tview.tnode(p));
        if let Some(parent) = parent.filter(|p| p.child == Some(index)) {
            return match parent.node_type {
                TNodeType::ElementContainer => {
                    if self.content(tview, lview, parent.index)? > 0 {
                        self.region_start(tview, lview, parent).map(Some)
                    } else {
                        Ok(None)
                    }
                }
                _ => Ok(lview
                    .native(parent.index)
                    .and_then(|native| self.dom.first_child(native))),
            };
        }

        Ok(tview
            .tnodes()
            .find(|sibling| sibling.next == Some(index))
            .and_then(|sibling| lview.native(sibling.index))
            .and_then(|native| self.dom.next_sibling(native)))
    }

    /// First DOM node of a comment-anchored node's region (the anchor when empty).
    fn region_start(&self, tview: &TView, lview: &LView, tnode: &TNode) -> RenderResult<NodeId> {
        let anchor = lview
            .native(tnode.index)
            .ok_or(HydrationError::MissingNode { index: tnode.index })?;
        let inner = self.footprint(tview, lview, tnode)?.saturating_sub(1);
        sibling_before(self.dom, inner, anchor).ok_or_else(|| HydrationError::Unreachable { node: anchor }.into())
    }

    // =========================================================================
    // Footprints (DOM nodes contributed at a position)
    // =========================================================================

    fn footprint(&self, tview: &TView, lview: &LView, tnode: &TNode) -> RenderResult<usize> {
        let Some(native) = lview.native(tnode.index) else { return Ok(0) };
        if self.dom.parent(native).is_none() {
            return Ok(0);
        }
        let views = match lview.slot(tnode.index) {
            Slot::Container { container, .. } => {
                self.views_footprint(&self.registry.container(*container)?.views)?
            }
            _ => 0,
        };
        Ok(match tnode.node_type {
            TNodeType::ElementContainer => 1 + self.content(tview, lview, tnode.index)? + views,
            TNodeType::Container => 1 + views,
            _ => 1,
        })
    }

    fn content(&self, tview: &TView, lview: &LView, index: SlotIndex) -> RenderResult<usize> {
        tview
            .children_of(Some(index))
            .map(|child| self.footprint(tview, lview, child))
            .sum()
    }

    fn root_footprint(&self, view: LViewId) -> RenderResult<usize> {
        let (tview, lview) = self.registry.view_pair(view)?;
        tview
            .children_of(None)
            .map(|child| self.footprint(tview, lview, child))
            .sum()
    }

    fn views_footprint(&self, views: &[LViewId]) -> RenderResult<usize> {
        views.iter().map(|view| self.root_footprint(*view)).sum()
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// Elements usable as path anchors: materialized before anything inside an
    /// i18n block and located (not created) during hydration.
    fn anchor_elements(&self, tview: &TView, lview: &LView) -> HashMap<NodeId, SlotIndex> {
        tview
            .tnodes()
            .filter(|tnode| tnode.node_type == TNodeType::Element)
            .filter(|tnode| !tnode.flags.contains(TNodeFlags::IN_I18N))
            .filter(|tnode| !in_skipped_subtree(tview, tnode))
            .filter_map(|tnode| lview.native(tnode.index).map(|native| (native, tnode.index)))
            .collect()
    }

    fn path_to(
        &self,
        lview: &LView,
        anchors: &HashMap<NodeId, SlotIndex>,
        target: NodeId,
    ) -> RenderResult<NodePath> {
        let unreachable = || HydrationError::Unreachable { node: target };
        let mut ancestor = self.dom.parent(target);

        while let Some(node) = ancestor {
            let anchor = if Some(node) == lview.header.host {
                Some(PathAnchor::Host)
            } else {
                anchors.get(&node).map(|index| PathAnchor::Slot(*index))
            };
            if let Some(anchor) = anchor {
                return NodePath::between(self.dom, anchor, node, target).ok_or_else(|| unreachable().into());
            }
            ancestor = self.dom.parent(node);
        }

        Err(unreachable().into())
    }
}

/// Some ancestor opted its subtree out of hydration.
pub(crate) fn in_skipped_subtree(tview: &TView, tnode: &TNode) -> bool {
    let mut parent = tnode.parent;
    while let Some(index) = parent {
        let Some(ancestor) = tview.tnode(index) else { return false };
        if ancestor.flags.contains(TNodeFlags::SKIP_HYDRATION) {
            return true;
        }
        parent = ancestor.parent;
    }
    false
}
