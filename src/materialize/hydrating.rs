//! Hydration-aware strategy.
//!
//! Locates and claims server-rendered nodes. Falls back to creation when the
//! view has no hydration record, the slot sits inside a skip-hydration
//! subtree, or the record lists the slot as disconnected.

use tracing::trace;

use crate::dom::{NodeId, NodeKind};
use crate::engine::type_checks::assert_rnode_matches;
use crate::error::{HydrationError, RenderResult};
use crate::hydration::{locate_dehydrated_views_in_container, locate_next_rnode, sibling_after};
use crate::types::TNodeFlags;

use super::{CreatingMaterializer, MaterializeCx, Materialized, NodeMaterializer};

#[derive(Debug, Default, Clone, Copy)]
pub struct HydratingMaterializer;

impl HydratingMaterializer {
    fn should_locate(cx: &MaterializeCx<'_>) -> bool {
        if cx.skip_hydration {
            return false;
        }
        cx.lview
            .header
            .hydration
            .as_ref()
            .is_some_and(|info| !info.is_disconnected(cx.tnode.index))
    }

    fn locate(cx: &MaterializeCx<'_>) -> RenderResult<NodeId> {
        let index = cx.tnode.index;
        let info = cx
            .lview
            .header
            .hydration
            .as_ref()
            .ok_or(HydrationError::MissingNode { index })?;
        locate_next_rnode(
            cx.dom,
            info,
            cx.tview,
            &*cx.lview,
            cx.tnode,
            cx.previous,
            cx.previous_is_parent,
        )
    }

    fn claim_comment(cx: &mut MaterializeCx<'_>, comment: NodeId) -> RenderResult<Materialized> {
        assert_rnode_matches(cx.dom, comment, cx.tnode.index, NodeKind::Comment, None)?;
        cx.claims.claim(comment)?;
        Ok(Materialized::located(comment))
    }
}

impl NodeMaterializer for HydratingMaterializer {
    fn name(&self) -> &'static str {
        "hydrating"
    }

    fn is_hydrating(&self) -> bool {
        true
    }

    fn element(&self, cx: &mut MaterializeCx<'_>, tag: &str) -> RenderResult<Materialized> {
        if !Self::should_locate(cx) {
            return CreatingMaterializer.element(cx, tag);
        }
        let index = cx.tnode.index;
        let node = Self::locate(cx)?;
        assert_rnode_matches(cx.dom, node, index, NodeKind::Element, Some(tag))?;
        cx.claims.claim(node)?;

        if cx.tnode.flags.contains(TNodeFlags::SKIP_HYDRATION) {
            trace!(%index, tag, "dropping server content of skip-hydration element");
            cx.dom.clear_children(node);
        }
        Ok(Materialized::located(node))
    }

    fn text(&self, cx: &mut MaterializeCx<'_>, value: &str) -> RenderResult<Materialized> {
        if !Self::should_locate(cx) {
            return CreatingMaterializer.text(cx, value);
        }
        let node = Self::locate(cx)?;
        assert_rnode_matches(cx.dom, node, cx.tnode.index, NodeKind::Text, None)?;
        cx.claims.claim(node)?;
        Ok(Materialized::located(node))
    }

    /// The located node is where the container's region starts: its first
    /// content node, its first view node, or the comment itself when both are
    /// empty. The comment is found past the content, and past the views when
    /// the container also anchors a view container.
    fn element_container(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized> {
        if !Self::should_locate(cx) {
            return CreatingMaterializer.element_container(cx);
        }
        let index = cx.tnode.index;
        let current = Self::locate(cx)?;
        let (num_root_nodes, views) = cx
            .lview
            .header
            .hydration
            .as_ref()
            .and_then(|info| info.container(index))
            .map(|container| (container.num_root_nodes, container.views.clone()))
            .ok_or(HydrationError::MissingContainerInfo { index })?;

        let comment = if views.is_empty() {
            sibling_after(cx.dom, num_root_nodes, current).ok_or(HydrationError::MissingNode { index })?
        } else {
            let views_start = sibling_after(cx.dom, num_root_nodes, current)
                .ok_or(HydrationError::ViewsOverrun { index })?;
            let (anchor, dehydrated) =
                locate_dehydrated_views_in_container(cx.dom, index, Some(views_start), &views)?;
            trace!(%index, views = dehydrated.len(), "collected dehydrated views of ng-container");
            cx.pool.insert(cx.lview_id, index, dehydrated);
            anchor
        };

        if let Some(info) = cx.lview.header.hydration.as_mut() {
            info.container_starts
                .insert(index, (num_root_nodes > 0).then_some(current));
        }
        Self::claim_comment(cx, comment)
    }

    fn container_anchor(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized> {
        if !Self::should_locate(cx) {
            return CreatingMaterializer.container_anchor(cx);
        }
        let index = cx.tnode.index;
        let current = Self::locate(cx)?;
        let views = cx
            .lview
            .header
            .hydration
            .as_ref()
            .and_then(|info| info.container(index))
            .map(|container| container.views.clone())
            .ok_or(HydrationError::MissingContainerInfo { index })?;

        let (anchor, dehydrated) =
            locate_dehydrated_views_in_container(cx.dom, index, Some(current), &views)?;
        trace!(%index, views = dehydrated.len(), "collected dehydrated views of template");
        cx.pool.insert(cx.lview_id, index, dehydrated);
        Self::claim_comment(cx, anchor)
    }
}
