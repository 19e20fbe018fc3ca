//! `template` and view containers.
//!
//! A container owns the embedded views inserted before its anchor comment.
//! Anchors come from two places:
//! - `template()`: a Container node with a declared embedded TView
//! - `create_container_ref()`: an `<ng-container>` taking on the anchor role
//!
//! While hydrating, creating a view first looks for a dehydrated server view
//! rendered from the same template and reconciles against it.

use tracing::{debug, trace, warn};

use crate::dom::NodeId;
use crate::engine::{LContainer, LView, Slot};
use crate::error::{RenderResult, StructuralError};
use crate::materialize::MaterializeRequest;
use crate::types::{LContainerId, LViewFlags, LViewId, SlotIndex, TNodeFlags, TNodeType, TViewId};

use super::shared::NodeSpec;
use super::RenderContext;

/// Tag under which directives see a template.
const TEMPLATE_TAG: &str = "ng-template";

impl RenderContext {
    /// Declare a template at `index`, anchoring a view container.
    pub fn template(
        &mut self,
        index: usize,
        tview: TViewId,
        attrs_index: Option<usize>,
        local_refs_index: Option<usize>,
    ) -> RenderResult<LContainerId> {
        let index = SlotIndex(index);
        let (view, declaring) = self.active()?;
        self.check_creation_slot(index)?;
        self.registry.tview(tview)?;
        self.resolve_tnode(
            index,
            NodeSpec {
                tag: Some(TEMPLATE_TAG),
                attrs_index,
                local_refs_index,
                tview: Some(tview),
                ..NodeSpec::new(TNodeType::Container)
            },
        )?;

        let materialized = self.materialize(index, MaterializeRequest::ContainerAnchor)?;
        if materialized.created {
            self.insert_created(view, index, materialized.node)?;
        }
        let anchor = materialized.node;
        let container = self.registry.allocate_container(LContainer {
            anchor,
            host_view: view,
            index,
            views: Vec::new(),
            tview: Some(tview),
        });
        self.registry
            .lview_mut(view)?
            .set(index, Slot::Container { container, anchor });
        trace!(%index, %container, created = materialized.created, "template");

        self.state.set_current_tnode(index, false)?;
        let flags = self.registry.tview(declaring)?.expect_tnode(index)?.flags;
        self.run_directives(view, index, TEMPLATE_TAG, anchor, flags)?;
        Ok(container)
    }

    /// Container at `index` of the view being rendered.
    pub fn container_at(&self, index: usize) -> RenderResult<LContainerId> {
        let (view, _) = self.active()?;
        self.container_in(view, index)
    }

    pub fn container_in(&self, view: LViewId, index: usize) -> RenderResult<LContainerId> {
        let index = SlotIndex(index);
        self.registry
            .lview(view)?
            .slot(index)
            .container()
            .ok_or_else(|| StructuralError::NotAContainer { index }.into())
    }

    /// Make the `<ng-container>` at `index` of the active view a view
    /// container anchor. Calling it again returns the same container.
    pub fn create_container_ref(&mut self, index: usize) -> RenderResult<LContainerId> {
        let (view, _) = self.active()?;
        self.create_container_ref_in(view, index)
    }

    pub fn create_container_ref_in(&mut self, view: LViewId, index: usize) -> RenderResult<LContainerId> {
        let index = SlotIndex(index);
        let (tview, lview) = self.registry.view_pair_mut(view)?;
        let anchor = match lview.slot(index) {
            Slot::Container { container, .. } => return Ok(*container),
            Slot::Node(node) => *node,
            _ => return Err(StructuralError::EmptySlot { index }.into()),
        };

        let first_create_pass = tview.first_create_pass;
        let tnode = tview
            .tnode_mut(index)
            .ok_or(StructuralError::EmptySlot { index })?;
        if tnode.node_type != TNodeType::ElementContainer {
            return Err(StructuralError::NotAContainer { index }.into());
        }
        if first_create_pass {
            tnode.flags |= TNodeFlags::IS_VIEW_CONTAINER_ANCHOR;
        }

        let container = self.registry.allocate_container(LContainer {
            anchor,
            host_view: view,
            index,
            views: Vec::new(),
            tview: None,
        });
        self.registry
            .lview_mut(view)?
            .set(index, Slot::Container { container, anchor });
        debug!(%view, %index, %container, "ng-container became a view container");
        Ok(container)
    }

    // =========================================================================
    // Embedded views
    // =========================================================================

    pub fn container_length(&self, container: LContainerId) -> RenderResult<usize> {
        Ok(self.registry.container(container)?.views.len())
    }

    pub fn container_views(&self, container: LContainerId) -> RenderResult<&[LViewId]> {
        Ok(&self.registry.container(container)?.views)
    }

    /// Instantiate the container's declared template at position `at`.
    pub fn create_embedded_view(&mut self, container: LContainerId, at: usize) -> RenderResult<LViewId> {
        let record = self.registry.container(container)?;
        let tview = record
            .tview
            .ok_or(StructuralError::MissingTemplate { index: record.index })?;
        self.create_embedded_view_with(container, tview, at)
    }

    /// Instantiate `tview` at position `at` of a container, running its
    /// creation pass and first update pass.
    pub fn create_embedded_view_with(
        &mut self,
        container: LContainerId,
        tview: TViewId,
        at: usize,
    ) -> RenderResult<LViewId> {
        let (anchor, host_view, slot, following) = {
            let record = self.registry.container(container)?;
            if at > record.views.len() {
                return Err(StructuralError::ViewIndexOutOfRange {
                    index: at,
                    len: record.views.len(),
                }
                .into());
            }
            (record.anchor, record.host_view, record.index, record.views[at..].to_vec())
        };

        let before = self.first_root_node(&following)?.unwrap_or(anchor);
        let host = self
            .dom
            .parent(anchor)
            .ok_or(StructuralError::NoRenderParent { index: slot })?;
        let (len, ssr_id) = {
            let tview = self.registry.tview(tview)?;
            (tview.data.len(), tview.ssr_id.clone())
        };

        let mut lview = LView::new(tview, len);
        lview.header.parent = Some(container);
        lview.header.host = Some(host);
        lview.header.insert_before = Some(before);
        if self.is_hydrating() {
            if let Some(dehydrated) = self
                .dehydrated
                .take_matching(&self.dom, host_view, slot, ssr_id.as_deref())
            {
                lview.header.hydration = Some(dehydrated.into_info());
                lview.header.flags |= LViewFlags::HYDRATED;
            }
        }
        let hydrated = lview.header.hydration.is_some();

        let view = self.registry.allocate_lview(lview);
        self.registry.container_mut(container)?.views.insert(at, view);
        debug!(%view, %container, at, hydrated, "embedded view created");

        let rendered = self.render_view(view).and_then(|()| self.refresh_view(view));
        if let Err(err) = rendered {
            if let Ok(record) = self.registry.container_mut(container) {
                record.views.retain(|child| *child != view);
            }
            if let Err(cleanup) = self.destroy_view(view) {
                warn!(%view, error = %cleanup, "could not tear down a view whose render failed");
            }
            return Err(err);
        }
        Ok(view)
    }

    /// Remove and destroy the view at position `at`.
    pub fn remove_embedded_view(&mut self, container: LContainerId, at: usize) -> RenderResult<()> {
        let record = self.registry.container_mut(container)?;
        if at >= record.views.len() {
            return Err(StructuralError::ViewIndexOutOfRange {
                index: at,
                len: record.views.len(),
            }
            .into());
        }
        let view = record.views.remove(at);
        self.destroy_view(view)
    }

    pub fn clear_container(&mut self, container: LContainerId) -> RenderResult<()> {
        while let Some(last) = self.container_length(container)?.checked_sub(1) {
            self.remove_embedded_view(container, last)?;
        }
        Ok(())
    }

    /// Detach a view's root nodes and release it with everything nested in it.
    pub(crate) fn destroy_view(&mut self, view: LViewId) -> RenderResult<()> {
        for node in self.root_nodes(view)? {
            self.dom.remove(node);
        }
        self.release_view_tree(view)
    }

    fn release_view_tree(&mut self, view: LViewId) -> RenderResult<()> {
        let (containers, natives): (Vec<LContainerId>, Vec<NodeId>) = {
            let lview = self.registry.lview(view)?;
            (
                lview.containers(),
                lview.data.iter().filter_map(Slot::native).collect(),
            )
        };

        for container in containers {
            let children = self.registry.container(container)?.views.clone();
            for child in children {
                self.release_view_tree(child)?;
            }
            self.registry.release_container(container);
        }

        let dropped = self.dehydrated.remove_for_view(&self.dom, view);
        for node in natives {
            self.claims.release(node);
        }
        self.registry.release_lview(view);
        debug!(%view, dropped, "view destroyed");
        Ok(())
    }

    // =========================================================================
    // Root nodes
    // =========================================================================

    /// Attached DOM nodes a view contributes at its root, in no particular order.
    pub(crate) fn root_nodes(&self, view: LViewId) -> RenderResult<Vec<NodeId>> {
        let mut nodes = Vec::new();
        self.collect_nodes(view, None, &mut nodes)?;
        Ok(nodes)
    }

    fn collect_nodes(&self, view: LViewId, parent: Option<SlotIndex>, out: &mut Vec<NodeId>) -> RenderResult<()> {
        let (tview, lview) = self.registry.view_pair(view)?;
        for tnode in tview.children_of(parent) {
            let slot = lview.slot(tnode.index);
            if tnode.node_type == TNodeType::ElementContainer {
                self.collect_nodes(view, Some(tnode.index), out)?;
            }
            if let Slot::Container { container, .. } = slot {
                for child in &self.registry.container(*container)?.views {
                    self.collect_nodes(*child, None, out)?;
                }
            }
            if let Some(native) = slot.native().filter(|node| self.dom.parent(*node).is_some()) {
                out.push(native);
            }
        }
        Ok(())
    }

    /// First DOM node of the first non-empty view in `views`.
    fn first_root_node(&self, views: &[LViewId]) -> RenderResult<Option<NodeId>> {
        for view in views {
            let nodes = self.root_nodes(*view)?;
            let first = nodes.iter().copied().find(|node| {
                self.dom
                    .previous_sibling(*node)
                    .is_none_or(|previous| !nodes.contains(&previous))
            });
            if first.is_some() {
                return Ok(first);
            }
        }
        Ok(None)
    }
}
