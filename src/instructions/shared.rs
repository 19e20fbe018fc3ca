//! Steps shared by the Start instructions.
//!
//! A Start instruction runs the same sequence whatever node it produces:
//! check its preconditions, register the TNode on the first pass, ask the
//! materializer for a node, insert it if it was created, and move the
//! position state.

use tracing::trace;

use crate::dom::NodeId;
use crate::engine::type_checks::assert_tnode_type;
use crate::engine::{LView, Slot, TNode, TView};
use crate::error::{dev_assert, RenderResult, StructuralError};
use crate::materialize::{MaterializeCx, MaterializeRequest, Materialized};
use crate::types::{LViewId, SlotIndex, TNodeFlags, TNodeType, TViewId};

use super::directives::DIRECTIVE_FLAGS;
use super::RenderContext;

/// Static data of a TNode about to be registered.
pub(crate) struct NodeSpec<'a> {
    pub node_type: TNodeType,
    pub tag: Option<&'a str>,
    pub value: Option<&'a str>,
    pub attrs_index: Option<usize>,
    pub local_refs_index: Option<usize>,
    pub tview: Option<TViewId>,
}

impl<'a> NodeSpec<'a> {
    pub fn new(node_type: TNodeType) -> Self {
        Self {
            node_type,
            tag: None,
            value: None,
            attrs_index: None,
            local_refs_index: None,
            tview: None,
        }
    }
}

impl RenderContext {
    /// View and template of the active frame.
    pub(crate) fn active(&self) -> RenderResult<(LViewId, TViewId)> {
        let frame = self.state.frame()?;
        Ok((frame.lview, frame.tview))
    }

    /// Slot must be declared, and no binding instruction may have run yet.
    pub(crate) fn check_creation_slot(&self, index: SlotIndex) -> RenderResult<()> {
        let frame = self.state.frame()?;
        let tview = self.registry.tview(frame.tview)?;
        dev_assert!(
            frame.binding_index == tview.binding_start_index,
            StructuralError::BindingBeforeElement { index }
        );
        if index.get() >= tview.decls {
            return Err(StructuralError::SlotOutOfRange {
                index,
                len: tview.decls,
            }
            .into());
        }
        Ok(())
    }

    /// Register the TNode for `index` on the first pass, or check the cached
    /// one on later passes.
    pub(crate) fn resolve_tnode(&mut self, index: SlotIndex, spec: NodeSpec<'_>) -> RenderResult<()> {
        let frame = self.state.frame()?;
        let (current, is_parent, in_i18n) = (frame.current_tnode, frame.is_parent, frame.i18n.is_some());
        let tview = self.registry.tview_mut(frame.tview)?;

        if !tview.first_create_pass {
            return assert_tnode_type(tview.expect_tnode(index)?, spec.node_type);
        }

        let parent_of_current = current.and_then(|c| tview.tnode(c)).and_then(|t| t.parent);
        let parent = frame.parent_for_next(parent_of_current);

        let mut tnode = TNode::new(spec.node_type, index, parent);
        tnode.attrs = tview.attrs_const(spec.attrs_index)?;
        tnode.local_names = tview.local_refs_const(spec.local_refs_index)?;
        tnode.tag = spec.tag.map(str::to_string);
        tnode.value = spec.value.map(str::to_string);
        tnode.tview = spec.tview;

        if in_i18n {
            tnode.flags |= TNodeFlags::IN_I18N;
        }
        if spec.node_type == TNodeType::Element
            && tnode.attr(&self.config.skip_hydration_attribute).is_some()
        {
            tnode.flags |= TNodeFlags::SKIP_HYDRATION;
        }
        if let (Some(resolver), Some(tag)) = (&self.directives, spec.tag) {
            tnode.flags |= resolver.matches(tag, &tnode.attrs) & DIRECTIVE_FLAGS;
        }

        trace!(%index, node_type = %spec.node_type, ?parent, "registered tnode");
        tview.register_tnode(tnode, current, is_parent)
    }

    /// Obtain the DOM node for `index` from the active strategy.
    pub(crate) fn materialize(
        &mut self,
        index: SlotIndex,
        request: MaterializeRequest<'_>,
    ) -> RenderResult<Materialized> {
        let frame = self.state.frame()?;
        let (lview_id, current, is_parent, skip_hydration) = (
            frame.lview,
            frame.current_tnode,
            frame.is_parent,
            frame.skip_hydration_root.is_some(),
        );

        let (tview, lview) = self.registry.view_pair_mut(lview_id)?;
        let tview: &TView = tview;
        let tnode = tview.expect_tnode(index)?;
        let mut cx = MaterializeCx {
            dom: &self.dom,
            tview,
            lview,
            lview_id,
            tnode,
            previous: current.and_then(move |c| tview.tnode(c)),
            previous_is_parent: is_parent,
            claims: &mut self.claims,
            skip_hydration,
            pool: &self.dehydrated,
        };

        let materializer = &self.materializer;
        let result = match request {
            MaterializeRequest::Element(tag) => materializer.element(&mut cx, tag),
            MaterializeRequest::Text(value) => materializer.text(&mut cx, value),
            MaterializeRequest::ElementContainer => materializer.element_container(&mut cx),
            MaterializeRequest::ContainerAnchor => materializer.container_anchor(&mut cx),
        }?;

        trace!(%index, node = %result.node, created = result.created, "materialized");
        Ok(result)
    }

    /// Insert a created node at its logical position.
    pub(crate) fn insert_created(&self, view: LViewId, index: SlotIndex, node: NodeId) -> RenderResult<()> {
        let (tview, lview) = self.registry.view_pair(view)?;
        let tnode = tview.expect_tnode(index)?;
        let (parent, before) = self.insertion_point(tview, lview, tnode)?;
        self.dom.insert_before(parent, node, before);
        Ok(())
    }

    /// DOM parent and reference node for a child of `tnode.parent`.
    ///
    /// Root nodes go into the view host (before the view's insertion anchor,
    /// for embedded views). Children of an `<ng-container>` go before its
    /// comment.
    pub(crate) fn insertion_point(
        &self,
        tview: &TView,
        lview: &LView,
        tnode: &TNode,
    ) -> RenderResult<(NodeId, Option<NodeId>)> {
        self.insertion_point_under(tview, lview, tnode.parent, tnode.index)
    }

    /// Same as [`insertion_point`](Self::insertion_point) for an explicit
    /// logical parent (i18n blocks place nodes by message structure).
    pub(crate) fn insertion_point_under(
        &self,
        tview: &TView,
        lview: &LView,
        parent: Option<SlotIndex>,
        index: SlotIndex,
    ) -> RenderResult<(NodeId, Option<NodeId>)> {
        let no_parent = || StructuralError::NoRenderParent { index };
        let Some(parent_index) = parent else {
            let host = lview.header.host.ok_or_else(no_parent)?;
            return Ok((host, lview.header.insert_before));
        };

        let parent = tview.expect_tnode(parent_index)?;
        let native = lview.native(parent_index).ok_or_else(no_parent)?;
        match parent.node_type {
            TNodeType::ElementContainer => {
                let render_parent = self.dom.parent(native).ok_or_else(no_parent)?;
                Ok((render_parent, Some(native)))
            }
            _ => Ok((native, None)),
        }
    }

    /// Store a materialized node, inserting it if it is new.
    pub(crate) fn store_node(&mut self, view: LViewId, index: SlotIndex, materialized: Materialized) -> RenderResult<()> {
        self.registry
            .lview_mut(view)?
            .set(index, Slot::Node(materialized.node));
        if materialized.created {
            self.insert_created(view, index, materialized.node)?;
        }
        Ok(())
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    /// Compare `value` with the next binding slot, storing it if it changed.
    pub(crate) fn binding_updated(&mut self, value: &str) -> RenderResult<bool> {
        let index = SlotIndex(self.state.next_binding_index()?);
        let (view, _) = self.active()?;
        let lview = self.registry.lview_mut(view)?;

        if matches!(lview.slot(index), Slot::Binding(old) if old == value) {
            return Ok(false);
        }
        lview.set(index, Slot::Binding(value.to_string()));
        Ok(true)
    }
}
