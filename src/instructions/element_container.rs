//! `elementContainerStart` / `elementContainerEnd` / `elementContainer`.
//!
//! An `<ng-container>` renders as a single comment. Its children are inserted
//! before the comment, so in the DOM the comment closes the group.

use tracing::trace;

use crate::error::RenderResult;
use crate::materialize::{MaterializeRequest, ELEMENT_CONTAINER_COMMENT};
use crate::types::{SlotIndex, TNodeType};

use super::shared::NodeSpec;
use super::RenderContext;

impl RenderContext {
    pub fn element_container_start(
        &mut self,
        index: usize,
        attrs_index: Option<usize>,
        local_refs_index: Option<usize>,
    ) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, tview) = self.active()?;
        self.check_creation_slot(index)?;
        self.resolve_tnode(
            index,
            NodeSpec {
                tag: Some(ELEMENT_CONTAINER_COMMENT),
                attrs_index,
                local_refs_index,
                ..NodeSpec::new(TNodeType::ElementContainer)
            },
        )?;

        let materialized = self.materialize(index, MaterializeRequest::ElementContainer)?;
        self.store_node(view, index, materialized)?;
        trace!(%index, created = materialized.created, "elementContainerStart");

        let flags = self.registry.tview(tview)?.expect_tnode(index)?.flags;
        self.open_node(index, flags)?;
        self.run_directives(view, index, ELEMENT_CONTAINER_COMMENT, materialized.node, flags)
    }

    pub fn element_container_end(&mut self) -> RenderResult<()> {
        let closed = self.close_node(TNodeType::ElementContainer, "elementContainerEnd")?;
        trace!(index = %closed, "elementContainerEnd");
        Ok(())
    }

    pub fn element_container(
        &mut self,
        index: usize,
        attrs_index: Option<usize>,
        local_refs_index: Option<usize>,
    ) -> RenderResult<()> {
        self.element_container_start(index, attrs_index, local_refs_index)?;
        self.element_container_end()
    }
}
