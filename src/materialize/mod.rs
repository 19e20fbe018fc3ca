//! Node Materialization - create vs. locate.
//!
//! Every Start instruction asks a [`NodeMaterializer`] for the DOM node of the
//! slot it is processing. Two strategies exist:
//! - [`CreatingMaterializer`]: always creates a fresh node
//! - [`HydratingMaterializer`]: locates the node a server render produced,
//!   falling back to creation where the record says it cannot
//!
//! The strategy is picked once by [`select`] when a
//! [`RenderContext`](crate::RenderContext) is built and never switched while
//! rendering.

mod creating;
mod hydrating;

pub use creating::CreatingMaterializer;
pub use hydrating::HydratingMaterializer;

use crate::config::RenderConfig;
use crate::dom::{Dom, NodeId};
use crate::engine::{LView, TNode, TView};
use crate::error::RenderResult;
use crate::hydration::{ClaimRegistry, DehydratedPool};
use crate::types::LViewId;

/// Comment text of an `<ng-container>` anchor.
pub const ELEMENT_CONTAINER_COMMENT: &str = "ng-container";

/// Comment text of a template (view container) anchor.
pub const CONTAINER_COMMENT: &str = "container";

/// Result of materializing one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Materialized {
    pub node: NodeId,
    /// `true` when the node is new and still has to be inserted.
    pub created: bool,
}

impl Materialized {
    pub fn created(node: NodeId) -> Self {
        Self { node, created: true }
    }

    pub fn located(node: NodeId) -> Self {
        Self { node, created: false }
    }
}

/// Node kind an instruction asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeRequest<'a> {
    Element(&'a str),
    Text(&'a str),
    ElementContainer,
    ContainerAnchor,
}

/// Everything a strategy may look at for one slot.
pub struct MaterializeCx<'a> {
    pub dom: &'a Dom,
    pub tview: &'a TView,
    pub lview: &'a mut LView,
    pub lview_id: LViewId,
    pub tnode: &'a TNode,
    /// Node processed just before this one, and whether it is still open.
    pub previous: Option<&'a TNode>,
    pub previous_is_parent: bool,
    pub claims: &'a mut ClaimRegistry,
    /// Inside an element that opted out of hydration.
    pub skip_hydration: bool,
    pub pool: &'a DehydratedPool,
}

/// Strategy producing DOM nodes for instructions.
pub trait NodeMaterializer {
    fn name(&self) -> &'static str;

    fn is_hydrating(&self) -> bool;

    fn element(&self, cx: &mut MaterializeCx<'_>, tag: &str) -> RenderResult<Materialized>;

    fn text(&self, cx: &mut MaterializeCx<'_>, value: &str) -> RenderResult<Materialized>;

    /// Anchor comment of an `<ng-container>`.
    fn element_container(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized>;

    /// Anchor comment of a template's view container.
    fn container_anchor(&self, cx: &mut MaterializeCx<'_>) -> RenderResult<Materialized>;
}

/// Pick the strategy for a context.
pub fn select(config: &RenderConfig) -> Box<dyn NodeMaterializer> {
    if config.hydration {
        Box::new(HydratingMaterializer)
    } else {
        Box::new(CreatingMaterializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(select(&RenderConfig::default()).name(), "creating");
        let hydrating = select(&RenderConfig::hydrating());
        assert_eq!(hydrating.name(), "hydrating");
        assert!(hydrating.is_hydrating());
    }
}
