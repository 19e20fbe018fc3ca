//! Directive hook.
//!
//! Directive matching, instantiation and queries belong to the embedding
//! framework. The runtime only asks which flags a node gets on the first pass
//! and calls back on every creation pass of a directive host.

use crate::dom::{Dom, NodeId};
use crate::error::RenderResult;
use crate::types::{Attrs, LViewId, SlotIndex, TNodeFlags};

/// Node a directive is being attached to.
pub struct DirectiveSite<'a> {
    pub dom: &'a Dom,
    pub view: LViewId,
    pub index: SlotIndex,
    pub tag: &'a str,
    pub node: NodeId,
}

pub trait DirectiveResolver {
    /// Flags for a node with this tag and static attributes. Only
    /// [`TNodeFlags::IS_DIRECTIVE_HOST`] and [`TNodeFlags::HAS_CONTENT_QUERY`]
    /// are kept.
    fn matches(&self, tag: &str, attrs: &Attrs) -> TNodeFlags;

    fn instantiate(&self, site: &DirectiveSite<'_>) -> RenderResult<()>;

    fn content_queries(&self, _site: &DirectiveSite<'_>) -> RenderResult<()> {
        Ok(())
    }
}

/// Flags a resolver may set.
pub(crate) const DIRECTIVE_FLAGS: TNodeFlags =
    TNodeFlags::IS_DIRECTIVE_HOST.union(TNodeFlags::HAS_CONTENT_QUERY);
