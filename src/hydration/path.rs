//! Node path mini-language.
//!
//! `<anchor>(.firstChild|.nextSibling)*` where the anchor is `host` (the
//! view's render parent) or a numeric slot index of an element already
//! materialized in the same view. Resolution only ever follows
//! `firstChild` / `nextSibling` links.

use std::fmt;
use std::str::FromStr;

use crate::dom::{Dom, NodeId};
use crate::engine::LView;
use crate::error::{HydrationError, RenderError, RenderResult};
use crate::types::SlotIndex;

pub const HOST_ANCHOR: &str = "host";
const FIRST_CHILD: &str = "firstChild";
const NEXT_SIBLING: &str = "nextSibling";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAnchor {
    Host,
    Slot(SlotIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    FirstChild,
    NextSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    pub anchor: PathAnchor,
    pub steps: Vec<PathStep>,
}

impl FromStr for NodePath {
    type Err = RenderError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| {
            RenderError::from(HydrationError::InvalidPath {
                path: path.to_string(),
                reason,
            })
        };

        let mut segments = path.split('.');
        let anchor = match segments.next() {
            Some(HOST_ANCHOR) => PathAnchor::Host,
            Some(segment) => segment
                .parse::<usize>()
                .map(|index| PathAnchor::Slot(SlotIndex(index)))
                .map_err(|_| invalid(format!("`{segment}` is neither `host` nor a slot index")))?,
            None => return Err(invalid("empty path".to_string())),
        };

        let steps = segments
            .map(|segment| match segment {
                FIRST_CHILD => Ok(PathStep::FirstChild),
                NEXT_SIBLING => Ok(PathStep::NextSibling),
                other => Err(invalid(format!("unknown step `{other}`"))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NodePath { anchor, steps })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            PathAnchor::Host => f.write_str(HOST_ANCHOR)?,
            PathAnchor::Slot(index) => write!(f, "{index}")?,
        }
        for step in &self.steps {
            f.write_str(match step {
                PathStep::FirstChild => ".firstChild",
                PathStep::NextSibling => ".nextSibling",
            })?;
        }
        Ok(())
    }
}

impl NodePath {
    /// Path from `anchor_node` down to `target`, if `target` is a descendant.
    pub fn between(dom: &Dom, anchor: PathAnchor, anchor_node: NodeId, target: NodeId) -> Option<Self> {
        let mut chain = vec![target];
        let mut node = target;
        while node != anchor_node {
            node = dom.parent(node)?;
            chain.push(node);
        }
        chain.reverse();

        let mut steps = Vec::new();
        for child in chain.iter().skip(1) {
            steps.push(PathStep::FirstChild);
            let position = dom.child_position(*child)?;
            steps.extend(std::iter::repeat_n(PathStep::NextSibling, position));
        }
        Some(NodePath { anchor, steps })
    }

    /// Walk the path from `start`.
    pub fn walk(&self, dom: &Dom, start: NodeId) -> RenderResult<NodeId> {
        let mut node = start;
        for (step, kind) in self.steps.iter().enumerate() {
            let next = match kind {
                PathStep::FirstChild => dom.first_child(node),
                PathStep::NextSibling => dom.next_sibling(node),
            };
            node = next.ok_or_else(|| HydrationError::PathWalkFailed {
                path: self.to_string(),
                step: step + 1,
            })?;
        }
        Ok(node)
    }
}

/// Resolve a serialized path inside a view.
pub fn find_existing_node(dom: &Dom, lview: &LView, path: &str) -> RenderResult<NodeId> {
    let path: NodePath = path.parse()?;
    let start = match path.anchor {
        PathAnchor::Host => lview.header.host.ok_or(HydrationError::MissingHost)?,
        PathAnchor::Slot(index) => lview
            .native(index)
            .ok_or(HydrationError::MissingAnchor { index })?,
    };
    path.walk(dom, start)
}

/// The node `count` `nextSibling` steps after `from`.
pub fn sibling_after(dom: &Dom, count: usize, from: NodeId) -> Option<NodeId> {
    let mut node = from;
    for _ in 0..count {
        node = dom.next_sibling(node)?;
    }
    Some(node)
}

/// The node `count` `previousSibling` steps before `from`.
pub(crate) fn sibling_before(dom: &Dom, count: usize, from: NodeId) -> Option<NodeId> {
    let mut node = from;
    for _ in 0..count {
        node = dom.previous_sibling(node)?;
    }
    Some(node)
}
