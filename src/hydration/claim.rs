//! Claimed-node bookkeeping.
//!
//! Every located node is claimed exactly once; a second claim means two slots
//! resolved to the same server node.

use std::collections::HashSet;

use crate::dom::NodeId;
use crate::error::{dev_assert, RenderError, RenderResult};

#[derive(Debug, Default)]
pub struct ClaimRegistry {
    claimed: HashSet<NodeId>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, node: NodeId) -> RenderResult<()> {
        let fresh = self.claimed.insert(node);
        dev_assert!(fresh, RenderError::AlreadyClaimed { node });
        Ok(())
    }

    pub fn is_claimed(&self, node: NodeId) -> bool {
        self.claimed.contains(&node)
    }

    pub fn release(&mut self, node: NodeId) {
        self.claimed.remove(&node);
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
