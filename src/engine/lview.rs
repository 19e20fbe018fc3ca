//! Live half of the data model: LView and LContainer.
//!
//! An LView mirrors its TView slot for slot. Bookkeeping lives in a typed
//! [`LViewHeader`] rather than in leading array slots, so `data[i]` is the live
//! value for `TView.data[i]`.
//!
//! Ownership runs one way: a container owns its child views by id, a view knows
//! its parent container only by id.

use crate::dom::NodeId;
use crate::hydration::HydrationInfo;
use crate::types::{LContainerId, LViewFlags, LViewId, SlotIndex, TViewId};

/// Live value of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slot {
    #[default]
    Empty,
    /// Element, text or `<ng-container>` comment.
    Node(NodeId),
    /// View container and the comment it anchors to.
    Container {
        container: LContainerId,
        anchor: NodeId,
    },
    /// Last value seen by a binding instruction.
    Binding(String),
}

impl Slot {
    /// DOM node standing for this slot (the anchor for containers).
    pub fn native(&self) -> Option<NodeId> {
        match self {
            Slot::Node(node) => Some(*node),
            Slot::Container { anchor, .. } => Some(*anchor),
            _ => None,
        }
    }

    pub fn container(&self) -> Option<LContainerId> {
        match self {
            Slot::Container { container, .. } => Some(*container),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct LViewHeader {
    pub tview: TViewId,
    pub flags: LViewFlags,
    /// Owning container (embedded views only).
    pub parent: Option<LContainerId>,
    /// Render parent for root-level nodes.
    pub host: Option<NodeId>,
    /// Root-level nodes are inserted before this node when set.
    pub insert_before: Option<NodeId>,
    /// Server-side record this view is reconciled against.
    pub hydration: Option<HydrationInfo>,
}

#[derive(Debug)]
pub struct LView {
    pub header: LViewHeader,
    pub data: Vec<Slot>,
}

impl LView {
    pub fn new(tview: TViewId, len: usize) -> Self {
        Self {
            header: LViewHeader {
                tview,
                flags: LViewFlags::CREATION_MODE | LViewFlags::ATTACHED,
                parent: None,
                host: None,
                insert_before: None,
                hydration: None,
            },
            data: vec![Slot::Empty; len],
        }
    }

    pub fn slot(&self, index: SlotIndex) -> &Slot {
        self.data.get(index.get()).unwrap_or(&Slot::Empty)
    }

    pub fn native(&self, index: SlotIndex) -> Option<NodeId> {
        self.slot(index).native()
    }

    /// Write a slot, growing the array for expando slots added after creation.
    pub fn set(&mut self, index: SlotIndex, slot: Slot) {
        if self.data.len() <= index.get() {
            self.data.resize(index.get() + 1, Slot::Empty);
        }
        self.data[index.get()] = slot;
    }

    pub fn is_creation_mode(&self) -> bool {
        self.header.flags.contains(LViewFlags::CREATION_MODE)
    }

    /// Containers declared directly in this view, in slot order.
    pub fn containers(&self) -> Vec<LContainerId> {
        self.data.iter().filter_map(Slot::container).collect()
    }
}

/// Live view container: an anchor comment plus the views inserted before it.
#[derive(Debug)]
pub struct LContainer {
    pub anchor: NodeId,
    pub host_view: LViewId,
    pub index: SlotIndex,
    pub views: Vec<LViewId>,
    /// Template used by `create_embedded_view` (absent for `<ng-container>`).
    pub tview: Option<TViewId>,
}
