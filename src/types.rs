//! Core types for spark-view.
//!
//! Typed handles into the runtime arenas plus the tags and bitflags shared by
//! the static half (TView/TNode) and the live half (LView/LContainer).
//!
//! Instruction indices are header-relative: index `0` is the first template
//! slot. The LView header lives in its own struct
//! ([`LViewHeader`](crate::engine::LViewHeader)), so a [`SlotIndex`] addresses
//! the data region of both `TView.data` and `LView.data` directly.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Handles
// =============================================================================

/// Position of a template node inside a view.
///
/// The same index addresses the TNode in `TView.data` and the live value in
/// `LView.data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SlotIndex {
    fn from(index: usize) -> Self {
        SlotIndex(index)
    }
}

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                $name(index as u32)
            }

            #[inline]
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_handle!(
    /// Handle of a compiled template (shared by every instance).
    TViewId,
    "tview#"
);
arena_handle!(
    /// Handle of a live view instance.
    LViewId,
    "lview#"
);
arena_handle!(
    /// Handle of a live view container.
    LContainerId,
    "lcontainer#"
);

// =============================================================================
// TNode / TView tags
// =============================================================================

/// Kind of a template node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TNodeType {
    /// Text node.
    Text,
    /// Regular element.
    Element,
    /// `<ng-template>` anchor hosting embedded views.
    Container,
    /// `<ng-container>`: logical grouping rendered as a comment.
    ElementContainer,
    /// `<ng-content>` projection slot.
    Projection,
    /// ICU expression container.
    IcuContainer,
}

impl fmt::Display for TNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TNodeType::Text => "Text",
            TNodeType::Element => "Element",
            TNodeType::Container => "Container",
            TNodeType::ElementContainer => "ElementContainer",
            TNodeType::Projection => "Projection",
            TNodeType::IcuContainer => "IcuContainer",
        };
        f.write_str(name)
    }
}

/// Kind of compiled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TViewType {
    /// Top-level view mounted on a host element.
    #[default]
    Root,
    /// Component template.
    Component,
    /// Embedded view declared by a `template()` instruction.
    Embedded,
}

bitflags::bitflags! {
    /// Static per-node flags, written only during the first creation pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TNodeFlags: u16 {
        const IS_DIRECTIVE_HOST = 1 << 0;
        const HAS_CONTENT_QUERY = 1 << 1;
        /// Node is not attached to the DOM (e.g. dropped by a translation).
        const IS_DETACHED = 1 << 2;
        const IS_PROJECTED = 1 << 3;
        /// Node was produced inside an i18n block.
        const IN_I18N = 1 << 4;
        /// `<ng-container>` that also anchors a view container.
        const IS_VIEW_CONTAINER_ANCHOR = 1 << 5;
        /// Element opts its subtree out of hydration.
        const SKIP_HYDRATION = 1 << 6;
    }
}

bitflags::bitflags! {
    /// Live per-view state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LViewFlags: u16 {
        /// Creation pass has not completed yet.
        const CREATION_MODE = 1 << 0;
        const ATTACHED = 1 << 1;
        const IS_ROOT = 1 << 2;
        /// View was reconciled against server-rendered nodes.
        const HYDRATED = 1 << 3;
    }
}

bitflags::bitflags! {
    /// Which half of a template function to run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u8 {
        const CREATE = 1 << 0;
        const UPDATE = 1 << 1;
    }
}

/// Static attribute list, in declaration order.
pub type Attrs = Vec<(String, String)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(TViewId::from_index(3).to_string(), "tview#3");
        assert_eq!(LViewId::from_index(0).to_string(), "lview#0");
        assert_eq!(SlotIndex(7).to_string(), "7");
    }

    #[test]
    fn test_render_flags() {
        let both = RenderFlags::CREATE | RenderFlags::UPDATE;
        assert!(both.contains(RenderFlags::CREATE));
        assert!(!RenderFlags::UPDATE.contains(RenderFlags::CREATE));
    }
}
