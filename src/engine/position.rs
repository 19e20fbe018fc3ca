//! Position State - "current node" tracking for the instruction stream.
//!
//! Each view being rendered gets an [`LFrame`] pushed on entry and popped on
//! exit. Within a frame two cells encode the whole nesting state:
//! - `current_tnode`: the node most recently opened or closed
//! - `is_parent`: whether that node is still open
//!
//! A Start instruction makes its node current and open. The matching End
//! either closes it (if still open, i.e. empty) or walks up to the static
//! parent. Nested renders (an embedded view created from inside a template
//! function) push their own frame, so the outer position is never clobbered.

use crate::error::{dev_assert, RenderResult, StructuralError};
use crate::types::{LViewId, SlotIndex, TViewId};

/// Open i18n block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nFrame {
    /// Slot holding the block's `TI18n`.
    pub index: SlotIndex,
    /// Logical parent of the message's top-level nodes.
    pub parent: Option<SlotIndex>,
    /// Nodes materialized by locating existing DOM.
    pub located: usize,
    /// Element slots opened inside the block, in instruction order.
    pub elements: Vec<SlotIndex>,
}

/// Per-view render state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LFrame {
    pub lview: LViewId,
    pub tview: TViewId,
    pub current_tnode: Option<SlotIndex>,
    pub is_parent: bool,
    pub binding_index: usize,
    /// Open element / element-container count, for balance checking.
    pub element_depth: usize,
    /// Element whose subtree opted out of hydration.
    pub skip_hydration_root: Option<SlotIndex>,
    pub i18n: Option<I18nFrame>,
    pub exp_mask: u32,
    pub exp_shift: u32,
}

impl LFrame {
    fn new(lview: LViewId, tview: TViewId, binding_start: usize) -> Self {
        Self {
            lview,
            tview,
            current_tnode: None,
            is_parent: false,
            binding_index: binding_start,
            element_depth: 0,
            skip_hydration_root: None,
            i18n: None,
            exp_mask: 0,
            exp_shift: 0,
        }
    }

    /// Parent TNode for the next node created at this position.
    pub fn parent_for_next(&self, parent_of_current: Option<SlotIndex>) -> Option<SlotIndex> {
        if self.is_parent {
            self.current_tnode
        } else {
            parent_of_current
        }
    }
}

#[derive(Debug, Default)]
pub struct PositionState {
    frames: Vec<LFrame>,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_view(&mut self, lview: LViewId, tview: TViewId, binding_start: usize) {
        self.frames.push(LFrame::new(lview, tview, binding_start));
    }

    /// Pop the current frame, checking that every Start got its End.
    pub fn leave_view(&mut self) -> RenderResult<LFrame> {
        let frame = self.frames.pop().ok_or(StructuralError::NoActiveView)?;
        dev_assert!(
            frame.element_depth == 0 && frame.i18n.is_none(),
            StructuralError::UnclosedNodes {
                view: frame.lview,
                open: frame.element_depth + usize::from(frame.i18n.is_some()),
            }
        );
        Ok(frame)
    }

    /// Pop without checks (error unwinding).
    pub fn abandon_view(&mut self) -> Option<LFrame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self) -> RenderResult<&LFrame> {
        self.frames
            .last()
            .ok_or_else(|| StructuralError::NoActiveView.into())
    }

    pub fn frame_mut(&mut self) -> RenderResult<&mut LFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| StructuralError::NoActiveView.into())
    }

    // =========================================================================
    // Current node
    // =========================================================================

    pub fn set_current_tnode(&mut self, tnode: SlotIndex, is_parent: bool) -> RenderResult<()> {
        let frame = self.frame_mut()?;
        frame.current_tnode = Some(tnode);
        frame.is_parent = is_parent;
        Ok(())
    }

    pub fn set_current_tnode_as_not_parent(&mut self) -> RenderResult<()> {
        self.frame_mut()?.is_parent = false;
        Ok(())
    }

    pub fn get_current_tnode(&self) -> Option<SlotIndex> {
        self.frames.last().and_then(|frame| frame.current_tnode)
    }

    pub fn is_current_tnode_parent(&self) -> bool {
        self.frames.last().is_some_and(|frame| frame.is_parent)
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    /// Claim the next binding slot.
    pub fn next_binding_index(&mut self) -> RenderResult<usize> {
        let frame = self.frame_mut()?;
        let index = frame.binding_index;
        frame.binding_index += 1;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PositionState {
        let mut state = PositionState::new();
        state.enter_view(LViewId::from_index(0), TViewId::from_index(0), 4);
        state
    }

    #[test]
    fn test_current_tnode_cells() {
        let mut state = state();
        assert_eq!(state.get_current_tnode(), None);
        assert!(!state.is_current_tnode_parent());

        state.set_current_tnode(SlotIndex(1), true).unwrap();
        assert_eq!(state.get_current_tnode(), Some(SlotIndex(1)));
        assert!(state.is_current_tnode_parent());

        state.set_current_tnode_as_not_parent().unwrap();
        assert_eq!(state.get_current_tnode(), Some(SlotIndex(1)));
        assert!(!state.is_current_tnode_parent());
    }

    #[test]
    fn test_nested_frames_are_isolated() {
        let mut state = state();
        state.set_current_tnode(SlotIndex(2), true).unwrap();

        state.enter_view(LViewId::from_index(1), TViewId::from_index(1), 0);
        assert_eq!(state.get_current_tnode(), None);
        state.set_current_tnode(SlotIndex(0), false).unwrap();
        state.leave_view().unwrap();

        assert_eq!(state.get_current_tnode(), Some(SlotIndex(2)));
        assert!(state.is_current_tnode_parent());
    }

    #[test]
    fn test_binding_index() {
        let mut state = state();
        assert_eq!(state.next_binding_index().unwrap(), 4);
        assert_eq!(state.next_binding_index().unwrap(), 5);
    }

    #[test]
    fn test_parent_for_next() {
        let mut frame = LFrame::new(LViewId::from_index(0), TViewId::from_index(0), 0);
        frame.current_tnode = Some(SlotIndex(3));
        frame.is_parent = true;
        assert_eq!(frame.parent_for_next(Some(SlotIndex(1))), Some(SlotIndex(3)));
        frame.is_parent = false;
        assert_eq!(frame.parent_for_next(Some(SlotIndex(1))), Some(SlotIndex(1)));
    }

    #[cfg(feature = "dev-mode")]
    #[test]
    fn test_leave_view_reports_unclosed() {
        let mut state = state();
        state.frame_mut().unwrap().element_depth = 1;
        assert!(matches!(
            state.leave_view(),
            Err(crate::error::RenderError::Structural(
                StructuralError::UnclosedNodes { open: 1, .. }
            ))
        ));
    }

    #[test]
    fn test_no_active_view() {
        let mut state = PositionState::new();
        assert!(state.frame().is_err());
        assert!(state.leave_view().is_err());
        assert!(state.set_current_tnode_as_not_parent().is_err());
    }
}
