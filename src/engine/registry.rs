//! View Registry - Arenas for TViews, LViews and LContainers.
//!
//! Manages the lifecycle of view handles:
//! - TViews are append-only (a compiled template lives as long as the context)
//! - LView / LContainer slots are released on destroy and reused from a free pool
//! - Lookups return typed errors instead of panicking on stale handles

use crate::error::{RenderResult, StructuralError};
use crate::types::{LContainerId, LViewId, TViewId};

use super::lview::{LContainer, LView};
use super::tview::{TView, TViewDef};

#[derive(Debug, Default)]
pub struct ViewRegistry {
    tviews: Vec<TView>,
    lviews: Vec<Option<LView>>,
    containers: Vec<Option<LContainer>>,
    free_lviews: Vec<usize>,
    free_containers: Vec<usize>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // TViews
    // =========================================================================

    pub fn create_tview(&mut self, def: TViewDef) -> TViewId {
        let id = TViewId::from_index(self.tviews.len());
        self.tviews.push(TView::new(id, def));
        id
    }

    pub fn tview(&self, id: TViewId) -> RenderResult<&TView> {
        self.tviews
            .get(id.index())
            .ok_or_else(|| StructuralError::UnknownTView(id).into())
    }

    pub fn tview_mut(&mut self, id: TViewId) -> RenderResult<&mut TView> {
        self.tviews
            .get_mut(id.index())
            .ok_or_else(|| StructuralError::UnknownTView(id).into())
    }

    // =========================================================================
    // LViews
    // =========================================================================

    /// Allocate a slot for a new view, reusing a freed one if possible.
    pub fn allocate_lview(&mut self, lview: LView) -> LViewId {
        match self.free_lviews.pop() {
            Some(index) => {
                self.lviews[index] = Some(lview);
                LViewId::from_index(index)
            }
            None => {
                self.lviews.push(Some(lview));
                LViewId::from_index(self.lviews.len() - 1)
            }
        }
    }

    /// Release a view slot back to the pool.
    pub fn release_lview(&mut self, id: LViewId) -> Option<LView> {
        let lview = self.lviews.get_mut(id.index())?.take()?;
        self.free_lviews.push(id.index());
        Some(lview)
    }

    pub fn lview(&self, id: LViewId) -> RenderResult<&LView> {
        self.lviews
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| StructuralError::UnknownView(id).into())
    }

    pub fn lview_mut(&mut self, id: LViewId) -> RenderResult<&mut LView> {
        self.lviews
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| StructuralError::UnknownView(id).into())
    }

    /// Borrow a view together with its TView.
    pub fn view_pair(&self, id: LViewId) -> RenderResult<(&TView, &LView)> {
        let lview = self.lview(id)?;
        let tview = self.tview(lview.header.tview)?;
        Ok((tview, lview))
    }

    /// Mutable borrow of a view and its TView (disjoint arenas).
    pub fn view_pair_mut(&mut self, id: LViewId) -> RenderResult<(&mut TView, &mut LView)> {
        let lview = self
            .lviews
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(StructuralError::UnknownView(id))?;
        let tview_id = lview.header.tview;
        let tview = self
            .tviews
            .get_mut(tview_id.index())
            .ok_or(StructuralError::UnknownTView(tview_id))?;
        Ok((tview, lview))
    }

    pub fn is_alive(&self, id: LViewId) -> bool {
        self.lview(id).is_ok()
    }

    // =========================================================================
    // LContainers
    // =========================================================================

    pub fn allocate_container(&mut self, container: LContainer) -> LContainerId {
        match self.free_containers.pop() {
            Some(index) => {
                self.containers[index] = Some(container);
                LContainerId::from_index(index)
            }
            None => {
                self.containers.push(Some(container));
                LContainerId::from_index(self.containers.len() - 1)
            }
        }
    }

    pub fn release_container(&mut self, id: LContainerId) -> Option<LContainer> {
        let container = self.containers.get_mut(id.index())?.take()?;
        self.free_containers.push(id.index());
        Some(container)
    }

    pub fn container(&self, id: LContainerId) -> RenderResult<&LContainer> {
        self.containers
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| StructuralError::UnknownContainer(id).into())
    }

    pub fn container_mut(&mut self, id: LContainerId) -> RenderResult<&mut LContainer> {
        self.containers
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| StructuralError::UnknownContainer(id).into())
    }

    /// Number of live views (for tests and diagnostics).
    pub fn lview_count(&self) -> usize {
        self.lviews.iter().filter(|slot| slot.is_some()).count()
    }
}
