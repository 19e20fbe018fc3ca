//! Dehydrated view pool and deferred cleanup.
//!
//! Server-rendered views that no runtime view has claimed stay in the DOM
//! until the application reports stable. A `spark_signals` effect watches the
//! stable signal and sweeps whatever is left in the pool.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use spark_signals::{effect, Signal};
use tracing::{debug, warn};

use crate::dom::{Dom, NodeId};
use crate::types::{LViewId, SlotIndex};

use super::info::DehydratedView;

type PoolKey = (LViewId, SlotIndex);

/// Dehydrated views per container, keyed by `(declaring view, slot)`.
#[derive(Debug, Clone, Default)]
pub struct DehydratedPool {
    inner: Rc<RefCell<BTreeMap<PoolKey, Vec<DehydratedView>>>>,
}

impl DehydratedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, view: LViewId, index: SlotIndex, views: Vec<DehydratedView>) {
        if views.is_empty() {
            return;
        }
        self.inner.borrow_mut().insert((view, index), views);
    }

    /// Number of views still waiting to be claimed.
    pub fn len(&self) -> usize {
        self.inner.borrow().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending(&self, view: LViewId, index: SlotIndex) -> usize {
        self.inner
            .borrow()
            .get(&(view, index))
            .map_or(0, Vec::len)
    }

    /// Take the container's next dehydrated view if it was rendered from
    /// `template`. On a mismatch the remaining server views of that container
    /// can no longer line up with runtime views, so they are dropped.
    pub fn take_matching(
        &self,
        dom: &Dom,
        view: LViewId,
        index: SlotIndex,
        template: Option<&str>,
    ) -> Option<DehydratedView> {
        let mut inner = self.inner.borrow_mut();
        let views = inner.get_mut(&(view, index))?;
        let matches = template.is_some() && views.first().and_then(DehydratedView::template) == template;

        if matches {
            let taken = views.remove(0);
            if views.is_empty() {
                inner.remove(&(view, index));
            }
            return Some(taken);
        }

        let dropped = inner.remove(&(view, index)).unwrap_or_default();
        drop(inner);
        debug!(%view, %index, count = dropped.len(), "dropping mismatched dehydrated views");
        for stale in &dropped {
            remove_view_nodes(dom, stale);
        }
        None
    }

    /// Remove the server nodes of every pending view of one container.
    pub fn remove_for(&self, dom: &Dom, view: LViewId, index: SlotIndex) -> usize {
        let removed = self.inner.borrow_mut().remove(&(view, index));
        removed.map_or(0, |views| {
            views.iter().for_each(|stale| remove_view_nodes(dom, stale));
            views.len()
        })
    }

    /// Remove pending views of every container declared in `view`.
    pub fn remove_for_view(&self, dom: &Dom, view: LViewId) -> usize {
        let keys: Vec<PoolKey> = self
            .inner
            .borrow()
            .keys()
            .filter(|(owner, _)| *owner == view)
            .copied()
            .collect();
        keys.into_iter()
            .map(|(owner, index)| self.remove_for(dom, owner, index))
            .sum()
    }

    /// Remove every pending view from the DOM. Returns the number of views.
    pub fn cleanup(&self, dom: &Dom) -> usize {
        let pending = std::mem::take(&mut *self.inner.borrow_mut());
        let mut count = 0;
        for views in pending.values() {
            for stale in views {
                remove_view_nodes(dom, stale);
                count += 1;
            }
        }
        count
    }
}

/// Detach the root nodes of a dehydrated view.
fn remove_view_nodes(dom: &Dom, view: &DehydratedView) {
    let mut nodes: Vec<NodeId> = Vec::with_capacity(view.num_root_nodes());
    let mut current = view.first_child;
    for _ in 0..view.num_root_nodes() {
        let Some(node) = current else { break };
        nodes.push(node);
        current = dom.next_sibling(node);
    }
    for node in nodes {
        dom.remove(node);
    }
}

/// Sweep the pool once `stable` becomes true.
///
/// Returns the effect's stop function.
pub fn schedule_cleanup_on_stable(
    dom: Dom,
    pool: DehydratedPool,
    stable: Signal<bool>,
) -> Box<dyn FnOnce()> {
    let stop = effect(move || {
        if !stable.get() {
            return;
        }
        let removed = pool.cleanup(&dom);
        if removed > 0 {
            warn!(removed, "removed dehydrated views that were never claimed");
        }
    });
    Box::new(stop)
}
