//! Mount API - root view lifecycle and deferred cleanup.
//!
//! This module provides the entry point for rendering a template into a host
//! element. When the context hydrates, the host's `ngh` attribute is read and
//! the render reconciles against the server DOM instead of creating it.
//!
//! # Example
//!
//! ```ignore
//! use spark_view::{mount, refresh, unmount, RenderConfig, RenderContext};
//!
//! let mut ctx = RenderContext::new(dom, RenderConfig::hydrating());
//! let handle = mount(&mut ctx, host, app)?;
//!
//! // Application state changed
//! refresh(&mut ctx, &handle)?;
//!
//! // Nothing pending: unclaimed server views can go
//! handle.mark_stable();
//!
//! unmount(&mut ctx, handle)?;
//! ```

use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use crate::dom::NodeId;
use crate::engine::LView;
use crate::error::RenderResult;
use crate::hydration::{schedule_cleanup_on_stable, HydrationInfo, SerializedView};
use crate::instructions::RenderContext;
use crate::types::{LViewFlags, LViewId, TViewId};

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Holds:
/// - The root view
/// - The `stable` signal watched by the cleanup effect
/// - The cleanup effect's stop function (hydrating mounts only)
pub struct MountHandle {
    root: LViewId,
    host: NodeId,
    stable: Signal<bool>,
    stop_cleanup: Option<Box<dyn FnOnce()>>,
}

impl MountHandle {
    pub fn root(&self) -> LViewId {
        self.root
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Report that the application settled. Dehydrated views nobody claimed
    /// by now are removed from the DOM.
    pub fn mark_stable(&self) {
        self.stable.set(true);
    }

    pub fn is_stable(&self) -> bool {
        self.stable.get()
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_cleanup.take() {
            stop();
        }
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Render `tview` into `host`.
///
/// This runs:
/// 1. Hydration record lookup (hydrating contexts only)
/// 2. The creation pass
/// 3. The first update pass
/// 4. Cleanup scheduling for unclaimed server views
///
/// A host without a record is cleared and rendered from scratch. On failure
/// the partially built view is torn down and the error returned.
pub fn mount(ctx: &mut RenderContext, host: NodeId, tview: TViewId) -> RenderResult<MountHandle> {
    let len = ctx.registry.tview(tview)?.data.len();
    let mut lview = LView::new(tview, len);
    lview.header.host = Some(host);
    lview.header.flags |= LViewFlags::IS_ROOT;

    let attribute = ctx.config.ngh_attribute.clone();
    match ctx.dom.attribute(host, &attribute).filter(|_| ctx.is_hydrating()) {
        Some(json) => {
            let record = SerializedView::from_json(&json)?;
            ctx.dom.remove_attribute(host, &attribute);
            lview.header.hydration = Some(HydrationInfo::new(record, ctx.dom.first_child(host)));
            lview.header.flags |= LViewFlags::HYDRATED;
        }
        None => {
            if ctx.is_hydrating() {
                debug!(%host, "host carries no hydration record, rendering from scratch");
            }
            ctx.dom.clear_children(host);
        }
    }
    let hydrated = lview.header.hydration.is_some();

    let root = ctx.registry.allocate_lview(lview);
    debug!(%root, %host, hydrated, strategy = ctx.materializer_name(), "mounting");

    let rendered = ctx.render_view(root).and_then(|()| ctx.refresh_view(root));
    if let Err(err) = rendered {
        if let Err(cleanup) = ctx.destroy_view(root) {
            warn!(%root, error = %cleanup, "could not tear down a root view whose render failed");
        }
        return Err(err);
    }

    let stable = signal(false);
    let stop_cleanup = (hydrated && ctx.config.cleanup_on_stable).then(|| {
        schedule_cleanup_on_stable(ctx.dom.clone(), ctx.dehydrated.clone(), stable.clone())
    });
    debug!(%root, claimed = ctx.claims.len(), pending = ctx.dehydrated.len(), "mounted");

    Ok(MountHandle {
        root,
        host,
        stable,
        stop_cleanup,
    })
}

/// Re-run the update pass of the mounted tree.
pub fn refresh(ctx: &mut RenderContext, handle: &MountHandle) -> RenderResult<()> {
    ctx.refresh_view(handle.root)
}

/// Destroy the mounted tree and stop its cleanup effect.
pub fn unmount(ctx: &mut RenderContext, handle: MountHandle) -> RenderResult<()> {
    let root = handle.root;
    drop(handle);
    ctx.destroy_view(root)?;
    debug!(%root, "unmounted");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RenderConfig;
    use crate::dom::Dom;
    use crate::engine::TViewDef;
    use crate::types::RenderFlags;

    fn paragraph() -> TViewDef {
        TViewDef::new(2, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "p", None, None)?;
                ctx.text(1, Some("hi"))?;
                ctx.element_end()?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_mount_and_unmount() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let mut ctx = RenderContext::new(dom, RenderConfig::default());
        let tview = ctx.create_tview(paragraph());

        let handle = mount(&mut ctx, host, tview).unwrap();
        assert_eq!(handle.host(), host);
        assert_eq!(ctx.dom().inner_html(host), "<p>hi</p>");
        assert!(ctx.lview(handle.root()).unwrap().header.flags.contains(LViewFlags::IS_ROOT));
        assert!(!ctx.lview(handle.root()).unwrap().is_creation_mode());

        unmount(&mut ctx, handle).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "");
        assert_eq!(ctx.registry().lview_count(), 0);
    }

    #[test]
    fn test_creating_mount_clears_host() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let stale = dom.create_text("stale");
        dom.append_child(host, stale);
        let mut ctx = RenderContext::new(dom, RenderConfig::default());
        let tview = ctx.create_tview(paragraph());

        mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<p>hi</p>");
    }

    #[test]
    fn test_hydrating_mount_claims_server_nodes() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let p = dom.create_element("p");
        let text = dom.create_text("hi");
        dom.append_child(host, p);
        dom.append_child(p, text);
        dom.set_attribute(host, "ngh", "{}");

        let mut ctx = RenderContext::new(dom, RenderConfig::hydrating());
        let tview = ctx.create_tview(paragraph());
        let handle = mount(&mut ctx, host, tview).unwrap();

        assert_eq!(ctx.native(handle.root(), 0).unwrap(), Some(p));
        assert_eq!(ctx.native(handle.root(), 1).unwrap(), Some(text));
        assert_eq!(ctx.claims().len(), 2);
        assert_eq!(ctx.dom().attribute(host, "ngh"), None);
        let lview = ctx.lview(handle.root()).unwrap();
        assert!(lview.header.flags.contains(LViewFlags::HYDRATED));
    }

    #[test]
    fn test_hydrating_mount_without_record() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let stale = dom.create_element("span");
        dom.append_child(host, stale);

        let mut ctx = RenderContext::new(dom, RenderConfig::hydrating());
        let tview = ctx.create_tview(paragraph());
        mount(&mut ctx, host, tview).unwrap();

        assert_eq!(ctx.dom().inner_html(host), "<p>hi</p>");
        assert!(ctx.claims().is_empty());
    }

    #[test]
    fn test_unclaimed_views_removed_once_stable() {
        // <host>stale<!--container--></host>, `stale` is a server view nobody renders
        let dom = Dom::new();
        let host = dom.create_element("host");
        let stale = dom.create_text("stale");
        let anchor = dom.create_comment("container");
        dom.append_child(host, stale);
        dom.append_child(host, anchor);
        dom.set_attribute(
            host,
            "ngh",
            r#"{"containers":{"0":{"numRootNodes":0,"views":[{"template":"t0","numRootNodes":1}]}}}"#,
        );

        let mut ctx = RenderContext::new(dom, RenderConfig::hydrating());
        let item = ctx.create_tview(TViewDef::new(0, 0, |_, _| Ok(())).embedded("t0"));
        let root = ctx.create_tview(TViewDef::new(1, 0, move |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.template(0, item, None, None)?;
            }
            Ok(())
        }));

        let handle = mount(&mut ctx, host, root).unwrap();
        assert_eq!(ctx.native(handle.root(), 0).unwrap(), Some(anchor));
        assert_eq!(ctx.dehydrated_views().len(), 1);
        assert!(!handle.is_stable());

        handle.mark_stable();
        assert!(handle.is_stable());
        assert_eq!(ctx.dom().inner_html(host), "<!--container-->");
        assert!(ctx.dehydrated_views().is_empty());
    }

    #[test]
    fn test_failed_mount_tears_down() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let mut ctx = RenderContext::new(dom, RenderConfig::default());
        let tview = ctx.create_tview(TViewDef::new(1, 0, |ctx, _| {
            ctx.text(0, Some("partial"))?;
            ctx.text(3, None)
        }));

        assert!(mount(&mut ctx, host, tview).is_err());
        assert_eq!(ctx.dom().inner_html(host), "");
        assert_eq!(ctx.registry().lview_count(), 0);
    }
}
