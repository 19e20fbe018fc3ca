//! Instructions - the API compiled template functions call.
//!
//! All render state lives in an explicit [`RenderContext`]: the document, the
//! view arenas, the position stack and the materialization strategy chosen at
//! construction. A template function receives `&mut RenderContext` and calls
//! instructions in template order:
//!
//! ```ignore
//! let tview = ctx.create_tview(TViewDef::new(3, 1, |ctx, flags| {
//!     if flags.contains(RenderFlags::CREATE) {
//!         ctx.element_start(0, "div", None, None)?;
//!         ctx.text(1, None)?;
//!         ctx.element_end()?;
//!     }
//!     if flags.contains(RenderFlags::UPDATE) {
//!         ctx.text_interpolate(1, "Hello")?;
//!     }
//!     Ok(())
//! }));
//! ```
//!
//! Nested renders (embedded views created from inside a template function)
//! push their own position frame, so they never disturb the caller.

mod directives;
mod element;
mod element_container;
mod i18n;
mod shared;
mod template;
mod text;

pub use directives::{DirectiveResolver, DirectiveSite};

use std::rc::Rc;

use tracing::debug;

use crate::config::RenderConfig;
use crate::dom::{Dom, NodeId};
use crate::engine::{LView, PositionState, TView, TViewDef, ViewRegistry};
use crate::error::RenderResult;
use crate::hydration::{annotate_for_hydration, serialize_view, ClaimRegistry, DehydratedPool, SerializedView};
use crate::materialize::{self, NodeMaterializer};
use crate::types::{LViewFlags, LViewId, RenderFlags, SlotIndex, TViewId};

pub struct RenderContext {
    pub(crate) dom: Dom,
    pub(crate) config: RenderConfig,
    pub(crate) materializer: Box<dyn NodeMaterializer>,
    pub(crate) registry: ViewRegistry,
    pub(crate) state: PositionState,
    pub(crate) claims: ClaimRegistry,
    pub(crate) dehydrated: DehydratedPool,
    pub(crate) directives: Option<Rc<dyn DirectiveResolver>>,
}

impl RenderContext {
    pub fn new(dom: Dom, config: RenderConfig) -> Self {
        let materializer = materialize::select(&config);
        debug!(strategy = materializer.name(), "render context created");
        Self {
            dom,
            config,
            materializer,
            registry: ViewRegistry::new(),
            state: PositionState::new(),
            claims: ClaimRegistry::new(),
            dehydrated: DehydratedPool::new(),
            directives: None,
        }
    }

    pub fn with_directives(mut self, resolver: Rc<dyn DirectiveResolver>) -> Self {
        self.directives = Some(resolver);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    pub fn dehydrated_views(&self) -> &DehydratedPool {
        &self.dehydrated
    }

    pub fn is_hydrating(&self) -> bool {
        self.materializer.is_hydrating()
    }

    pub fn materializer_name(&self) -> &'static str {
        self.materializer.name()
    }

    pub fn create_tview(&mut self, def: TViewDef) -> TViewId {
        self.registry.create_tview(def)
    }

    pub fn tview(&self, id: TViewId) -> RenderResult<&TView> {
        self.registry.tview(id)
    }

    pub fn lview(&self, id: LViewId) -> RenderResult<&LView> {
        self.registry.lview(id)
    }

    /// DOM node stored at `index` of a view.
    pub fn native(&self, view: LViewId, index: usize) -> RenderResult<Option<NodeId>> {
        Ok(self.registry.lview(view)?.native(SlotIndex(index)))
    }

    // =========================================================================
    // View passes
    // =========================================================================

    /// Run the creation pass of a view.
    ///
    /// The first successful pass over a TView freezes it.
    pub fn render_view(&mut self, view: LViewId) -> RenderResult<()> {
        self.execute(view, RenderFlags::CREATE)?;

        let (tview, lview) = self.registry.view_pair_mut(view)?;
        if tview.first_create_pass {
            tview.first_create_pass = false;
            debug!(tview = %tview.id, slots = tview.data.len(), "first creation pass complete");
        }
        lview.header.flags.remove(LViewFlags::CREATION_MODE);
        Ok(())
    }

    /// Run the update pass of a view, then of every view in its containers.
    pub fn refresh_view(&mut self, view: LViewId) -> RenderResult<()> {
        self.execute(view, RenderFlags::UPDATE)?;

        for container in self.registry.lview(view)?.containers() {
            let children = self.registry.container(container)?.views.clone();
            for child in children {
                self.refresh_view(child)?;
            }
        }
        Ok(())
    }

    fn execute(&mut self, view: LViewId, flags: RenderFlags) -> RenderResult<()> {
        let (tview, template, binding_start) = {
            let (tview, _) = self.registry.view_pair(view)?;
            (tview.id, tview.template.clone(), tview.binding_start_index)
        };

        self.state.enter_view(view, tview, binding_start);
        match template(self, flags) {
            Ok(()) => {
                self.state.leave_view()?;
                Ok(())
            }
            Err(err) => {
                self.state.abandon_view();
                Err(err)
            }
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    pub fn serialize(&self, view: LViewId) -> RenderResult<SerializedView> {
        serialize_view(&self.dom, &self.registry, view)
    }

    /// Serialize a root view onto its host's hydration attribute.
    pub fn annotate(&self, view: LViewId) -> RenderResult<SerializedView> {
        annotate_for_hydration(&self.dom, &self.registry, view, &self.config.ngh_attribute)
    }
}
