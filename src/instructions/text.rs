//! `text` and its update-pass binding.

use tracing::trace;

use crate::error::{HydrationError, RenderResult};
use crate::materialize::MaterializeRequest;
use crate::types::{SlotIndex, TNodeType};

use super::shared::NodeSpec;
use super::RenderContext;

impl RenderContext {
    /// Create a text node. Text nodes never have children, so this is a
    /// Start and End in one call.
    pub fn text(&mut self, index: usize, value: Option<&str>) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, _) = self.active()?;
        self.check_creation_slot(index)?;
        self.resolve_tnode(
            index,
            NodeSpec {
                value,
                ..NodeSpec::new(TNodeType::Text)
            },
        )?;

        let materialized = self.materialize(index, MaterializeRequest::Text(value.unwrap_or_default()))?;
        self.store_node(view, index, materialized)?;
        trace!(%index, created = materialized.created, "text");

        self.state.set_current_tnode(index, false)
    }

    /// Update the text node at `index` if `value` differs from the last one.
    pub fn text_interpolate(&mut self, index: usize, value: &str) -> RenderResult<()> {
        let index = SlotIndex(index);
        if !self.binding_updated(value)? {
            return Ok(());
        }
        let (view, _) = self.active()?;
        let node = self
            .registry
            .lview(view)?
            .native(index)
            .ok_or(HydrationError::MissingNode { index })?;
        self.dom.set_data(node, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::RenderConfig;
    use crate::dom::Dom;
    use crate::engine::TViewDef;
    use crate::pipeline::{mount, refresh};
    use crate::types::RenderFlags;

    #[test]
    fn test_text_and_interpolation() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let mut ctx = RenderContext::new(dom, RenderConfig::default());

        let count = Rc::new(Cell::new(0));
        let source = count.clone();
        let tview = ctx.create_tview(TViewDef::new(2, 1, move |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.text(0, Some("Count: "))?;
                ctx.text(1, None)?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.text_interpolate(1, &source.get().to_string())?;
            }
            Ok(())
        }));

        let handle = mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "Count: 0");

        count.set(3);
        refresh(&mut ctx, &handle).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "Count: 3");

        let slot = ctx.lview(handle.root()).unwrap().slot(SlotIndex(2)).clone();
        assert_eq!(slot, crate::engine::Slot::Binding("3".into()));
    }

    #[test]
    fn test_unchanged_binding_leaves_dom_alone() {
        let dom = Dom::new();
        let host = dom.create_element("host");
        let mut ctx = RenderContext::new(dom, RenderConfig::default());
        let tview = ctx.create_tview(TViewDef::new(1, 1, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.text(0, None)?;
            }
            if flags.contains(RenderFlags::UPDATE) {
                ctx.text_interpolate(0, "same")?;
            }
            Ok(())
        }));

        let handle = mount(&mut ctx, host, tview).unwrap();
        let text = ctx.dom().first_child(host).unwrap();
        ctx.dom().set_data(text, "edited");
        refresh(&mut ctx, &handle).unwrap();
        assert_eq!(ctx.dom().data(text).as_deref(), Some("edited"));
    }
}
