//! `elementStart` / `elementEnd` / `element`.

use tracing::trace;

use crate::dom::NodeId;
use crate::engine::type_checks::assert_tnode_type;
use crate::error::{dev_assert, RenderResult, StructuralError};
use crate::materialize::MaterializeRequest;
use crate::types::{LViewId, SlotIndex, TNodeFlags, TNodeType};

use super::directives::DirectiveSite;
use super::shared::NodeSpec;
use super::RenderContext;

impl RenderContext {
    /// Open an element at `index`.
    ///
    /// `attrs_index` and `local_refs_index` address the TView constant pool.
    pub fn element_start(
        &mut self,
        index: usize,
        tag: &str,
        attrs_index: Option<usize>,
        local_refs_index: Option<usize>,
    ) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, tview) = self.active()?;
        self.check_creation_slot(index)?;
        self.resolve_tnode(
            index,
            NodeSpec {
                tag: Some(tag),
                attrs_index,
                local_refs_index,
                ..NodeSpec::new(TNodeType::Element)
            },
        )?;

        let materialized = self.materialize(index, MaterializeRequest::Element(tag))?;
        let (flags, attrs) = {
            let tnode = self.registry.tview(tview)?.expect_tnode(index)?;
            (tnode.flags, tnode.attrs.clone())
        };
        if materialized.created {
            for (name, value) in &attrs {
                self.dom.set_attribute(materialized.node, name, value);
            }
        }
        self.store_node(view, index, materialized)?;
        trace!(%index, tag, created = materialized.created, "elementStart");

        self.open_node(index, flags)?;
        self.run_directives(view, index, tag, materialized.node, flags)
    }

    pub fn element_end(&mut self) -> RenderResult<()> {
        let closed = self.close_node(TNodeType::Element, "elementEnd")?;
        trace!(index = %closed, "elementEnd");
        Ok(())
    }

    /// `element_start` immediately followed by `element_end`.
    pub fn element(
        &mut self,
        index: usize,
        tag: &str,
        attrs_index: Option<usize>,
        local_refs_index: Option<usize>,
    ) -> RenderResult<()> {
        self.element_start(index, tag, attrs_index, local_refs_index)?;
        self.element_end()
    }

    /// Node carrying the local ref `name` in the active view.
    pub fn local_ref(&self, name: &str) -> RenderResult<Option<NodeId>> {
        let (view, _) = self.active()?;
        let (tview, lview) = self.registry.view_pair(view)?;
        Ok(tview
            .tnodes()
            .find(|tnode| tnode.local_names.iter().any(|local| local == name))
            .and_then(|tnode| lview.native(tnode.index)))
    }

    // =========================================================================
    // Open / close
    // =========================================================================

    /// Make `index` the current, open node.
    pub(crate) fn open_node(&mut self, index: SlotIndex, flags: TNodeFlags) -> RenderResult<()> {
        self.state.set_current_tnode(index, true)?;
        let frame = self.state.frame_mut()?;
        frame.element_depth += 1;
        if flags.contains(TNodeFlags::SKIP_HYDRATION) && frame.skip_hydration_root.is_none() {
            frame.skip_hydration_root = Some(index);
        }
        if let Some(block) = frame.i18n.as_mut() {
            block.elements.push(index);
        }
        Ok(())
    }

    /// Close the innermost open node, which must be of kind `expected`.
    ///
    /// If the current node is still open it is the one being closed (it had
    /// no children); otherwise the current node is its last child and the
    /// position moves up to the parent.
    pub(crate) fn close_node(
        &mut self,
        expected: TNodeType,
        instruction: &'static str,
    ) -> RenderResult<SlotIndex> {
        let frame = self.state.frame()?;
        dev_assert!(
            frame.element_depth > 0,
            StructuralError::UnbalancedEnd { instruction }
        );
        let unbalanced = || StructuralError::UnbalancedEnd { instruction };
        let current = frame.current_tnode.ok_or_else(unbalanced)?;
        let tview = self.registry.tview(frame.tview)?;

        let closing = if frame.is_parent {
            current
        } else {
            tview.expect_tnode(current)?.parent.ok_or_else(unbalanced)?
        };
        assert_tnode_type(tview.expect_tnode(closing)?, expected)?;

        self.state.set_current_tnode(closing, false)?;
        let frame = self.state.frame_mut()?;
        frame.element_depth = frame.element_depth.saturating_sub(1);
        if frame.skip_hydration_root == Some(closing) {
            frame.skip_hydration_root = None;
        }
        Ok(closing)
    }

    pub(crate) fn run_directives(
        &self,
        view: LViewId,
        index: SlotIndex,
        tag: &str,
        node: NodeId,
        flags: TNodeFlags,
    ) -> RenderResult<()> {
        if !flags.contains(TNodeFlags::IS_DIRECTIVE_HOST) {
            return Ok(());
        }
        let Some(resolver) = self.directives.clone() else {
            return Ok(());
        };
        let site = DirectiveSite {
            dom: &self.dom,
            view,
            index,
            tag,
            node,
        };
        resolver.instantiate(&site)?;
        if flags.contains(TNodeFlags::HAS_CONTENT_QUERY) {
            resolver.content_queries(&site)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RenderConfig;
    use crate::dom::Dom;
    use crate::engine::{Const, TViewDef};
    use crate::error::RenderError;
    use crate::instructions::DirectiveResolver;
    use crate::pipeline::mount;
    use crate::types::{Attrs, RenderFlags};

    fn render(ctx: &mut RenderContext, def: TViewDef) -> RenderResult<(NodeId, LViewId)> {
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(def);
        let handle = mount(ctx, host, tview)?;
        Ok((host, handle.root()))
    }

    fn context() -> RenderContext {
        RenderContext::new(Dom::new(), RenderConfig::default())
    }

    #[test]
    fn test_nested_elements() {
        let mut ctx = context();
        let def = TViewDef::new(4, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "div", Some(0), None)?;
                ctx.element(1, "br", None, None)?;
                ctx.element_start(2, "p", None, None)?;
                ctx.element_end()?;
                ctx.element_end()?;
                ctx.element(3, "hr", None, None)?;
            }
            Ok(())
        })
        .consts(vec![Const::Attrs(vec![("class".into(), "box".into())])]);

        let (host, view) = render(&mut ctx, def).unwrap();
        assert_eq!(
            ctx.dom().inner_html(host),
            r#"<div class="box"><br></br><p></p></div><hr></hr>"#
        );

        let tview = ctx.tview(ctx.lview(view).unwrap().header.tview).unwrap();
        let div = tview.tnode(SlotIndex(0)).unwrap();
        assert_eq!(div.child, Some(SlotIndex(1)));
        assert_eq!(div.next, Some(SlotIndex(3)));
        assert_eq!(tview.tnode(SlotIndex(1)).unwrap().next, Some(SlotIndex(2)));
        assert_eq!(tview.tnode(SlotIndex(2)).unwrap().parent, Some(SlotIndex(0)));
        assert_eq!(tview.first_child, Some(SlotIndex(0)));
    }

    #[test]
    fn test_position_returns_to_root() {
        let mut ctx = context();
        let def = TViewDef::new(2, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "ul", None, None)?;
                ctx.element(1, "li", None, None)?;
                ctx.element_end()?;
                assert_eq!(ctx.state().get_current_tnode(), Some(SlotIndex(0)));
                assert!(!ctx.state().is_current_tnode_parent());
                assert_eq!(ctx.state().frame()?.element_depth, 0);
            }
            Ok(())
        });
        render(&mut ctx, def).unwrap();
        assert_eq!(ctx.state().depth(), 0);
    }

    #[test]
    fn test_local_ref() {
        let mut ctx = context();
        let found = Rc::new(RefCell::new(None));
        let sink = found.clone();
        let def = TViewDef::new(1, 0, move |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "input", None, Some(0))?;
                *sink.borrow_mut() = ctx.local_ref("field")?;
            }
            Ok(())
        })
        .consts(vec![Const::LocalRefs(vec!["field".into()])]);

        let (host, _) = render(&mut ctx, def).unwrap();
        assert_eq!(*found.borrow(), ctx.dom().first_child(host));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut ctx = context();
        let def = TViewDef::new(1, 0, |ctx, _| ctx.element(1, "div", None, None));
        assert!(matches!(
            render(&mut ctx, def),
            Err(RenderError::Structural(StructuralError::SlotOutOfRange { .. }))
        ));
    }

    #[cfg(feature = "dev-mode")]
    #[test]
    fn test_unbalanced_end() {
        let mut ctx = context();
        let def = TViewDef::new(1, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "div", None, None)?;
                ctx.element_end()?;
            }
            Ok(())
        });
        assert!(matches!(
            render(&mut ctx, def),
            Err(RenderError::Structural(StructuralError::UnbalancedEnd {
                instruction: "elementEnd"
            }))
        ));
    }

    #[cfg(feature = "dev-mode")]
    #[test]
    fn test_unclosed_element() {
        let mut ctx = context();
        let def = TViewDef::new(1, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element_start(0, "div", None, None)?;
            }
            Ok(())
        });
        assert!(matches!(
            render(&mut ctx, def),
            Err(RenderError::Structural(StructuralError::UnclosedNodes { open: 1, .. }))
        ));
    }

    #[cfg(feature = "dev-mode")]
    #[test]
    fn test_binding_before_element() {
        let mut ctx = context();
        let def = TViewDef::new(2, 1, |ctx, _| {
            ctx.text(0, None)?;
            ctx.text_interpolate(0, "x")?;
            ctx.element(1, "div", None, None)
        });
        assert!(matches!(
            render(&mut ctx, def),
            Err(RenderError::Structural(StructuralError::BindingBeforeElement { .. }))
        ));
    }

    #[derive(Default)]
    struct Recorder {
        instantiated: RefCell<Vec<(SlotIndex, String)>>,
        queried: RefCell<Vec<SlotIndex>>,
    }

    impl DirectiveResolver for Recorder {
        fn matches(&self, tag: &str, attrs: &Attrs) -> TNodeFlags {
            let mut flags = TNodeFlags::empty();
            if tag == "my-widget" {
                flags |= TNodeFlags::IS_DIRECTIVE_HOST;
            }
            if attrs.iter().any(|(name, _)| name == "query") {
                flags |= TNodeFlags::HAS_CONTENT_QUERY | TNodeFlags::IS_DETACHED;
            }
            flags
        }

        fn instantiate(&self, site: &DirectiveSite<'_>) -> RenderResult<()> {
            let tag = site.dom.tag_name(site.node).unwrap_or_default();
            self.instantiated.borrow_mut().push((site.index, tag));
            Ok(())
        }

        fn content_queries(&self, site: &DirectiveSite<'_>) -> RenderResult<()> {
            self.queried.borrow_mut().push(site.index);
            Ok(())
        }
    }

    #[test]
    fn test_directive_hooks() {
        let recorder = Rc::new(Recorder::default());
        let mut ctx = context().with_directives(recorder.clone());
        let def = TViewDef::new(2, 0, |ctx, flags| {
            if flags.contains(RenderFlags::CREATE) {
                ctx.element(0, "my-widget", Some(0), None)?;
                ctx.element(1, "span", None, None)?;
            }
            Ok(())
        })
        .consts(vec![Const::Attrs(vec![("query".into(), String::new())])]);

        let (_, view) = render(&mut ctx, def).unwrap();
        assert_eq!(
            *recorder.instantiated.borrow(),
            vec![(SlotIndex(0), "my-widget".to_string())]
        );
        assert_eq!(*recorder.queried.borrow(), vec![SlotIndex(0)]);

        let tview = ctx.tview(ctx.lview(view).unwrap().header.tview).unwrap();
        let flags = tview.tnode(SlotIndex(0)).unwrap().flags;
        assert!(flags.contains(TNodeFlags::IS_DIRECTIVE_HOST | TNodeFlags::HAS_CONTENT_QUERY));
        assert!(!flags.contains(TNodeFlags::IS_DETACHED));
    }
}
