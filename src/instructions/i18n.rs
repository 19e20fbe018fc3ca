//! `i18nStart` / `i18nEnd` / `i18n`, `i18nAttributes`, `i18nExp`, `i18nApply`.
//!
//! Text runs of a message become text nodes in expando slots. Element
//! placeholders refer to elements the template declares inside the block;
//! declared elements the message leaves out are detached. Created nodes are
//! put in message order when the block ends, located ones stay where the
//! server put them.

use tracing::trace;

use crate::engine::{Const, I18nFrame, Slot, TData, TNode};
use crate::error::{dev_assert, HydrationError, RenderResult, StructuralError};
use crate::i18n::{
    binding_mask, expression_bit, parse_message, plan_attribute, plan_block, static_text,
    translation_for_template, I18nNode, I18nTarget, I18nUpdateOp, PlannedNode, TI18n,
    TI18nAttributes,
};
use crate::materialize::MaterializeRequest;
use crate::types::{SlotIndex, TNodeFlags, TNodeType, TViewId};

use super::RenderContext;

impl RenderContext {
    /// Open a translated block at `index` using message constant
    /// `message_index`. `sub_template` selects the part of the message that
    /// belongs to an embedded template.
    pub fn i18n_start(
        &mut self,
        index: usize,
        message_index: usize,
        sub_template: Option<usize>,
    ) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, tview_id) = self.active()?;
        self.check_creation_slot(index)?;

        let frame = self.state.frame()?;
        dev_assert!(frame.i18n.is_none(), StructuralError::NestedI18nBlock { index });
        let tview = self.registry.tview(tview_id)?;
        let parent_of_current = frame
            .current_tnode
            .and_then(|c| tview.tnode(c))
            .and_then(|t| t.parent);
        let root = frame.parent_for_next(parent_of_current);
        // A block compiled by an earlier failed first pass keeps its expandos.
        let compiled = matches!(tview.data.get(index.get()), Some(TData::I18n(_)));

        if tview.first_create_pass && !compiled {
            let block = self.compile_block(tview_id, message_index, sub_template, root)?;
            let tview = self.registry.tview_mut(tview_id)?;
            tview.ensure_len(index.get() + 1);
            tview.data[index.get()] = TData::I18n(block);
        }

        let texts: Vec<(SlotIndex, String)> = {
            let tview = self.registry.tview(tview_id)?;
            block_of(tview.data.get(index.get()), index)?
                .nodes
                .iter()
                .filter(|node| matches!(node, I18nNode::Text { .. }))
                .map(|node| {
                    let value = tview
                        .tnode(node.index())
                        .and_then(|tnode| tnode.value.clone())
                        .unwrap_or_default();
                    (node.index(), value)
                })
                .collect()
        };

        let mut located = 0;
        for (slot, value) in &texts {
            let materialized = self.materialize(*slot, MaterializeRequest::Text(value))?;
            self.registry
                .lview_mut(view)?
                .set(*slot, Slot::Node(materialized.node));
            if !materialized.created {
                located += 1;
            }
        }

        trace!(%index, texts = texts.len(), located, "i18nStart");
        self.state.frame_mut()?.i18n = Some(I18nFrame {
            index,
            parent: root,
            located,
            elements: Vec::new(),
        });
        Ok(())
    }

    /// Close the open translated block.
    pub fn i18n_end(&mut self) -> RenderResult<()> {
        let (view, tview_id) = self.active()?;
        let block_frame = self
            .state
            .frame_mut()?
            .i18n
            .take()
            .ok_or(StructuralError::UnbalancedEnd { instruction: "i18nEnd" })?;

        let block = {
            let tview = self.registry.tview(tview_id)?;
            block_of(tview.data.get(block_frame.index.get()), block_frame.index)?.clone()
        };

        let tview = self.registry.tview_mut(tview_id)?;
        if tview.first_create_pass {
            for element in &block_frame.elements {
                let in_message = block.nodes.iter().any(|node| node.index() == *element);
                if let Some(tnode) = tview.tnode_mut(*element).filter(|_| !in_message) {
                    tnode.flags |= TNodeFlags::IS_DETACHED;
                }
            }
        }

        let (tview, lview) = self.registry.view_pair(view)?;
        let mut detached = 0;
        for element in &block_frame.elements {
            let is_detached = tview
                .tnode(*element)
                .is_some_and(|tnode| tnode.flags.contains(TNodeFlags::IS_DETACHED));
            if let Some(native) = lview.native(*element).filter(|_| is_detached) {
                self.dom.remove(native);
                detached += 1;
            }
        }

        for node in &block.nodes {
            let Some(native) = lview.native(node.index()) else { continue };
            if self.claims.is_claimed(native) {
                continue;
            }
            let (parent, before) = self.insertion_point_under(tview, lview, node.parent(), node.index())?;
            self.dom.insert_before(parent, native, before);
        }

        trace!(index = %block_frame.index, located = block_frame.located, detached, "i18nEnd");
        Ok(())
    }

    /// A block without declared elements.
    pub fn i18n(&mut self, index: usize, message_index: usize, sub_template: Option<usize>) -> RenderResult<()> {
        self.i18n_start(index, message_index, sub_template)?;
        self.i18n_end()
    }

    /// Translate attributes of the current element. `attrs_index` addresses
    /// an `(attribute, message)` list in the constant pool.
    pub fn i18n_attributes(&mut self, index: usize, attrs_index: usize) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, tview_id) = self.active()?;
        self.check_creation_slot(index)?;
        let element = self
            .state
            .get_current_tnode()
            .ok_or(StructuralError::EmptySlot { index })?;

        let tview = self.registry.tview_mut(tview_id)?;
        if tview.first_create_pass {
            let pairs = match tview.const_at(attrs_index)? {
                Const::I18nAttrs(pairs) => pairs.clone(),
                _ => {
                    return Err(StructuralError::ConstMismatch {
                        index: attrs_index,
                        expected: "an i18n attribute list",
                    }
                    .into());
                }
            };

            let mut compiled = TI18nAttributes {
                element,
                ..Default::default()
            };
            for (name, message) in pairs {
                let parts = plan_attribute(&message)?;
                match static_text(&parts) {
                    Some(text) => compiled.statics.push((name, text)),
                    None => compiled.update.push(I18nUpdateOp {
                        target: I18nTarget::Attribute { element, name },
                        mask: binding_mask(&parts),
                        parts,
                    }),
                }
            }
            tview.ensure_len(index.get() + 1);
            tview.data[index.get()] = TData::I18nAttributes(compiled);
        }

        let (tview, lview) = self.registry.view_pair(view)?;
        let Some(TData::I18nAttributes(compiled)) = tview.data.get(index.get()) else {
            return Err(StructuralError::EmptySlot { index }.into());
        };
        let native = lview
            .native(compiled.element)
            .ok_or(HydrationError::MissingNode { index: compiled.element })?;
        for (name, value) in &compiled.statics {
            self.dom.set_attribute(native, name, value);
        }
        trace!(%index, element = %compiled.element, statics = compiled.statics.len(), "i18nAttributes");
        Ok(())
    }

    // =========================================================================
    // Update pass
    // =========================================================================

    /// Feed the next expression of the following `i18n_apply`.
    pub fn i18n_exp(&mut self, value: &str) -> RenderResult<()> {
        let changed = self.binding_updated(value)?;
        let frame = self.state.frame_mut()?;
        if changed {
            frame.exp_mask |= expression_bit(frame.exp_shift as usize);
        }
        frame.exp_shift += 1;
        Ok(())
    }

    /// Recompute the texts and attributes of the block at `index` whose
    /// expressions changed since the last pass.
    pub fn i18n_apply(&mut self, index: usize) -> RenderResult<()> {
        let index = SlotIndex(index);
        let (view, tview_id) = self.active()?;
        let frame = self.state.frame_mut()?;
        let (mask, shift, binding_end) = (frame.exp_mask, frame.exp_shift, frame.binding_index);
        frame.exp_mask = 0;
        frame.exp_shift = 0;
        if mask == 0 {
            return Ok(());
        }

        let tview = self.registry.tview(tview_id)?;
        let ops = match tview.data.get(index.get()) {
            Some(TData::I18n(block)) => &block.update,
            Some(TData::I18nAttributes(compiled)) => &compiled.update,
            _ => return Err(StructuralError::EmptySlot { index }.into()),
        };

        let lview = self.registry.lview(view)?;
        let first = binding_end.saturating_sub(shift as usize);
        let bindings: Vec<String> = (first..binding_end)
            .map(|slot| match lview.slot(SlotIndex(slot)) {
                Slot::Binding(value) => value.clone(),
                _ => String::new(),
            })
            .collect();

        let mut applied = 0;
        for op in ops.iter().filter(|op| op.mask & mask != 0) {
            let value = op.render(&bindings);
            match &op.target {
                I18nTarget::Text(slot) => {
                    let node = lview
                        .native(*slot)
                        .ok_or(HydrationError::MissingNode { index: *slot })?;
                    self.dom.set_data(node, &value);
                }
                I18nTarget::Attribute { element, name } => {
                    let node = lview
                        .native(*element)
                        .ok_or(HydrationError::MissingNode { index: *element })?;
                    self.dom.set_attribute(node, name, &value);
                }
            }
            applied += 1;
        }
        trace!(%index, mask, applied, "i18nApply");
        Ok(())
    }

    /// Build the static block for a message on the first creation pass.
    fn compile_block(
        &mut self,
        tview_id: TViewId,
        message_index: usize,
        sub_template: Option<usize>,
        root: Option<SlotIndex>,
    ) -> RenderResult<TI18n> {
        let tview = self.registry.tview_mut(tview_id)?;
        let message = match tview.const_at(message_index)? {
            Const::Message(message) => message.clone(),
            Const::Localized(localized) => localized.to_runtime_message()?,
            _ => {
                return Err(StructuralError::ConstMismatch {
                    index: message_index,
                    expected: "an i18n message",
                }
                .into());
            }
        };
        let message = translation_for_template(&message, sub_template)?;
        let planned = plan_block(&parse_message(&message)?, root)?;

        let mut block = TI18n::default();
        for node in planned {
            match node {
                PlannedNode::Text { parent, parts } => {
                    let slot = tview.allocate_expando();
                    let mut tnode = TNode::new(TNodeType::Text, slot, parent);
                    tnode.flags |= TNodeFlags::IN_I18N;
                    tnode.value = static_text(&parts);
                    if tnode.value.is_none() {
                        block.update.push(I18nUpdateOp {
                            target: I18nTarget::Text(slot),
                            mask: binding_mask(&parts),
                            parts,
                        });
                    }
                    tview.data[slot.get()] = TData::Node(tnode);
                    block.nodes.push(I18nNode::Text { index: slot, parent });
                }
                PlannedNode::Element { index, parent } => block.nodes.push(I18nNode::Element { index, parent }),
                PlannedNode::Template { index, parent } => block.nodes.push(I18nNode::Template { index, parent }),
            }
        }
        trace!(message_index, nodes = block.nodes.len(), ops = block.update.len(), "compiled i18n block");
        Ok(block)
    }
}

fn block_of(entry: Option<&TData>, index: SlotIndex) -> RenderResult<&TI18n> {
    match entry {
        Some(TData::I18n(block)) => Ok(block),
        _ => Err(StructuralError::EmptySlot { index }.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::RenderConfig;
    use crate::dom::{Dom, NodeId};
    use crate::engine::TViewDef;
    use crate::error::RenderError;
    use crate::i18n::LocalizedMessage;
    use crate::pipeline::{mount, refresh};
    use crate::types::RenderFlags;

    fn m(s: &str) -> String {
        s.replace('^', "\u{FFFD}")
    }

    /// `<div i18n>...<b>...</b>...</div>` rendered with `message`.
    fn bold_block(ctx: &mut RenderContext, message: &str) -> (NodeId, TViewId) {
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(
            TViewDef::new(3, 0, |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "div", None, None)?;
                    ctx.i18n_start(1, 0, None)?;
                    ctx.element(2, "b", None, None)?;
                    ctx.i18n_end()?;
                    ctx.element_end()?;
                }
                Ok(())
            })
            .consts(vec![Const::Message(m(message))]),
        );
        (host, tview)
    }

    #[test]
    fn test_block_in_message_order() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let (host, tview) = bold_block(&mut ctx, "Hello ^#2^World^/#2^!");
        mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<div>Hello <b>World</b>!</div>");

        let tview = ctx.tview(tview).unwrap();
        let texts: Vec<_> = tview
            .tnodes()
            .filter(|tnode| tnode.flags.contains(TNodeFlags::IN_I18N) && tnode.node_type == TNodeType::Text)
            .map(|tnode| (tnode.index, tnode.parent))
            .collect();
        assert_eq!(
            texts,
            vec![
                (SlotIndex(3), Some(SlotIndex(0))),
                (SlotIndex(4), Some(SlotIndex(2))),
                (SlotIndex(5), Some(SlotIndex(0))),
            ]
        );
        assert!(tview.tnode(SlotIndex(2)).unwrap().flags.contains(TNodeFlags::IN_I18N));
    }

    #[test]
    fn test_translation_reorders() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let (host, tview) = bold_block(&mut ctx, "^#2^Monde^/#2^, bonjour");
        mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<div><b>Monde</b>, bonjour</div>");
    }

    #[test]
    fn test_missing_element_is_detached() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let (host, tview) = bold_block(&mut ctx, "no markup");
        let handle = mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<div>no markup</div>");

        let b = ctx.native(handle.root(), 2).unwrap().unwrap();
        assert_eq!(ctx.dom().parent(b), None);
        let tview = ctx.tview(tview).unwrap();
        assert!(tview.tnode(SlotIndex(2)).unwrap().flags.contains(TNodeFlags::IS_DETACHED));
    }

    #[test]
    fn test_expressions() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let name = Rc::new(RefCell::new("Bob".to_string()));
        let source = name.clone();
        let tview = ctx.create_tview(
            TViewDef::new(2, 1, move |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "p", None, None)?;
                    ctx.i18n(1, 0, None)?;
                    ctx.element_end()?;
                }
                if flags.contains(RenderFlags::UPDATE) {
                    ctx.i18n_exp(&source.borrow())?;
                    ctx.i18n_apply(1)?;
                }
                Ok(())
            })
            .consts(vec![Const::Message(m("Hi ^0^!"))]),
        );

        let handle = mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<p>Hi Bob!</p>");

        *name.borrow_mut() = "Ann".into();
        refresh(&mut ctx, &handle).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<p>Hi Ann!</p>");

        // Unchanged expression: the text is left alone.
        let text = ctx.dom().first_child(ctx.dom().first_child(host).unwrap()).unwrap();
        ctx.dom().set_data(text, "edited");
        refresh(&mut ctx, &handle).unwrap();
        assert_eq!(ctx.dom().data(text).as_deref(), Some("edited"));
    }

    #[test]
    fn test_attributes() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(
            TViewDef::new(2, 1, |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "img", None, None)?;
                    ctx.i18n_attributes(1, 0)?;
                    ctx.element_end()?;
                }
                if flags.contains(RenderFlags::UPDATE) {
                    ctx.i18n_exp("Ann")?;
                    ctx.i18n_apply(1)?;
                }
                Ok(())
            })
            .consts(vec![Const::I18nAttrs(vec![
                ("alt".into(), "Photo".into()),
                ("title".into(), m("By ^0^")),
            ])]),
        );

        let handle = mount(&mut ctx, host, tview).unwrap();
        let img = ctx.native(handle.root(), 0).unwrap().unwrap();
        assert_eq!(ctx.dom().attribute(img, "alt").as_deref(), Some("Photo"));
        assert_eq!(ctx.dom().attribute(img, "title").as_deref(), Some("By Ann"));
    }

    #[test]
    fn test_expressions_past_mask_width() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let round = Rc::new(RefCell::new(0));
        let model = round.clone();
        let alt: String = (0..32).map(|n| format!("^{n}^")).collect();
        let tview = ctx.create_tview(
            TViewDef::new(2, 33, move |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "img", None, None)?;
                    ctx.i18n_attributes(1, 0)?;
                    ctx.element_end()?;
                }
                if flags.contains(RenderFlags::UPDATE) {
                    for _ in 0..32 {
                        ctx.i18n_exp("x")?;
                    }
                    ctx.i18n_exp(&format!("title-{}", model.borrow()))?;
                    ctx.i18n_apply(1)?;
                }
                Ok(())
            })
            .consts(vec![Const::I18nAttrs(vec![
                ("alt".into(), m(&alt)),
                ("title".into(), m("^32^")),
            ])]),
        );

        let handle = mount(&mut ctx, host, tview).unwrap();
        let img = ctx.native(handle.root(), 0).unwrap().unwrap();
        assert_eq!(ctx.dom().attribute(img, "alt"), Some("x".repeat(32)));
        assert_eq!(ctx.dom().attribute(img, "title").as_deref(), Some("title-0"));

        *round.borrow_mut() = 1;
        refresh(&mut ctx, &handle).unwrap();
        assert_eq!(ctx.dom().attribute(img, "title").as_deref(), Some("title-1"));
    }

    #[test]
    fn test_localized_message_constant() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(
            TViewDef::new(2, 0, |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "p", None, None)?;
                    ctx.i18n(1, 0, None)?;
                    ctx.element_end()?;
                }
                Ok(())
            })
            .consts(vec![Const::Localized(LocalizedMessage::new(
                &[":site|greeting@@hello:Hello!"],
                &[":site|greeting@@hello:Hello!"],
                &[],
            ))]),
        );

        mount(&mut ctx, host, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(host), "<p>Hello!</p>");
    }

    #[test]
    fn test_retried_first_pass_reuses_block() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let fail = Rc::new(RefCell::new(true));
        let trigger = fail.clone();
        let tview = ctx.create_tview(
            TViewDef::new(3, 0, move |ctx, flags| {
                if flags.contains(RenderFlags::CREATE) {
                    ctx.element_start(0, "div", None, None)?;
                    ctx.i18n_start(1, 0, None)?;
                    ctx.element(2, "b", None, None)?;
                    ctx.i18n_end()?;
                    ctx.element_end()?;
                    if *trigger.borrow() {
                        ctx.text(7, None)?;
                    }
                }
                Ok(())
            })
            .consts(vec![Const::Message(m("Hello ^#2^World^/#2^!"))]),
        );

        let first = ctx.dom().create_element("host");
        assert!(mount(&mut ctx, first, tview).is_err());
        assert!(ctx.tview(tview).unwrap().first_create_pass);
        assert_eq!(ctx.tview(tview).unwrap().data.len(), 6);

        *fail.borrow_mut() = false;
        let second = ctx.dom().create_element("host");
        mount(&mut ctx, second, tview).unwrap();
        assert_eq!(ctx.dom().inner_html(second), "<div>Hello <b>World</b>!</div>");
        let tview = ctx.tview(tview).unwrap();
        assert_eq!(tview.data.len(), 6);
        assert_eq!(tview.tnodes().filter(|tnode| tnode.node_type == TNodeType::Text).count(), 3);
    }

    #[test]
    fn test_end_without_start() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(TViewDef::new(1, 0, |ctx, _| ctx.i18n_end()));
        assert!(matches!(
            mount(&mut ctx, host, tview).err().unwrap(),
            RenderError::Structural(StructuralError::UnbalancedEnd { instruction: "i18nEnd" })
        ));
    }

    #[test]
    fn test_message_constant_kind() {
        let mut ctx = RenderContext::new(Dom::new(), RenderConfig::default());
        let host = ctx.dom().create_element("host");
        let tview = ctx.create_tview(
            TViewDef::new(1, 0, |ctx, _| ctx.i18n(0, 0, None)).consts(vec![Const::LocalRefs(Vec::new())]),
        );
        assert!(matches!(
            mount(&mut ctx, host, tview).err().unwrap(),
            RenderError::Structural(StructuralError::ConstMismatch { index: 0, .. })
        ));
    }
}
