//! Static half of the data model: TNode and TView.
//!
//! A TView is built once per compiled template, during its first creation
//! pass, and then shared by every LView instantiated from it. After
//! `first_create_pass` flips to `false` its `data` and `consts` are read-only.

use std::fmt;
use std::rc::Rc;

use crate::error::{RenderResult, StructuralError};
use crate::i18n::{LocalizedMessage, TI18n, TI18nAttributes};
use crate::instructions::RenderContext;
use crate::types::{Attrs, RenderFlags, SlotIndex, TNodeFlags, TNodeType, TViewId, TViewType};

/// Compiled template function.
///
/// Called once with [`RenderFlags::CREATE`] per view instance, then with
/// [`RenderFlags::UPDATE`] on every refresh.
pub type TemplateFn = Rc<dyn Fn(&mut RenderContext, RenderFlags) -> RenderResult<()>>;

// =============================================================================
// Constants pool
// =============================================================================

/// Entry of the TView constant pool, addressed by `attrsIndex`,
/// `localRefsIndex` and `messageIndex` instruction arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    Attrs(Attrs),
    LocalRefs(Vec<String>),
    /// Runtime i18n message.
    Message(String),
    /// `$localize`-style message still carrying metadata blocks.
    Localized(LocalizedMessage),
    /// `(attribute name, message)` pairs for `i18nAttributes`.
    I18nAttrs(Vec<(String, String)>),
}

// =============================================================================
// TNode
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TNode {
    pub node_type: TNodeType,
    pub index: SlotIndex,
    pub parent: Option<SlotIndex>,
    pub child: Option<SlotIndex>,
    pub next: Option<SlotIndex>,
    pub flags: TNodeFlags,
    /// Tag name (elements only).
    pub tag: Option<String>,
    /// Static text (text nodes only).
    pub value: Option<String>,
    pub attrs: Attrs,
    pub local_names: Vec<String>,
    /// Declared template (containers only).
    pub tview: Option<TViewId>,
}

impl TNode {
    pub fn new(node_type: TNodeType, index: SlotIndex, parent: Option<SlotIndex>) -> Self {
        Self {
            node_type,
            index,
            parent,
            child: None,
            next: None,
            flags: TNodeFlags::empty(),
            tag: None,
            value: None,
            attrs: Vec::new(),
            local_names: Vec::new(),
            tview: None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One entry of `TView.data`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TData {
    /// Not visited yet, or a binding slot.
    #[default]
    Empty,
    Node(TNode),
    I18n(TI18n),
    I18nAttributes(TI18nAttributes),
}

// =============================================================================
// TView
// =============================================================================

pub struct TView {
    pub id: TViewId,
    pub kind: TViewType,
    /// Stable template id written into serialized embedded views.
    pub ssr_id: Option<String>,
    pub data: Vec<TData>,
    pub consts: Vec<Const>,
    /// Number of node slots declared by the template.
    pub decls: usize,
    /// Number of binding slots used by the update block.
    pub vars: usize,
    pub binding_start_index: usize,
    pub first_create_pass: bool,
    /// First root-level node of the template.
    pub first_child: Option<SlotIndex>,
    pub template: TemplateFn,
}

impl fmt::Debug for TView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TView")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("ssr_id", &self.ssr_id)
            .field("decls", &self.decls)
            .field("vars", &self.vars)
            .field("first_create_pass", &self.first_create_pass)
            .field("first_child", &self.first_child)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl TView {
    pub(crate) fn new(id: TViewId, def: TViewDef) -> Self {
        Self {
            id,
            kind: def.kind,
            ssr_id: def.ssr_id,
            data: vec![TData::Empty; def.decls + def.vars],
            consts: def.consts,
            decls: def.decls,
            vars: def.vars,
            binding_start_index: def.decls,
            first_create_pass: true,
            first_child: None,
            template: def.template,
        }
    }

    /// First slot after the binding region.
    pub fn expando_start(&self) -> usize {
        self.decls + self.vars
    }

    pub fn tnode(&self, index: SlotIndex) -> Option<&TNode> {
        match self.data.get(index.get()) {
            Some(TData::Node(tnode)) => Some(tnode),
            _ => None,
        }
    }

    pub fn tnode_mut(&mut self, index: SlotIndex) -> Option<&mut TNode> {
        match self.data.get_mut(index.get()) {
            Some(TData::Node(tnode)) => Some(tnode),
            _ => None,
        }
    }

    /// TNode at `index`, or an error if the slot holds none.
    pub fn expect_tnode(&self, index: SlotIndex) -> RenderResult<&TNode> {
        self.tnode(index)
            .ok_or_else(|| StructuralError::EmptySlot { index }.into())
    }

    /// All nodes, in slot order.
    pub fn tnodes(&self) -> impl Iterator<Item = &TNode> {
        self.data.iter().filter_map(|entry| match entry {
            TData::Node(tnode) => Some(tnode),
            _ => None,
        })
    }

    /// Nodes whose logical parent is `parent` (`None` = view root), including
    /// i18n text nodes that are not part of the `child`/`next` chain.
    pub fn children_of(&self, parent: Option<SlotIndex>) -> impl Iterator<Item = &TNode> {
        self.tnodes().filter(move |tnode| tnode.parent == parent)
    }

    pub fn const_at(&self, index: usize) -> RenderResult<&Const> {
        self.consts.get(index).ok_or_else(|| {
            StructuralError::ConstMismatch {
                index,
                expected: "present",
            }
            .into()
        })
    }

    pub fn attrs_const(&self, index: Option<usize>) -> RenderResult<Attrs> {
        let Some(index) = index else { return Ok(Vec::new()) };
        match self.const_at(index)? {
            Const::Attrs(attrs) => Ok(attrs.clone()),
            _ => Err(StructuralError::ConstMismatch {
                index,
                expected: "an attribute list",
            }
            .into()),
        }
    }

    pub fn local_refs_const(&self, index: Option<usize>) -> RenderResult<Vec<String>> {
        let Some(index) = index else { return Ok(Vec::new()) };
        match self.const_at(index)? {
            Const::LocalRefs(names) => Ok(names.clone()),
            _ => Err(StructuralError::ConstMismatch {
                index,
                expected: "a local ref list",
            }
            .into()),
        }
    }

    /// Store a freshly allocated TNode and link it after the current position.
    ///
    /// Only valid during the first creation pass.
    pub(crate) fn register_tnode(
        &mut self,
        tnode: TNode,
        current: Option<SlotIndex>,
        is_parent: bool,
    ) -> RenderResult<()> {
        if !self.first_create_pass {
            return Err(StructuralError::FrozenTView { tview: self.id }.into());
        }
        let index = tnode.index;
        self.ensure_len(index.get() + 1);

        match current {
            Some(current) => {
                if let Some(previous) = self.tnode_mut(current) {
                    if is_parent {
                        if previous.child.is_none() {
                            previous.child = Some(index);
                        }
                    } else {
                        previous.next = Some(index);
                    }
                }
            }
            None => {
                if self.first_child.is_none() {
                    self.first_child = Some(index);
                }
            }
        }

        self.data[index.get()] = TData::Node(tnode);
        Ok(())
    }

    /// Reserve a slot after the binding region (i18n text nodes).
    pub(crate) fn allocate_expando(&mut self) -> SlotIndex {
        let index = SlotIndex(self.data.len());
        self.data.push(TData::Empty);
        index
    }

    pub(crate) fn ensure_len(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize(len, TData::Empty);
        }
    }
}

// =============================================================================
// Definition
// =============================================================================

/// Everything the compiler emits for one template.
pub struct TViewDef {
    pub(crate) kind: TViewType,
    pub(crate) decls: usize,
    pub(crate) vars: usize,
    pub(crate) consts: Vec<Const>,
    pub(crate) ssr_id: Option<String>,
    pub(crate) template: TemplateFn,
}

impl TViewDef {
    pub fn new(
        decls: usize,
        vars: usize,
        template: impl Fn(&mut RenderContext, RenderFlags) -> RenderResult<()> + 'static,
    ) -> Self {
        Self {
            kind: TViewType::Root,
            decls,
            vars,
            consts: Vec::new(),
            ssr_id: None,
            template: Rc::new(template),
        }
    }

    pub fn consts(mut self, consts: Vec<Const>) -> Self {
        self.consts = consts;
        self
    }

    pub fn kind(mut self, kind: TViewType) -> Self {
        self.kind = kind;
        self
    }

    /// Mark as an embedded template with the given serialization id.
    pub fn embedded(mut self, ssr_id: &str) -> Self {
        self.kind = TViewType::Embedded;
        self.ssr_id = Some(ssr_id.to_string());
        self
    }
}
