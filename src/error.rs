//! Error taxonomy for the rendering core.
//!
//! Every failure is fatal for the render pass that hit it: instructions return
//! [`RenderResult`] and the error propagates to the mount/refresh entry point,
//! which decides whether to abort or fall back to a non-hydrated render.
//!
//! Checks that only guard the compiler/runtime contract go through
//! [`dev_assert!`] and compile to nothing without the `dev-mode` feature.
//! Checks whose failure would otherwise read a missing slot or node are kept in
//! every build and surface as the same errors.

use thiserror::Error;

use crate::dom::{NodeId, NodeKind};
use crate::types::{LContainerId, LViewId, SlotIndex, TNodeType, TViewId};

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error(transparent)]
    I18n(#[from] I18nError),

    #[error("Trying to claim a node, which was claimed already.")]
    AlreadyClaimed { node: NodeId },

    #[error("invalid render config: {0}")]
    Config(#[source] serde_json::Error),
}

/// Broken Start/End pairing, ordering or node-kind contracts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructuralError {
    #[error("no view is being rendered")]
    NoActiveView,

    #[error("elements must be created before any bindings (slot {index})")]
    BindingBeforeElement { index: SlotIndex },

    #[error("slot {index} is outside the view data (length {len})")]
    SlotOutOfRange { index: SlotIndex, len: usize },

    #[error("slot {index} holds no node")]
    EmptySlot { index: SlotIndex },

    #[error("{instruction} has no matching start instruction")]
    UnbalancedEnd { instruction: &'static str },

    #[error("view {view} finished with {open} unclosed node(s)")]
    UnclosedNodes { view: LViewId, open: usize },

    #[error("slot {index} expected a {expected} node, found {found}")]
    NodeKindMismatch {
        index: SlotIndex,
        expected: TNodeType,
        found: TNodeType,
    },

    #[error("constant {index} is not {expected}")]
    ConstMismatch { index: usize, expected: &'static str },

    #[error("{tview} is frozen after its first creation pass")]
    FrozenTView { tview: TViewId },

    #[error("unknown {0}")]
    UnknownTView(TViewId),

    #[error("unknown or destroyed {0}")]
    UnknownView(LViewId),

    #[error("unknown or destroyed {0}")]
    UnknownContainer(LContainerId),

    #[error("slot {index} has no DOM parent to insert into")]
    NoRenderParent { index: SlotIndex },

    #[error("view index {index} is out of range for a container with {len} view(s)")]
    ViewIndexOutOfRange { index: usize, len: usize },

    #[error("container at slot {index} has no declared template")]
    MissingTemplate { index: SlotIndex },

    #[error("i18n block at slot {index} opened inside another i18n block")]
    NestedI18nBlock { index: SlotIndex },

    #[error("slot {index} cannot anchor a view container")]
    NotAContainer { index: SlotIndex },
}

/// Server output does not match what the instruction stream expects.
#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("There is no hydration info available for the container at slot {index}")]
    MissingContainerInfo { index: SlotIndex },

    #[error("expected a {expected} node for slot {index}, found {found}")]
    NodeTypeMismatch {
        index: SlotIndex,
        expected: NodeKind,
        found: String,
    },

    #[error("expected <{expected}> for slot {index}, found <{found}>")]
    TagMismatch {
        index: SlotIndex,
        expected: String,
        found: String,
    },

    #[error("hydration path `{path}` ran out of nodes at step {step}")]
    PathWalkFailed { path: String, step: usize },

    #[error("invalid hydration path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path anchor slot {index} holds no element")]
    MissingAnchor { index: SlotIndex },

    #[error("view has no host element")]
    MissingHost,

    #[error("no DOM node could be located for slot {index}")]
    MissingNode { index: SlotIndex },

    #[error("dehydrated view list for container at slot {index} ran past the container anchor")]
    ViewsOverrun { index: SlotIndex },

    #[error("node {node} is not reachable from the view host")]
    Unreachable { node: NodeId },

    #[error("malformed hydration info: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Message and metadata parsing failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum I18nError {
    #[error("Unterminated $localize metadata block in \"{raw}\".")]
    UnterminatedBlock { raw: String },

    #[error("unterminated placeholder in message \"{message}\"")]
    UnterminatedPlaceholder { message: String },

    #[error("unknown placeholder `{placeholder}`")]
    UnknownPlaceholder { placeholder: String },

    #[error("message closes element {slot} which is not open")]
    UnbalancedElement { slot: usize },

    #[error("message leaves element {slot} open")]
    UnclosedElement { slot: usize },

    #[error("message has no sub-template {index}")]
    MissingSubTemplate { index: usize },

    #[error("localized message has {cooked} cooked part(s) but {raw} raw part(s)")]
    PartsMismatch { cooked: usize, raw: usize },

    #[error("localized message needs {expected} substitution(s), got {found}")]
    SubstitutionsMismatch { expected: usize, found: usize },

    #[error("attribute messages cannot contain element placeholders")]
    StructureInAttribute,
}

// =============================================================================
// Dev-mode assertions
// =============================================================================

/// Return `Err($err)` from the enclosing function when `$cond` is false.
///
/// Compiles to nothing unless the `dev-mode` feature is enabled.
#[cfg(feature = "dev-mode")]
macro_rules! dev_assert {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return ::core::result::Result::Err(::core::convert::Into::into($err));
        }
    };
}

#[cfg(not(feature = "dev-mode"))]
macro_rules! dev_assert {
    ($cond:expr, $err:expr $(,)?) => {};
}

pub(crate) use dev_assert;
