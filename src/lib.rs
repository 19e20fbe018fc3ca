//! # spark-view
//!
//! Instruction-addressed incremental view runtime with server-render hydration.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! reactive `stable` signal that drives deferred cleanup.
//!
//! ## Architecture
//!
//! A compiled template is a function that calls instructions in template
//! order. Each instruction addresses a slot by index. The first creation pass
//! over a template records its static shape (a TView); every instance keeps
//! its live nodes in a slot-aligned LView:
//!
//! ```text
//! template fn → instructions → TView (first pass) + LView (per instance) → DOM
//! ```
//!
//! The same instruction stream either creates DOM nodes or, when hydrating,
//! locates the nodes a server render produced. The strategy is chosen once per
//! [`RenderContext`] from its [`RenderConfig`].
//!
//! ## Modules
//!
//! - [`types`] - Slot indices, arena handles, node kinds and flags
//! - [`engine`] - TNode / TView / LView data model, registry, position state
//! - [`instructions`] - The instruction API and [`RenderContext`]
//! - [`materialize`] - Create vs. locate strategies
//! - [`hydration`] - `ngh` records, path resolution, dehydrated views, serializer
//! - [`i18n`] - Runtime messages, `$localize` metadata, update codes
//! - [`dom`] - Arena document used as the renderer
//! - [`pipeline`] - Mount / refresh / unmount

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod hydration;
pub mod i18n;
pub mod instructions;
pub mod materialize;
pub mod pipeline;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::RenderConfig;

pub use dom::{Dom, NodeId, NodeKind};

pub use engine::{Const, LContainer, LView, Slot, TNode, TView, TViewDef};

pub use error::{HydrationError, I18nError, RenderError, RenderResult, StructuralError};

pub use hydration::{DehydratedView, HydrationInfo, SerializedContainer, SerializedView};

pub use i18n::LocalizedMessage;

pub use instructions::{DirectiveResolver, DirectiveSite, RenderContext};

pub use pipeline::{mount, refresh, unmount, MountHandle};
