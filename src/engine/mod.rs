//! View Engine - TNode/TView/LView data model and render position state.
//!
//! The engine manages the core data structures:
//! - TView: per-template static data (TNodes, constants), built on first pass
//! - LView: per-instance live data, slot-aligned with its TView
//! - LContainer: anchor + child views for templates and view-container refs
//! - Registry: arenas handing out typed handles for all of the above
//! - Position: the current-node stack driven by Start/End instructions
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are indices into two parallel arrays:
//!
//! ```text
//! slot 0: TNode(Element "div", child=1)   | LView: Node(#12)
//! slot 1: TNode(Text, parent=0)           | LView: Node(#13)
//! slot 2: Empty (binding)                 | LView: Binding("Ada")
//! ```
//!
//! The TView column is written during the first creation pass only; every
//! later instance of the same template reuses it.

mod lview;
mod position;
mod registry;
mod tview;
pub mod type_checks;

pub use lview::{LContainer, LView, LViewHeader, Slot};
pub use position::{I18nFrame, LFrame, PositionState};
pub use registry::ViewRegistry;
pub use tview::{Const, TData, TNode, TView, TViewDef, TemplateFn};
