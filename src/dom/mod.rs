//! DOM Module - Arena-based document used as the renderer.
//!
//! The runtime only ever touches the DOM through this module:
//! - node creation (element / text / comment)
//! - `firstChild` / `nextSibling` navigation, which is all hydration may use
//! - attach / move / detach
//! - HTML serialisation for tests and diagnostics

mod document;
mod html;
mod node;

pub use document::Dom;
pub use node::{DomNode, NodeId, NodeKind};
