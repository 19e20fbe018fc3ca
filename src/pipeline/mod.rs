//! Mount Pipeline
//!
//! Connects a compiled template to a host element.
//!
//! ```text
//! host (+ ngh record) → root LView → creation pass → update pass → cleanup effect
//! ```
//!
//! - **mount** - builds the root view, hydrating it when the context does
//! - **refresh** - re-runs the update pass, embedded views included
//! - **unmount** - destroys the tree and stops the cleanup effect

pub mod mount;

// Re-exports
pub use mount::{mount, refresh, unmount, MountHandle};
