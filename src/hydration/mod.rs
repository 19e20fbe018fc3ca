//! Hydration - reconciling the instruction stream with server-rendered DOM.
//!
//! - `info`: the serialized `ngh` record and the runtime state built from it
//! - `path`: the `host|slot(.firstChild|.nextSibling)*` path language
//! - `locate`: finding the node for the next instruction
//! - `claim`: one-claim-per-node bookkeeping
//! - `serialize`: producing `ngh` records from a create-only render
//! - `cleanup`: pool of unclaimed server views, swept once the app is stable

mod claim;
mod cleanup;
mod info;
mod locate;
mod path;
mod serialize;

pub use claim::ClaimRegistry;
pub use cleanup::{schedule_cleanup_on_stable, DehydratedPool};
pub use info::{DehydratedView, HydrationInfo, SerializedContainer, SerializedView};
pub use locate::{locate_dehydrated_views_in_container, locate_next_rnode};
pub use path::{find_existing_node, sibling_after, NodePath, PathAnchor, PathStep};
pub use serialize::{annotate_for_hydration, serialize_view};
