//! Normalized, tag-indexed view cache.
//!
//! Every cached query result ("view") is tagged at registration with the
//! entity identities it contains plus a list marker for collections. The
//! engines here consult the inverted tag index to propagate mutations:
//! - `patch`: merge a partial entity into every affected view in place;
//! - `evict`: remove a deleted entity from every affected list view;
//! - `paginate`: merge fetched pages into an infinite accumulation;
//! - `optimistic`: apply eagerly, roll back on transport failure.

mod evict;
mod optimistic;
mod paginate;
mod patch;
mod store;
mod tags;
mod views;

pub use evict::{evict_views, EvictOptions};
pub use optimistic::{Mutation, MutationPhase};
pub use paginate::merge_page;
pub use patch::{merge_entity, patch_views, PatchOptions};
pub use store::{CacheStore, MemoryStore, UndoEdit, UndoHandle};
pub use tags::{Tag, TagId};
pub use views::{Endpoint, ListView, View, ViewKey};
