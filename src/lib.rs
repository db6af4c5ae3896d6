//! Entity API toolkit: client-side data fetching with a normalized,
//! tag-indexed cache.
//!
//! Declare a typed entity, point a builder at its REST endpoint and get the
//! five standard operations (`create`, `search`, `search_infinite`, `get`,
//! `update`, `delete`) with cache consistency handled for you: every cached
//! query result is tagged with the entity identities it contains, and
//! mutations propagate through those tags to every affected view,
//! optimistically with rollback or after network confirmation.
//!
//! ```ignore
//! let api: EntityApi<Task, _> = EntityApi::builder()
//!   .base_endpoint("/tasks")
//!   .transport(Arc::new(HttpTransport::new("https://example.test/api")?))
//!   .store(Arc::new(MemoryStore::new()))
//!   .optimistic(true)
//!   .build()?;
//!
//! let page = api.search(&SearchRequest::default()).await?;
//! api.update(&EntityPatch::new(1).set("done", true)).await?;
//! ```

pub mod api;
pub mod cache;
pub mod entity;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod fixtures;

pub use api::{EntityApi, EntityApiBuilder};
pub use cache::{
  evict_views, merge_page, patch_views, CacheStore, Endpoint, EvictOptions, ListView, MemoryStore,
  Mutation, MutationPhase, PatchOptions, Tag, TagId, UndoEdit, UndoHandle, View, ViewKey,
};
pub use entity::{Entity, EntityId, EntityPatch};
pub use error::{ApiError, TransportError};
pub use request::{EntityRequest, OrderBy, SearchRequest};
pub use response::{Pagination, SearchPage};
pub use transport::{HttpMethod, HttpTransport, RequestDescriptor, Transport};
