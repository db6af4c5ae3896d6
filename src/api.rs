//! Entity API assembly: wires the request normalizer, wire conversion and
//! the cache engines into the five operations exposed to the UI layer.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::cache::{
  evict_views, merge_page, patch_views, CacheStore, Endpoint, EvictOptions, ListView, Mutation,
  PatchOptions, Tag, UndoHandle, View, ViewKey,
};
use crate::entity::{Entity, EntityId, EntityPatch};
use crate::error::ApiError;
use crate::request::{get_cache_key, EntityRequest, SearchRequest};
use crate::response::SearchPage;
use crate::transport::{RequestDescriptor, Transport};
use crate::wire::from_wire;

/// Builder for [`EntityApi`]. `base_endpoint`, `transport` and `store` are
/// required; everything else has a default.
pub struct EntityApiBuilder<T, S> {
  base_endpoint: Option<String>,
  transport: Option<Arc<dyn Transport>>,
  store: Option<Arc<S>>,
  optimistic: bool,
  should_refetch_entity: bool,
  _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: CacheStore<T>> EntityApiBuilder<T, S> {
  pub fn new() -> Self {
    Self {
      base_endpoint: None,
      transport: None,
      store: None,
      optimistic: false,
      should_refetch_entity: false,
      _entity: PhantomData,
    }
  }

  /// Base path of the entity's REST endpoint, e.g. `"/tasks"`.
  pub fn base_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.base_endpoint = Some(endpoint.into());
    self
  }

  pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
    self.transport = Some(transport);
    self
  }

  pub fn store(mut self, store: Arc<S>) -> Self {
    self.store = Some(store);
    self
  }

  /// Apply update/delete effects to the cache before the network resolves,
  /// rolling back on failure. Off by default.
  pub fn optimistic(mut self, optimistic: bool) -> Self {
    self.optimistic = optimistic;
    self
  }

  /// After a successful update, refetch the canonical entity and patch
  /// views with its full wire form (picks up server-computed fields at the
  /// cost of one extra request). Off by default.
  pub fn should_refetch_entity(mut self, refetch: bool) -> Self {
    self.should_refetch_entity = refetch;
    self
  }

  pub fn build(self) -> Result<EntityApi<T, S>, ApiError> {
    let base_endpoint = self
      .base_endpoint
      .ok_or_else(|| ApiError::Config("\"base_endpoint\" is required".into()))?;
    let transport = self
      .transport
      .ok_or_else(|| ApiError::Config("\"transport\" is required".into()))?;
    let store = self
      .store
      .ok_or_else(|| ApiError::Config("\"store\" is required".into()))?;

    Ok(EntityApi {
      base_endpoint,
      transport,
      store,
      optimistic: self.optimistic,
      should_refetch_entity: self.should_refetch_entity,
      _entity: PhantomData,
    })
  }
}

impl<T: Entity, S: CacheStore<T>> Default for EntityApiBuilder<T, S> {
  fn default() -> Self {
    Self::new()
  }
}

/// CRUD/search operations for one entity type, backed by a normalized
/// tag-indexed cache.
///
/// Query operations (`search`, `search_infinite`, `get`) register their
/// result as a cached view, tagged with every entity identity it contains.
/// Mutations (`update`, `delete`) propagate through those tags to every
/// affected view, optimistically or after network confirmation.
pub struct EntityApi<T: Entity, S: CacheStore<T>> {
  base_endpoint: String,
  transport: Arc<dyn Transport>,
  store: Arc<S>,
  optimistic: bool,
  should_refetch_entity: bool,
  _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, S: CacheStore<T>> EntityApi<T, S> {
  pub fn builder() -> EntityApiBuilder<T, S> {
    EntityApiBuilder::new()
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Tags provided by a list-shaped result; handed to the store
  /// collaborator so newly created entities can refresh collection views.
  pub fn page_tags(page: &SearchPage<T>) -> Vec<Tag> {
    Tag::for_items::<T>(page.data.iter().map(Entity::id))
  }

  /// Tags provided by a single-entity result.
  pub fn entity_tags(entity: &T) -> Vec<Tag> {
    vec![Tag::item::<T>(entity.id())]
  }

  fn entity_url(&self, id: &EntityId) -> String {
    format!("{}/{}", self.base_endpoint, id)
  }

  /// POST a new entity. The request body passes through only the supplied
  /// patch fields. Cached list views are not speculatively extended; the
  /// list-marker tag lets the subscription layer refresh them.
  pub async fn create(&self, patch: &EntityPatch) -> Result<T, ApiError> {
    let request = RequestDescriptor::post(self.base_endpoint.as_str(), patch.to_request_body());
    let body = self.transport.request(request).await?;
    let entity: T = from_wire(body.ok_or(ApiError::EmptyResponse("create"))?)?;
    debug!(entity = T::entity_name(), id = %entity.id(), "entity created");
    Ok(entity)
  }

  /// GET one page of results and cache it as a search view keyed by the
  /// canonical request (page included).
  pub async fn search(&self, request: &SearchRequest) -> Result<SearchPage<T>, ApiError> {
    let normalized = request.normalized();
    let descriptor =
      RequestDescriptor::get(self.base_endpoint.as_str()).with_params(normalized.to_params());
    let body = self.transport.request(descriptor).await?;
    let page: SearchPage<T> =
      serde_json::from_value(body.ok_or(ApiError::EmptyResponse("search"))?)?;

    let key = ViewKey::new(Endpoint::Search, normalized.cache_key());
    let view = View::List(ListView::page(SearchPage {
      data: page.data.clone(),
      pagination: page.pagination,
    }));
    let tags = view.provides_tags();
    self.store.upsert_view(key, view, tags);

    Ok(page)
  }

  /// GET one page and merge it into the infinite accumulation for this
  /// query. The accumulation's identity excludes `page`, so every page of
  /// the same query lands in one growing view.
  pub async fn search_infinite(&self, request: &SearchRequest) -> Result<ListView<T>, ApiError> {
    let normalized = request.normalized();
    let descriptor =
      RequestDescriptor::get(self.base_endpoint.as_str()).with_params(normalized.to_params());
    let body = self.transport.request(descriptor).await?;
    let page: SearchPage<T> =
      serde_json::from_value(body.ok_or(ApiError::EmptyResponse("search"))?)?;
    let incoming = ListView::seeded(page);

    let key = ViewKey::new(Endpoint::SearchInfinite, normalized.cache_key_without_page());
    let merged = match self.store.get_view(&key) {
      Some(View::List(mut cached)) => {
        merge_page(&mut cached, incoming);
        cached
      }
      _ => incoming,
    };

    let view = View::List(merged.clone());
    let tags = view.provides_tags();
    self.store.upsert_view(key, view, tags);

    Ok(merged)
  }

  /// GET a single entity and cache it as a single view keyed by
  /// `(id, params)`.
  pub async fn get(&self, id: &EntityId, request: &EntityRequest) -> Result<T, ApiError> {
    let normalized = request.normalized();
    let descriptor =
      RequestDescriptor::get(self.entity_url(id)).with_params(normalized.to_params());
    let body = self.transport.request(descriptor).await?;
    let entity: T = from_wire(body.ok_or(ApiError::EmptyResponse("get"))?)?;

    let key = ViewKey::new(Endpoint::Get, get_cache_key(id, &normalized));
    let view = View::Single(entity.clone());
    let tags = view.provides_tags();
    self.store.upsert_view(key, view, tags);

    Ok(entity)
  }

  /// PUT a partial update and keep every cached view consistent.
  ///
  /// Optimistic mode patches views before dispatch and rolls back on
  /// transport failure. Pessimistic mode patches after success, preferring
  /// the server-returned entity and falling back to the request patch when
  /// the response has no body. Returns the server's entity when one came
  /// back.
  pub async fn update(&self, patch: &EntityPatch) -> Result<Option<T>, ApiError> {
    let id = patch.id().ok_or(ApiError::MissingId)?;
    let descriptor = RequestDescriptor::put(self.entity_url(&id), patch.to_request_body());

    if self.optimistic {
      let handles = patch_views(self.store.as_ref(), patch, &PatchOptions::default());
      let mut mutation = Mutation::optimistic(handles);

      match self.transport.request(descriptor).await {
        Ok(body) => {
          mutation.commit();
          let entity = body.map(from_wire::<T>).transpose()?;
          if self.should_refetch_entity {
            self.refetch_and_patch(&id).await?;
          }
          Ok(entity)
        }
        Err(err) => {
          mutation.roll_back(self.store.as_ref());
          Err(err.into())
        }
      }
    } else {
      let body = self.transport.request(descriptor).await?;
      let entity = body.map(from_wire::<T>).transpose()?;

      if self.should_refetch_entity {
        self.refetch_and_patch(&id).await?;
      } else {
        let effective = match &entity {
          Some(entity) => EntityPatch::from_entity(entity)?,
          None => patch.clone(),
        };
        patch_views(self.store.as_ref(), &effective, &PatchOptions::default());
      }

      Ok(entity)
    }
  }

  /// DELETE an entity and evict it from every cached list view, with the
  /// same optimistic/pessimistic split as [`update`](Self::update).
  pub async fn delete(&self, id: &EntityId) -> Result<(), ApiError> {
    let descriptor = RequestDescriptor::delete(self.entity_url(id));

    if self.optimistic {
      let handles = evict_views(self.store.as_ref(), id, &EvictOptions::default());
      let mut mutation = Mutation::optimistic(handles);

      match self.transport.request(descriptor).await {
        Ok(_) => {
          mutation.commit();
          Ok(())
        }
        Err(err) => {
          mutation.roll_back(self.store.as_ref());
          Err(err.into())
        }
      }
    } else {
      self.transport.request(descriptor).await?;
      evict_views(self.store.as_ref(), id, &EvictOptions::default());
      Ok(())
    }
  }

  /// Force-fetch the canonical entity, bypassing the cache.
  pub async fn fetch_entity(&self, id: &EntityId) -> Result<Option<T>, ApiError> {
    let descriptor = RequestDescriptor::get(self.entity_url(id));
    let body = self.transport.request(descriptor).await?;
    Ok(body.map(from_wire::<T>).transpose()?)
  }

  /// Propagate a partial into every affected cached view. Exposed for
  /// callers that mutate entities through out-of-band channels.
  pub fn patch_entity_views(
    &self,
    patch: &EntityPatch,
    options: &PatchOptions,
  ) -> Vec<UndoHandle<T>> {
    patch_views(self.store.as_ref(), patch, options)
  }

  /// Evict an identity from every affected cached list view.
  pub fn evict_entity_views(
    &self,
    id: &EntityId,
    options: &EvictOptions,
  ) -> Vec<UndoHandle<T>> {
    evict_views(self.store.as_ref(), id, options)
  }

  /// GET the canonical entity and patch views with its full wire form,
  /// picking up server-computed fields. One request, then a synchronous
  /// patch loop.
  async fn refetch_and_patch(&self, id: &EntityId) -> Result<(), ApiError> {
    if let Some(entity) = self.fetch_entity(id).await? {
      let full = EntityPatch::from_entity(&entity)?;
      patch_views(self.store.as_ref(), &full, &PatchOptions::default());
    }
    Ok(())
  }
}
