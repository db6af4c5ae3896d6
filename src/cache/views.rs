//! Cached view shapes.
//!
//! The view kind is a tagged variant decided at registration time, not
//! inferred from the value's structure at patch time: a view is either
//! list-shaped (search pages and infinite accumulations) or a single
//! entity.

use crate::cache::tags::Tag;
use crate::entity::{Entity, EntityId};
use crate::response::{Pagination, SearchPage};

/// Which endpoint family a view belongs to. Part of the view's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
  Search,
  SearchInfinite,
  Get,
}

impl Endpoint {
  pub fn as_str(&self) -> &'static str {
    match self {
      Endpoint::Search => "search",
      Endpoint::SearchInfinite => "search_infinite",
      Endpoint::Get => "get",
    }
  }
}

/// Identity of one cached view: endpoint family plus the canonical-request
/// hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey {
  pub endpoint: Endpoint,
  pub hash: String,
}

impl ViewKey {
  pub fn new(endpoint: Endpoint, hash: impl Into<String>) -> Self {
    Self {
      endpoint,
      hash: hash.into(),
    }
  }
}

/// A list-shaped view: one search page, or an infinite accumulation when
/// `min_page` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
  pub data: Vec<T>,
  pub pagination: Pagination,
  /// Smallest page number merged into this accumulation. `None` for plain
  /// one-page search views.
  pub min_page: Option<u32>,
}

impl<T: Entity> ListView<T> {
  /// A one-page search view.
  pub fn page(page: SearchPage<T>) -> Self {
    Self {
      data: page.data,
      pagination: page.pagination,
      min_page: None,
    }
  }

  /// Seed an infinite accumulation from its first fetched page.
  pub fn seeded(page: SearchPage<T>) -> Self {
    let min_page = Some(page.pagination.current_page);
    Self {
      data: page.data,
      pagination: page.pagination,
      min_page,
    }
  }

  pub fn item_index(&self, id: &EntityId) -> Option<usize> {
    self.data.iter().position(|item| item.id() == *id)
  }
}

/// One cached, independently-addressable query result.
#[derive(Debug, Clone, PartialEq)]
pub enum View<T> {
  List(ListView<T>),
  Single(T),
}

impl<T: Entity> View<T> {
  /// The tags this view provides at registration time.
  pub fn provides_tags(&self) -> Vec<Tag> {
    match self {
      View::List(list) => Tag::for_items::<T>(list.data.iter().map(Entity::id)),
      View::Single(entity) => vec![Tag::item::<T>(entity.id())],
    }
  }

  pub fn as_list(&self) -> Option<&ListView<T>> {
    match self {
      View::List(list) => Some(list),
      View::Single(_) => None,
    }
  }

  pub fn as_single(&self) -> Option<&T> {
    match self {
      View::Single(entity) => Some(entity),
      View::List(_) => None,
    }
  }
}
