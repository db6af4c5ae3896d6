//! The reactive cache-store capability and an in-memory implementation.
//!
//! The patch/evict engines only require the small [`CacheStore`] surface:
//! select views by tag, mutate a view in place, upsert a view with its
//! tags. Any concurrency-safe observable store satisfies the contract;
//! [`MemoryStore`] is the reference implementation used in tests and
//! single-process apps.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tracing::debug;

use crate::cache::tags::Tag;
use crate::cache::views::{ListView, View, ViewKey};
use crate::entity::{Entity, EntityId};

/// The captured inverse of one view mutation.
#[derive(Debug, Clone)]
pub enum UndoEdit<T> {
  /// A list item was replaced; restore the prior item by identity.
  ReplaceItem { id: EntityId, prior: T },
  /// A list item was evicted; reinsert it at its old position and restore
  /// the total if it was decremented.
  RestoreItem {
    index: usize,
    item: T,
    total_bumped: bool,
  },
  /// A single view was merged into; restore the prior entity.
  ReplaceSingle { prior: T },
}

impl<T: Entity> UndoEdit<T> {
  /// Apply the inverse edit. Reverses only the edit it captured: if the
  /// view has since diverged (item gone, view replaced) this is a no-op
  /// for the missing part.
  pub fn apply(self, view: &mut View<T>) {
    match (self, view) {
      (UndoEdit::ReplaceItem { id, prior }, View::List(list)) => {
        if let Some(index) = list.item_index(&id) {
          list.data[index] = prior;
        }
      }
      (
        UndoEdit::RestoreItem {
          index,
          item,
          total_bumped,
        },
        View::List(list),
      ) => {
        if list.item_index(&item.id()).is_none() {
          let index = index.min(list.data.len());
          list.data.insert(index, item);
          if total_bumped {
            list.pagination.total += 1;
          }
        }
      }
      (UndoEdit::ReplaceSingle { prior }, View::Single(entity)) => {
        *entity = prior;
      }
      // Edit kind no longer matches the view kind; nothing to reverse.
      _ => {}
    }
  }
}

/// A reversible handle for one applied view mutation.
#[derive(Debug, Clone)]
pub struct UndoHandle<T> {
  pub key: ViewKey,
  pub edit: UndoEdit<T>,
}

/// The store capability consumed by the patch/evict engines.
pub trait CacheStore<T: Entity>: Send + Sync {
  /// Every view currently associated with any of the given tags, in a
  /// deterministic order.
  fn select_tagged(&self, tags: &[Tag]) -> Vec<ViewKey>;

  /// Snapshot of one view.
  fn get_view(&self, key: &ViewKey) -> Option<View<T>>;

  /// Run a synchronous mutator against a view. The mutator returns the
  /// inverse edit when it changed something; `None` means it left the view
  /// untouched. Missing view: `None`.
  fn update_view<F>(&self, key: &ViewKey, mutate: F) -> Option<UndoHandle<T>>
  where
    F: FnOnce(&mut View<T>) -> Option<UndoEdit<T>>;

  /// Register or replace a view together with its tag associations.
  fn upsert_view(&self, key: ViewKey, view: View<T>, tags: Vec<Tag>);

  /// Reverse a previously applied mutation. Silently does nothing when the
  /// view has since disappeared.
  fn apply_undo(&self, handle: UndoHandle<T>) {
    let UndoHandle { key, edit } = handle;
    self.update_view(&key, move |view| {
      edit.apply(view);
      None
    });
  }
}

struct ViewSlot<T> {
  view: View<T>,
  tags: Vec<Tag>,
}

struct StoreInner<T> {
  views: HashMap<ViewKey, ViewSlot<T>>,
  tag_index: HashMap<Tag, HashSet<ViewKey>>,
}

/// In-memory tag-indexed view store. Views live until replaced; the
/// subscription-driven garbage collection of a full reactive store is out
/// of scope here.
pub struct MemoryStore<T> {
  inner: Mutex<StoreInner<T>>,
}

impl<T: Entity> MemoryStore<T> {
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(StoreInner {
        views: HashMap::new(),
        tag_index: HashMap::new(),
      }),
    }
  }

  /// Convenience accessor for list-shaped views.
  pub fn get_list_view(&self, key: &ViewKey) -> Option<ListView<T>> {
    match self.get_view(key)? {
      View::List(list) => Some(list),
      View::Single(_) => None,
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner<T>> {
    match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

impl<T: Entity> Default for MemoryStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Entity> CacheStore<T> for MemoryStore<T> {
  fn select_tagged(&self, tags: &[Tag]) -> Vec<ViewKey> {
    let inner = self.lock();
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for tag in tags {
      if let Some(tagged) = inner.tag_index.get(tag) {
        for key in tagged {
          if seen.insert(key.clone()) {
            keys.push(key.clone());
          }
        }
      }
    }
    // Tag-index iteration order is arbitrary; sort for determinism.
    keys.sort();
    keys
  }

  fn get_view(&self, key: &ViewKey) -> Option<View<T>> {
    self.lock().views.get(key).map(|slot| slot.view.clone())
  }

  fn update_view<F>(&self, key: &ViewKey, mutate: F) -> Option<UndoHandle<T>>
  where
    F: FnOnce(&mut View<T>) -> Option<UndoEdit<T>>,
  {
    let mut inner = self.lock();
    let slot = inner.views.get_mut(key)?;
    let edit = mutate(&mut slot.view)?;
    Some(UndoHandle {
      key: key.clone(),
      edit,
    })
  }

  fn upsert_view(&self, key: ViewKey, view: View<T>, tags: Vec<Tag>) {
    let mut inner = self.lock();

    if let Some(old) = inner.views.remove(&key) {
      for tag in old.tags {
        if let Some(tagged) = inner.tag_index.get_mut(&tag) {
          tagged.remove(&key);
          if tagged.is_empty() {
            inner.tag_index.remove(&tag);
          }
        }
      }
    }

    for tag in &tags {
      inner
        .tag_index
        .entry(tag.clone())
        .or_default()
        .insert(key.clone());
    }

    debug!(endpoint = key.endpoint.as_str(), hash = %key.hash, tags = tags.len(), "view upserted");
    inner.views.insert(key, ViewSlot { view, tags });
  }
}
