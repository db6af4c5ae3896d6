//! The view eviction engine: remove a deleted entity from every cached
//! list view that contains it.

use tracing::debug;

use crate::cache::store::{CacheStore, UndoEdit, UndoHandle};
use crate::cache::tags::Tag;
use crate::cache::views::View;
use crate::entity::{Entity, EntityId};

/// Options for [`evict_views`].
#[derive(Debug, Clone, Default)]
pub struct EvictOptions {
  /// Tags to consult in addition to the defaults (`[id, LIST]`).
  pub extra_tags: Vec<Tag>,
}

/// Remove the entity from every tagged list view, decrementing the cached
/// total exactly once per removal.
///
/// Single views are not evicted here: invalidating the deleted entity's
/// own `get` view is the subscription layer's job via the identity tag.
/// Returns one undo handle per mutated view.
pub fn evict_views<T, S>(store: &S, id: &EntityId, options: &EvictOptions) -> Vec<UndoHandle<T>>
where
  T: Entity,
  S: CacheStore<T>,
{
  let tags = Tag::mutation_tags::<T>(id, &options.extra_tags);
  let keys = store.select_tagged(&tags);
  debug!(entity = T::entity_name(), %id, views = keys.len(), "evicting from cached views");

  let mut handles = Vec::new();
  for key in keys {
    let handle = store.update_view(&key, |view| match view {
      View::List(list) => {
        let index = list.item_index(id)?;
        let item = list.data.remove(index);
        let total_bumped = list.pagination.total > 0;
        list.pagination.total = list.pagination.total.saturating_sub(1);
        Some(UndoEdit::RestoreItem {
          index,
          item,
          total_bumped,
        })
      }
      View::Single(_) => None,
    });

    if let Some(handle) = handle {
      handles.push(handle);
    }
  }

  handles
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::views::{Endpoint, ViewKey};
  use crate::cache::MemoryStore;
  use crate::fixtures::{list_view, sample_task, Task};

  fn seeded_store(total: u64) -> (MemoryStore<Task>, ViewKey) {
    let store = MemoryStore::new();
    let view = View::List(list_view(
      vec![sample_task(4, "four"), sample_task(5, "five")],
      1,
      total,
    ));
    let key = ViewKey::new(Endpoint::Search, "list");
    let tags = view.provides_tags();
    store.upsert_view(key.clone(), view, tags);
    (store, key)
  }

  #[test]
  fn test_evict_removes_item_and_decrements_total_once() {
    let (store, key) = seeded_store(10);

    let handles = evict_views(&store, &EntityId::Num(5), &EvictOptions::default());
    assert_eq!(handles.len(), 1);

    let list = store.get_list_view(&key).unwrap();
    assert_eq!(list.pagination.total, 9);
    assert!(list.item_index(&EntityId::Num(5)).is_none());

    // A second eviction of the same id finds nothing: no handles, no
    // second decrement.
    let again = evict_views::<Task, _>(&store, &EntityId::Num(5), &EvictOptions::default());
    assert!(again.is_empty());
    assert_eq!(store.get_list_view(&key).unwrap().pagination.total, 9);
  }

  #[test]
  fn test_evict_does_not_underflow_zero_total() {
    let (store, key) = seeded_store(0);
    evict_views::<Task, _>(&store, &EntityId::Num(4), &EvictOptions::default());
    assert_eq!(store.get_list_view(&key).unwrap().pagination.total, 0);
  }

  #[test]
  fn test_single_views_are_not_evicted() {
    let store = MemoryStore::new();
    let view = View::Single(sample_task(7, "keep me"));
    let key = ViewKey::new(Endpoint::Get, "single");
    let tags = view.provides_tags();
    store.upsert_view(key.clone(), view, tags);

    let handles = evict_views::<Task, _>(&store, &EntityId::Num(7), &EvictOptions::default());
    assert!(handles.is_empty());
    assert!(store.get_view(&key).is_some());
  }

  #[test]
  fn test_undo_restores_item_and_total() {
    let (store, key) = seeded_store(10);
    let handles = evict_views(&store, &EntityId::Num(4), &EvictOptions::default());

    for handle in handles {
      store.apply_undo(handle);
    }

    let list = store.get_list_view(&key).unwrap();
    assert_eq!(list.pagination.total, 10);
    assert_eq!(list.item_index(&EntityId::Num(4)), Some(0));
  }
}
