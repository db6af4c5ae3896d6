//! The view patch engine: propagate a partial entity into every cached
//! view that references its identity.

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::store::{CacheStore, UndoEdit, UndoHandle};
use crate::cache::tags::Tag;
use crate::cache::views::View;
use crate::entity::{Entity, EntityPatch};

/// Options for [`patch_views`].
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
  /// Tags to consult in addition to the defaults (`[id, LIST]`).
  pub extra_tags: Vec<Tag>,
}

/// Find every cached view tagged with the patch's identity (or the list
/// marker) and merge the partial into it in place.
///
/// A patch without an id is a no-op, not an error. The loop over affected
/// views is synchronous: no suspension point, so concurrent mutations
/// cannot interleave mid-loop. Returns one undo handle per mutated view,
/// in application order.
pub fn patch_views<T, S>(store: &S, patch: &EntityPatch, options: &PatchOptions) -> Vec<UndoHandle<T>>
where
  T: Entity,
  S: CacheStore<T>,
{
  let Some(id) = patch.id() else {
    return Vec::new();
  };

  let tags = Tag::mutation_tags::<T>(&id, &options.extra_tags);
  let keys = store.select_tagged(&tags);
  debug!(entity = T::entity_name(), %id, views = keys.len(), "patching cached views");

  let mut handles = Vec::new();
  for key in keys {
    let handle = store.update_view(&key, |view| match view {
      View::List(list) => {
        let index = list.item_index(&id)?;
        let prior = list.data[index].clone();
        let merged = merge_entity(&prior, patch)?;
        list.data[index] = merged;
        Some(UndoEdit::ReplaceItem {
          id: id.clone(),
          prior,
        })
      }
      View::Single(entity) => {
        if entity.id() != id {
          return None;
        }
        let prior = entity.clone();
        let merged = merge_entity(&prior, patch)?;
        *entity = merged;
        Some(UndoEdit::ReplaceSingle { prior })
      }
    });

    if let Some(handle) = handle {
      handles.push(handle);
    }
  }

  handles
}

/// Merge a partial into an existing entity: scalar and object fields merge
/// field by field, array-valued patch fields replace the existing array
/// wholesale. `None` when the merged result no longer matches the entity
/// shape; the caller leaves that view untouched.
pub fn merge_entity<T: Entity>(existing: &T, patch: &EntityPatch) -> Option<T> {
  let mut value = serde_json::to_value(existing).ok()?;
  merge_value(&mut value, &Value::Object(patch.fields().clone()));

  match serde_json::from_value(value) {
    Ok(merged) => Some(merged),
    Err(err) => {
      warn!(entity = T::entity_name(), %err, "patch broke the entity shape; view left untouched");
      None
    }
  }
}

fn merge_value(target: &mut Value, patch: &Value) {
  match (target, patch) {
    (Value::Object(target_map), Value::Object(patch_map)) => {
      for (key, patch_field) in patch_map {
        match target_map.get_mut(key) {
          Some(existing) if existing.is_object() && patch_field.is_object() => {
            merge_value(existing, patch_field);
          }
          // Arrays (and scalars) from the patch replace wholesale.
          _ => {
            target_map.insert(key.clone(), patch_field.clone());
          }
        }
      }
    }
    (target, patch) => *target = patch.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::views::{Endpoint, ViewKey};
  use crate::cache::MemoryStore;
  use crate::entity::EntityId;
  use crate::fixtures::{list_view, sample_task, Task};
  use serde_json::json;

  fn seeded_store() -> (MemoryStore<Task>, ViewKey, ViewKey) {
    let store = MemoryStore::new();

    let list = View::List(list_view(
      vec![sample_task(1, "one"), sample_task(2, "two")],
      1,
      2,
    ));
    let list_key = ViewKey::new(Endpoint::Search, "list");
    let tags = list.provides_tags();
    store.upsert_view(list_key.clone(), list, tags);

    let single = View::Single(sample_task(1, "one"));
    let single_key = ViewKey::new(Endpoint::Get, "single");
    let tags = single.provides_tags();
    store.upsert_view(single_key.clone(), single, tags);

    (store, list_key, single_key)
  }

  #[test]
  fn test_patch_reaches_every_tagged_view() {
    let (store, list_key, single_key) = seeded_store();

    let patch = EntityPatch::new(1).set("name", "renamed");
    let handles = patch_views(&store, &patch, &PatchOptions::default());
    assert_eq!(handles.len(), 2);

    let list = store.get_list_view(&list_key).unwrap();
    assert_eq!(list.data[0].name, "renamed");
    assert_eq!(list.data[1].name, "two");

    let single = store.get_view(&single_key).unwrap();
    assert_eq!(single.as_single().unwrap().name, "renamed");
  }

  #[test]
  fn test_patch_without_id_is_noop() {
    let (store, list_key, _) = seeded_store();
    let before = store.get_list_view(&list_key).unwrap();

    assert!(patch_views::<Task, _>(&store, &EntityPatch::empty(), &Default::default()).is_empty());
    let no_id = EntityPatch::empty().set("name", "x");
    assert!(patch_views::<Task, _>(&store, &no_id, &Default::default()).is_empty());

    assert_eq!(store.get_list_view(&list_key).unwrap(), before);
  }

  #[test]
  fn test_patch_skips_list_views_without_the_item() {
    let (store, _, _) = seeded_store();
    let patch = EntityPatch::new(99).set("name", "ghost");
    // The list marker tag matches the list view, but the item is absent.
    assert!(patch_views::<Task, _>(&store, &patch, &Default::default()).is_empty());
  }

  #[test]
  fn test_merge_overrides_arrays_wholesale() {
    let task = Task {
      labels: vec!["a".into(), "b".into()],
      ..sample_task(1, "one")
    };
    let patch = EntityPatch::new(1).set("labels", json!(["c"]));
    let merged = merge_entity(&task, &patch).unwrap();
    assert_eq!(merged.labels, vec!["c".to_string()]);
    // Untouched fields survive the merge.
    assert_eq!(merged.name, "one");
  }

  #[test]
  fn test_merge_rejects_shape_breaking_patch() {
    let task = sample_task(1, "one");
    let patch = EntityPatch::new(1).set("created_at", json!({ "nested": true }));
    assert!(merge_entity(&task, &patch).is_none());
  }

  #[test]
  fn test_undo_restores_prior_item() {
    let (store, list_key, _) = seeded_store();
    let patch = EntityPatch::new(2).set("name", "patched");
    let handles = patch_views(&store, &patch, &PatchOptions::default());

    for handle in handles {
      store.apply_undo(handle);
    }

    let list = store.get_list_view(&list_key).unwrap();
    assert_eq!(list.data[1].name, "two");
  }

  #[test]
  fn test_single_view_with_other_identity_untouched() {
    let store = MemoryStore::new();
    let single = View::Single(sample_task(5, "five"));
    let key = ViewKey::new(Endpoint::Get, "five");
    let tags = single.provides_tags();
    store.upsert_view(key.clone(), single, tags);

    // Tag collision via extra tags should still not merge a foreign id.
    let patch = EntityPatch::new(1).set("name", "intruder");
    let options = PatchOptions {
      extra_tags: vec![Tag::item::<Task>(EntityId::Num(5))],
    };
    assert!(patch_views::<Task, _>(&store, &patch, &options).is_empty());
    assert_eq!(store.get_view(&key).unwrap().as_single().unwrap().name, "five");
  }
}
