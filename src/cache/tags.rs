//! Tags associate cached views with the entity identities they contain.
//!
//! List-like views carry one tag per item plus the list marker; single
//! views carry the item's identity tag. The store inverts this into
//! "given identity X, which views reference it".

use crate::entity::{Entity, EntityId};

/// Tag identity: a concrete entity id, or the list marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagId {
  Entity(EntityId),
  /// Sentinel meaning "this view represents a collection". Catches newly
  /// created entities that would not match any specific identity tag.
  List,
}

/// An association recorded at fetch time between a cached view and an
/// entity identity appearing in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
  pub entity: &'static str,
  pub id: TagId,
}

impl Tag {
  /// Tag for one concrete entity.
  pub fn item<T: Entity>(id: EntityId) -> Self {
    Self {
      entity: T::entity_name(),
      id: TagId::Entity(id),
    }
  }

  /// The list-marker tag for an entity type.
  pub fn list<T: Entity>() -> Self {
    Self {
      entity: T::entity_name(),
      id: TagId::List,
    }
  }

  /// The tag set a mutation against `id` must consult: the identity itself,
  /// the list marker, and any caller-supplied extras.
  pub fn mutation_tags<T: Entity>(id: &EntityId, extra: &[Tag]) -> Vec<Tag> {
    let mut tags = vec![Tag::item::<T>(id.clone()), Tag::list::<T>()];
    tags.extend(extra.iter().cloned());
    tags
  }

  /// Default tags provided by a list-shaped result: the list marker plus
  /// one tag per item.
  pub fn for_items<T: Entity>(ids: impl IntoIterator<Item = EntityId>) -> Vec<Tag> {
    let mut tags = vec![Tag::list::<T>()];
    tags.extend(ids.into_iter().map(Tag::item::<T>));
    tags
  }
}
