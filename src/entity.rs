//! Entity identity and partial-patch types.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ApiError;

/// Entity identity: servers hand out either numeric or string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
  Num(i64),
  Str(String),
}

impl EntityId {
  /// Read an identity out of a raw wire value. Non-id-shaped values
  /// (objects, arrays, floats) yield `None`.
  pub fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::Number(n) => n.as_i64().map(EntityId::Num),
      Value::String(s) => Some(EntityId::Str(s.clone())),
      _ => None,
    }
  }
}

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EntityId::Num(n) => write!(f, "{n}"),
      EntityId::Str(s) => write!(f, "{s}"),
    }
  }
}

impl From<i64> for EntityId {
  fn from(id: i64) -> Self {
    EntityId::Num(id)
  }
}

impl From<&str> for EntityId {
  fn from(id: &str) -> Self {
    EntityId::Str(id.to_string())
  }
}

impl From<String> for EntityId {
  fn from(id: String) -> Self {
    EntityId::Str(id)
  }
}

impl From<EntityId> for Value {
  fn from(id: EntityId) -> Self {
    match id {
      EntityId::Num(n) => Value::from(n),
      EntityId::Str(s) => Value::from(s),
    }
  }
}

/// Trait for typed entities served by a REST endpoint.
///
/// Wire field mapping (snake_case names, date strings, boolean-like flags)
/// is expressed with serde attributes plus the helpers in [`crate::wire`];
/// see the round-trip law tested there.
pub trait Entity: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
  /// Unique identity. Immutable once assigned.
  fn id(&self) -> EntityId;

  /// Entity type name, used as the tag namespace (e.g. "task", "board").
  fn entity_name() -> &'static str;
}

/// A partial entity in wire form: the unit of a patch operation.
///
/// Fields use the entity's serialized names. A patch without an `"id"` field
/// cannot be propagated to cached views (propagation is a no-op).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch(Map<String, Value>);

impl EntityPatch {
  /// A patch carrying only the entity id.
  pub fn new(id: impl Into<EntityId>) -> Self {
    let mut fields = Map::new();
    fields.insert("id".to_string(), id.into().into());
    Self(fields)
  }

  /// A patch with no fields at all. Propagating it is a no-op.
  pub fn empty() -> Self {
    Self(Map::new())
  }

  /// The full wire form of an entity, usable as a patch that overwrites
  /// every field (canonical-refetch path).
  pub fn from_entity<T: Entity>(entity: &T) -> Result<Self, ApiError> {
    match serde_json::to_value(entity)? {
      Value::Object(fields) => Ok(Self(fields)),
      other => Err(ApiError::Decode(serde::de::Error::custom(format!(
        "entity serialized to non-object value: {other}"
      )))),
    }
  }

  /// Set a field, builder style.
  pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.0.insert(field.into(), value.into());
    self
  }

  /// The entity identity carried by this patch, if any.
  pub fn id(&self) -> Option<EntityId> {
    self.0.get("id").and_then(EntityId::from_value)
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Request body built from the supplied fields only; absent entity
  /// fields are not backfilled.
  pub fn to_request_body(&self) -> Value {
    Value::Object(self.0.clone())
  }
}

impl From<Map<String, Value>> for EntityPatch {
  fn from(fields: Map<String, Value>) -> Self {
    Self(fields)
  }
}
