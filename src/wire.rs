//! Serde helpers for wire payloads: date parsing and boolean coercion.
//!
//! Entities keep typed fields (`DateTime<Utc>`, `NaiveDate`, `bool`) and
//! annotate them with these modules to control the wire representation:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct Task {
//!   id: i64,
//!   #[serde(with = "entikit::wire::datetime")]
//!   created_at: DateTime<Utc>,
//!   #[serde(default, with = "entikit::wire::date_only_opt")]
//!   due_date: Option<NaiveDate>,
//!   #[serde(with = "entikit::wire::boolean")]
//!   done: bool,
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Re-serialize a value through JSON to convert between compatible shapes.
pub fn reserialize<T: DeserializeOwned>(value: impl Serialize) -> serde_json::Result<T> {
  serde_json::from_value(serde_json::to_value(value)?)
}

/// Instantiate a typed entity from a raw wire payload.
pub fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
  Ok(serde_json::from_value(value)?)
}

/// Convert a typed entity back to its wire form.
pub fn to_wire<T: Serialize>(entity: &T) -> Result<Value, ApiError> {
  Ok(serde_json::to_value(entity)?)
}

/// Coerce a boolean-like wire value. Servers send `true`, `"true"`, `"1"`
/// or `1` interchangeably for flag fields.
pub(crate) fn coerce_bool(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => match n.as_i64() {
      Some(0) => Some(false),
      Some(1) => Some(true),
      _ => None,
    },
    Value::String(s) => match s.to_ascii_lowercase().as_str() {
      "true" | "1" => Some(true),
      "false" | "0" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

/// Full ISO-8601 timestamps, always UTC on the wire.
pub mod datetime {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(serde::de::Error::custom)
  }
}

/// Optional ISO-8601 timestamp; absent and `null` both map to `None`.
pub mod datetime_opt {
  use chrono::{DateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
      Some(s) if !s.is_empty() => DateTime::parse_from_rfc3339(&s)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(serde::de::Error::custom),
      _ => Ok(None),
    }
  }
}

/// Date-only fields (`YYYY-MM-DD`), for fields where the server drops the
/// time component.
pub mod date_only {
  use chrono::NaiveDate;
  use serde::{Deserialize, Deserializer, Serializer};

  const FORMAT: &str = "%Y-%m-%d";

  pub fn serialize<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.format(FORMAT).to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
  }
}

/// Optional date-only field.
pub mod date_only_opt {
  use chrono::NaiveDate;
  use serde::{Deserialize, Deserializer, Serializer};

  const FORMAT: &str = "%Y-%m-%d";

  pub fn serialize<S: Serializer>(
    value: &Option<NaiveDate>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
      Some(s) if !s.is_empty() => NaiveDate::parse_from_str(&s, FORMAT)
        .map(Some)
        .map_err(serde::de::Error::custom),
      _ => Ok(None),
    }
  }
}

/// Boolean flags that may arrive as `true`, `"true"`, `"1"` or `1`.
pub mod boolean {
  use serde::{Deserialize, Deserializer, Serializer};
  use serde_json::Value;

  pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(*value)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    super::coerce_bool(&raw)
      .ok_or_else(|| serde::de::Error::custom(format!("cannot coerce {raw} to a boolean")))
  }
}

/// Optional boolean flag with the same coercions as [`boolean`].
pub mod boolean_opt {
  use serde::{Deserialize, Deserializer, Serializer};
  use serde_json::Value;

  pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
      Some(b) => serializer.serialize_bool(*b),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<bool>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
      Some(Value::Null) | None => Ok(None),
      Some(v) => super::coerce_bool(&v)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("cannot coerce {v} to a boolean"))),
    }
  }
}
