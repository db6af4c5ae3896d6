//! Search/get request types and canonicalization into cache keys.
//!
//! Two semantically identical requests (differing only in key order or
//! relation-list order) must produce the same canonical key so the cache
//! treats them as one view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::entity::EntityId;
use crate::wire;

/// Parameters for a single-entity `get`: relation-inclusion and aggregate
/// lists, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRequest {
  /// Relation paths to include, dot-delimited (`"author.team"`).
  #[serde(rename = "with", skip_serializing_if = "Option::is_none")]
  pub relations: Option<Vec<String>>,
  #[serde(rename = "with_count", skip_serializing_if = "Option::is_none")]
  pub with_count: Option<Vec<String>>,
  #[serde(rename = "with_avg", skip_serializing_if = "Option::is_none")]
  pub with_avg: Option<Vec<String>>,
}

impl EntityRequest {
  /// Collapse and sort every relation list. Pure; returns a new request.
  pub fn normalized(&self) -> Self {
    Self {
      relations: self.relations.as_deref().map(collapse_relations),
      with_count: self.with_count.as_deref().map(collapse_relations),
      with_avg: self.with_avg.as_deref().map(collapse_relations),
    }
  }

  /// Canonical wire parameters (sorted keys, `None` fields skipped).
  pub fn to_params(&self) -> Map<String, Value> {
    canonical_object(&self.normalized())
  }
}

/// Ordering selector: a single column or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderBy {
  One(String),
  Many(Vec<String>),
}

/// Parameters for `search`/`search_infinite`: filters, relation lists,
/// ordering and paging. Unrecognized fields ride along in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub query: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(rename = "per_page", skip_serializing_if = "Option::is_none")]
  pub per_page: Option<u32>,
  /// Fetch everything, ignoring paging. Boolean-like wire values coerce.
  #[serde(default, with = "wire::boolean_opt", skip_serializing_if = "Option::is_none")]
  pub all: Option<bool>,
  #[serde(rename = "order_by", skip_serializing_if = "Option::is_none")]
  pub order_by: Option<OrderBy>,
  #[serde(default, with = "wire::boolean_opt", skip_serializing_if = "Option::is_none")]
  pub desc: Option<bool>,
  #[serde(rename = "with", skip_serializing_if = "Option::is_none")]
  pub relations: Option<Vec<String>>,
  #[serde(rename = "with_count", skip_serializing_if = "Option::is_none")]
  pub with_count: Option<Vec<String>>,
  #[serde(rename = "with_avg", skip_serializing_if = "Option::is_none")]
  pub with_avg: Option<Vec<String>>,
  /// Endpoint-specific filters this layer does not interpret.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl SearchRequest {
  /// Collapse relation lists; every other field passes through unchanged.
  pub fn normalized(&self) -> Self {
    Self {
      relations: self.relations.as_deref().map(collapse_relations),
      with_count: self.with_count.as_deref().map(collapse_relations),
      with_avg: self.with_avg.as_deref().map(collapse_relations),
      ..self.clone()
    }
  }

  /// Canonical wire parameters (sorted keys, `None` fields skipped).
  pub fn to_params(&self) -> Map<String, Value> {
    canonical_object(&self.normalized())
  }

  /// Cache key for one-page search views: the page is part of the identity.
  pub fn cache_key(&self) -> String {
    hash_key(&Value::Object(self.to_params()).to_string())
  }

  /// Cache key for infinite views: every page of the same query shares one
  /// accumulation, so `page` is excluded from the identity.
  pub fn cache_key_without_page(&self) -> String {
    let mut params = self.to_params();
    params.remove("page");
    hash_key(&Value::Object(params).to_string())
  }
}

/// Cache key for a single-entity view: `(id, normalized params)`.
pub fn get_cache_key(id: &EntityId, request: &EntityRequest) -> String {
  hash_key(&format!("{id}:{}", Value::Object(request.to_params())))
}

/// SHA-256 hash for stable, fixed-length keys.
pub(crate) fn hash_key(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}

/// Remove relation paths already covered by a more specific path:
/// `["a", "a.b", "c"]` collapses to `["a.b", "c"]`. Deduplicated and sorted
/// for determinism.
fn collapse_relations(relations: &[String]) -> Vec<String> {
  let mut kept: Vec<String> = relations
    .iter()
    .filter(|relation| {
      let segments: Vec<&str> = relation.split('.').collect();
      !relations.iter().any(|other| {
        let other_segments: Vec<&str> = other.split('.').collect();
        other_segments.len() > segments.len()
          && segments.iter().zip(&other_segments).all(|(a, b)| a == b)
      })
    })
    .cloned()
    .collect();

  kept.sort();
  kept.dedup();
  kept
}

/// Serialize to a JSON object. serde_json's map is ordered by key, which is
/// what makes the canonical form stable.
fn canonical_object<T: Serialize>(value: &T) -> Map<String, Value> {
  match serde_json::to_value(value) {
    Ok(Value::Object(map)) => map,
    _ => Map::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_relation_path_collapsing() {
    let request = SearchRequest {
      relations: Some(strings(&["a", "a.b", "c"])),
      ..Default::default()
    };
    assert_eq!(
      request.normalized().relations,
      Some(strings(&["a.b", "c"]))
    );
  }

  #[test]
  fn test_collapse_dedupes_and_sorts() {
    assert_eq!(
      collapse_relations(&strings(&["z", "b", "b", "a.b.c", "a.b"])),
      strings(&["a.b.c", "b", "z"])
    );
  }

  #[test]
  fn test_prefix_must_match_whole_segments() {
    // "ab" is not a parent of "a.b" and vice versa
    assert_eq!(
      collapse_relations(&strings(&["ab", "a.b"])),
      strings(&["a.b", "ab"])
    );
  }

  #[test]
  fn test_equivalent_requests_share_cache_key() {
    let a = SearchRequest {
      query: Some("rust".into()),
      relations: Some(strings(&["a", "a.b", "c"])),
      ..Default::default()
    };
    let b = SearchRequest {
      relations: Some(strings(&["c", "a.b"])),
      query: Some("rust".into()),
      ..Default::default()
    };
    assert_eq!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_page_excluded_from_infinite_key() {
    let page2 = SearchRequest {
      query: Some("rust".into()),
      page: Some(2),
      ..Default::default()
    };
    let page3 = SearchRequest {
      page: Some(3),
      ..page2.clone()
    };
    assert_ne!(page2.cache_key(), page3.cache_key());
    assert_eq!(
      page2.cache_key_without_page(),
      page3.cache_key_without_page()
    );
  }

  #[test]
  fn test_boolean_like_flags_coerce() {
    let request: SearchRequest =
      serde_json::from_value(json!({ "all": "1", "desc": "false" })).unwrap();
    assert_eq!(request.all, Some(true));
    assert_eq!(request.desc, Some(false));
  }

  #[test]
  fn test_unrecognized_fields_pass_through() {
    let request: SearchRequest =
      serde_json::from_value(json!({ "status": "open", "assignee_id": 4 })).unwrap();
    let params = request.to_params();
    assert_eq!(params.get("status"), Some(&json!("open")));
    assert_eq!(params.get("assignee_id"), Some(&json!(4)));
  }
}
