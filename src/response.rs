//! Wire shapes for paginated search responses.

use serde::{Deserialize, Serialize};

/// Pagination metadata describing one fetched page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  #[serde(default)]
  pub current_page: u32,
  #[serde(default)]
  pub last_page: u32,
  #[serde(default)]
  pub per_page: u32,
  #[serde(default)]
  pub total: u64,
}

/// One page's worth of search results as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::Task;
  use serde_json::json;

  #[test]
  fn test_search_page_decodes_wire_shape() {
    let page: SearchPage<Task> = serde_json::from_value(json!({
      "data": [
        { "id": 1, "name": "a", "done": false, "created_at": "2026-01-10T08:00:00+00:00" }
      ],
      "pagination": { "current_page": 1, "last_page": 3, "per_page": 10, "total": 25 }
    }))
    .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.current_page, 1);
  }

  #[test]
  fn test_missing_pagination_defaults() {
    let page: SearchPage<Task> = serde_json::from_value(json!({ "data": [] })).unwrap();
    assert_eq!(page.pagination, Pagination::default());
  }
}
