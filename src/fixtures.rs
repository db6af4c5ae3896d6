//! Shared test fixtures: a small task entity and view builders.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::ListView;
use crate::entity::{Entity, EntityId};
use crate::response::{Pagination, SearchPage};
use crate::wire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(with = "wire::boolean")]
  pub done: bool,
  #[serde(with = "wire::datetime")]
  pub created_at: DateTime<Utc>,
  #[serde(default, with = "wire::datetime_opt")]
  pub updated_at: Option<DateTime<Utc>>,
  #[serde(default, with = "wire::date_only_opt")]
  pub due_date: Option<NaiveDate>,
}

impl Entity for Task {
  fn id(&self) -> EntityId {
    EntityId::Num(self.id)
  }

  fn entity_name() -> &'static str {
    "task"
  }
}

pub fn sample_task(id: i64, name: &str) -> Task {
  Task {
    id,
    name: name.to_string(),
    labels: vec!["inbox".to_string()],
    done: false,
    created_at: Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap(),
    updated_at: None,
    due_date: None,
  }
}

/// The wire form of [`sample_task`], for scripting transport responses.
pub fn task_wire(id: i64, name: &str) -> Value {
  json!({
    "id": id,
    "name": name,
    "labels": ["inbox"],
    "done": false,
    "created_at": "2026-01-10T08:00:00+00:00",
  })
}

pub fn search_page(tasks: Vec<Task>, current_page: u32, total: u64) -> SearchPage<Task> {
  let per_page = 10;
  SearchPage {
    data: tasks,
    pagination: Pagination {
      current_page,
      last_page: (total.div_ceil(per_page as u64).max(1)) as u32,
      per_page,
      total,
    },
  }
}

pub fn list_view(tasks: Vec<Task>, current_page: u32, total: u64) -> ListView<Task> {
  ListView {
    data: tasks.clone(),
    pagination: search_page(tasks, current_page, total).pagination,
    min_page: None,
  }
}
