//! The pagination accumulator: merge a newly fetched page into an
//! existing infinite accumulation.

use std::collections::HashSet;

use crate::cache::views::ListView;
use crate::entity::Entity;

/// Merge `incoming` into `cached`, in rule order:
///
/// 1. both pages are page 1: full reset (pull-to-refresh, filter change);
/// 2. drop cached items refetched by the incoming page (dedup);
/// 3. incoming page at or below `min_page`: backward page, prepend and
///    lower `min_page`;
/// 4. otherwise: forward page, append and adopt the incoming pagination.
///
/// The first-ever fetch never reaches this function; the initial view is
/// seeded directly via [`ListView::seeded`].
pub fn merge_page<T: Entity>(cached: &mut ListView<T>, incoming: ListView<T>) {
  if incoming.pagination.current_page == 1 && cached.pagination.current_page == 1 {
    cached.data = incoming.data;
    cached.pagination = incoming.pagination;
    cached.min_page = Some(1);
    return;
  }

  let incoming_ids: HashSet<_> = incoming.data.iter().map(Entity::id).collect();
  cached.data.retain(|item| !incoming_ids.contains(&item.id()));

  let page = incoming.pagination.current_page;
  if cached.min_page.is_some_and(|min_page| page <= min_page) {
    let mut data = incoming.data;
    data.append(&mut cached.data);
    cached.data = data;
    cached.min_page = Some(page);
  } else {
    cached.data.extend(incoming.data);
    cached.pagination = incoming.pagination;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fixtures::{sample_task, search_page, Task};

  fn accumulation(ids: &[i64], current_page: u32, min_page: u32) -> ListView<Task> {
    let tasks = ids.iter().map(|id| sample_task(*id, "t")).collect();
    let mut page = search_page(tasks, current_page, 100);
    page.pagination.last_page = 10;
    let mut view = ListView::seeded(page);
    view.min_page = Some(min_page);
    view
  }

  fn ids(view: &ListView<Task>) -> Vec<i64> {
    view.data.iter().map(|t| t.id).collect()
  }

  #[test]
  fn test_forward_page_appends_without_touching_min_page() {
    let mut cached = accumulation(&[21, 22], 2, 2);
    let incoming = accumulation(&[31, 32], 3, 3);

    merge_page(&mut cached, incoming);

    assert_eq!(ids(&cached), vec![21, 22, 31, 32]);
    assert_eq!(cached.min_page, Some(2));
    assert_eq!(cached.pagination.current_page, 3);
  }

  #[test]
  fn test_backward_page_prepends_and_lowers_min_page() {
    let mut cached = accumulation(&[21, 22], 2, 2);
    let incoming = accumulation(&[11, 12], 1, 1);

    merge_page(&mut cached, incoming);

    assert_eq!(ids(&cached), vec![11, 12, 21, 22]);
    assert_eq!(cached.min_page, Some(1));
    // Backward pages keep the cached pagination (the latest forward edge).
    assert_eq!(cached.pagination.current_page, 2);
  }

  #[test]
  fn test_page_one_against_page_one_resets() {
    let mut cached = accumulation(&[11, 12, 21, 22], 1, 1);
    let incoming = accumulation(&[41, 42], 1, 1);

    merge_page(&mut cached, incoming);

    assert_eq!(ids(&cached), vec![41, 42]);
    assert_eq!(cached.min_page, Some(1));
    assert_eq!(cached.pagination.current_page, 1);
  }

  #[test]
  fn test_refetched_page_replaces_duplicates() {
    let mut cached = accumulation(&[21, 22, 31], 3, 2);
    // Page 3 refetched with one overlapping and one new item.
    let incoming = accumulation(&[31, 33], 3, 3);

    merge_page(&mut cached, incoming);

    assert_eq!(ids(&cached), vec![21, 22, 31, 33]);
  }

  #[test]
  fn test_full_sequence_forward_backward_reset() {
    // Seeded at page 2, then page 3 forward, page 1 backward, page 1 reset.
    let mut cached = accumulation(&[21, 22], 2, 2);

    merge_page(&mut cached, accumulation(&[31, 32], 3, 3));
    assert_eq!(cached.min_page, Some(2));

    merge_page(&mut cached, accumulation(&[11, 12], 1, 1));
    assert_eq!(cached.min_page, Some(1));
    assert_eq!(ids(&cached), vec![11, 12, 21, 22, 31, 32]);

    // Now cached.pagination.current_page is still 3; a page-1 fetch is a
    // backward merge, not a reset...
    merge_page(&mut cached, accumulation(&[13], 1, 1));
    assert_eq!(ids(&cached), vec![13, 11, 12, 21, 22, 31, 32]);

    // ...until the cached pagination itself sits at page 1.
    cached.pagination.current_page = 1;
    merge_page(&mut cached, accumulation(&[99], 1, 1));
    assert_eq!(ids(&cached), vec![99]);
  }
}
