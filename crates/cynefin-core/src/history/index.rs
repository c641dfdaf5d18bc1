//! Pure operations over the in-memory summary index.
//!
//! The index is ordered by insertion recency: the newest summary is at
//! position 0 and ids are unique.

use crate::session::SessionSummary;

/// Inserts `summary` at the front, replacing any entry with the same id,
/// and truncates the result to `cap` entries.
///
/// This is the only place capacity is enforced for the index. Entries past
/// `cap` are the oldest ones and are dropped silently.
pub fn upsert_front(
    list: &[SessionSummary],
    summary: SessionSummary,
    cap: usize,
) -> Vec<SessionSummary> {
    let mut next = Vec::with_capacity((list.len() + 1).min(cap.max(1)));
    next.extend(
        list.iter()
            .filter(|existing| existing.id != summary.id)
            .take(cap.saturating_sub(1))
            .cloned(),
    );
    next.insert(0, summary);
    next.truncate(cap);
    next
}

/// Returns the list without the entry whose id is `id`.
pub fn remove_by_id(list: &[SessionSummary], id: &str) -> Vec<SessionSummary> {
    list.iter().filter(|summary| summary.id != id).cloned().collect()
}

/// Ids present in `before` but missing from `after`.
pub fn dropped_ids(before: &[SessionSummary], after: &[SessionSummary]) -> Vec<String> {
    before
        .iter()
        .filter(|old| !after.iter().any(|new| new.id == old.id))
        .map(|old| old.id.clone())
        .collect()
}
