// activities/ordering.rs
// Ordering of activity id lists: newest first, local first among equal
// timestamps, then id descending.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::types::ActivityRecord;

/// `Less` means `a` is listed before `b`
pub fn compare_activities(a: &ActivityRecord, b: &ActivityRecord) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| b.is_local().cmp(&a.is_local()))
        .then_with(|| b.id().cmp(a.id()))
}

/// Ids without a record sort after every known id.
pub fn compare_activity_ids(
    a: &str,
    b: &str,
    by_id: &HashMap<String, ActivityRecord>,
) -> Ordering {
    match (by_id.get(a), by_id.get(b)) {
        (Some(left), Some(right)) => compare_activities(left, right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    }
}

pub fn sort_activity_ids(ids: &mut [String], by_id: &HashMap<String, ActivityRecord>) {
    ids.sort_by(|a, b| compare_activity_ids(a, b, by_id));
}

pub fn is_sorted_by_activity_order(ids: &[String], by_id: &HashMap<String, ActivityRecord>) -> bool {
    ids.windows(2)
        .all(|pair| compare_activity_ids(&pair[0], &pair[1], by_id) != Ordering::Greater)
}

/// Keeps the first occurrence of each id
fn dedupe_known(
    ids: impl IntoIterator<Item = String>,
    by_id: &HashMap<String, ActivityRecord>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| by_id.contains_key(id) && seen.insert(id.clone()))
        .collect()
}

/// Merge `new_ids` into `existing`, dropping duplicates and ids that have no
/// record, and return the result in activity order.
pub fn merge_sorted_activity_ids(
    new_ids: &[String],
    existing: &[String],
    by_id: &HashMap<String, ActivityRecord>,
) -> Vec<String> {
    let mut merged = dedupe_known(new_ids.iter().chain(existing.iter()).cloned(), by_id);
    sort_activity_ids(&mut merged, by_id);
    merged
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxTimeMerge {
    pub ids: Vec<String>,
    /// Ids older than the cutoff were dropped
    pub trimmed: bool,
}

fn oldest_chain_timestamp(ids: &[String], by_id: &HashMap<String, ActivityRecord>) -> Option<i64> {
    ids.iter()
        .filter_map(|id| by_id.get(id))
        .filter(|activity| !activity.is_local())
        .map(|activity| activity.timestamp())
        .min()
}

/// Merge a freshly loaded first page into an existing list.
///
/// Chains deliver their initial pages independently, so each list only covers
/// history back to its own oldest entry. The merged list is cut at the later
/// of the two oldest non-local timestamps; anything older would leave a gap
/// that pagination could never fill. Local and pending ids are always kept.
pub fn merge_activity_ids_to_max_time(
    new_ids: &[String],
    existing: &[String],
    by_id: &HashMap<String, ActivityRecord>,
) -> MaxTimeMerge {
    let cutoff = if new_ids.is_empty() || existing.is_empty() {
        None
    } else {
        match (
            oldest_chain_timestamp(new_ids, by_id),
            oldest_chain_timestamp(existing, by_id),
        ) {
            (Some(new_oldest), Some(existing_oldest)) => Some(new_oldest.max(existing_oldest)),
            _ => None,
        }
    };

    let merged = merge_sorted_activity_ids(new_ids, existing, by_id);
    let Some(cutoff) = cutoff else {
        return MaxTimeMerge {
            ids: merged,
            trimmed: false,
        };
    };

    let before = merged.len();
    let ids: Vec<String> = merged
        .into_iter()
        .filter(|id| match by_id.get(id) {
            Some(activity) => {
                activity.is_local() || activity.is_pending() || activity.timestamp() >= cutoff
            }
            None => false,
        })
        .collect();
    let trimmed = ids.len() < before;

    MaxTimeMerge { ids, trimmed }
}
