// activities/state.rs
// Per-account activity state and the list operations that keep it consistent

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ordering::{merge_activity_ids_to_max_time, merge_sorted_activity_ids};
use super::types::{is_local_id, ActivityRecord, Chain};
use crate::logger::{self, LogTag};

// =============================================================================
// ACCOUNT STATE
// =============================================================================

/// Everything known about one account's history.
///
/// Every id referenced by a list or set exists in `by_id`; ordered lists are
/// unique and sorted newest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountActivityState {
    pub account_id: String,
    pub by_id: HashMap<String, ActivityRecord>,
    pub ids_main: Vec<String>,
    pub ids_by_slug: HashMap<String, Vec<String>>,
    /// Newest final (non-local, non-pending) activity of each slug list
    pub newest_activities_by_slug: HashMap<String, ActivityRecord>,
    pub is_main_history_end_reached: bool,
    pub is_history_end_reached_by_slug: HashMap<String, bool>,
    pub local_activity_ids: BTreeSet<String>,
    /// Does not include local activities
    pub pending_activity_ids: HashMap<Chain, BTreeSet<String>>,
    pub is_initial_loaded_by_chain: HashMap<Chain, bool>,
}

/// Outcome of writing one record into `by_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// A decoded contract call with the same id is already present
    KeptCallContract,
    /// The stored record is final and the incoming one is pending
    KeptNonPending,
}

/// Usable as a pagination cursor
pub fn is_suitable_for_fetching_timestamp(activity: &ActivityRecord) -> bool {
    activity.is_non_pending() && !is_local_id(activity.id())
}

impl AccountActivityState {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, id: &str) -> Option<&ActivityRecord> {
        self.by_id.get(id)
    }

    /// `ids_by_slug[slug]` when filtered, `ids_main` otherwise
    pub fn ids_for(&self, slug: Option<&str>) -> &[String] {
        match slug {
            Some(slug) => self.ids_by_slug.get(slug).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.ids_main,
        }
    }

    pub fn is_history_end_reached(&self, slug: Option<&str>) -> bool {
        match slug {
            Some(slug) => self
                .is_history_end_reached_by_slug
                .get(slug)
                .copied()
                .unwrap_or(false),
            None => self.is_main_history_end_reached,
        }
    }

    pub fn set_history_end_reached(&mut self, slug: Option<&str>, is_reached: bool) {
        match slug {
            Some(slug) => {
                self.is_history_end_reached_by_slug
                    .insert(slug.to_string(), is_reached);
            }
            None => self.is_main_history_end_reached = is_reached,
        }
    }

    pub fn set_initial_loaded(&mut self, chain: Chain) {
        self.is_initial_loaded_by_chain.insert(chain, true);
    }

    pub fn is_initial_loaded(&self, chain: Chain) -> bool {
        self.is_initial_loaded_by_chain
            .get(&chain)
            .copied()
            .unwrap_or(false)
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Write one record into `by_id`.
    ///
    /// A final record is never replaced by a pending one with the same id; the
    /// attempt is logged as a status regression.
    pub fn store_activity(&mut self, activity: ActivityRecord) -> StoreOutcome {
        if let Some(existing) = self.by_id.get(activity.id()) {
            if existing.is_non_pending() && activity.is_pending() {
                logger::error(
                    LogTag::Store,
                    &format!(
                        "activity status regression id={} oldStatus={} newStatus={} oldHash={} newHash={}",
                        activity.id(),
                        existing.status_str(),
                        activity.status_str(),
                        existing.logical_hash(),
                        activity.logical_hash()
                    ),
                );
                return StoreOutcome::KeptNonPending;
            }
            if existing.is_call_contract() || activity.is_call_contract() {
                return StoreOutcome::KeptCallContract;
            }
        }
        self.by_id.insert(activity.id().to_string(), activity);
        StoreOutcome::Stored
    }

    /// Install a first page of history. Returns true when older main ids were
    /// trimmed, which also clears the main end-of-history marker.
    pub fn add_initial_activities(
        &mut self,
        main_activities: &[ActivityRecord],
        by_slug: &HashMap<String, Vec<ActivityRecord>>,
    ) -> bool {
        let all = main_activities
            .iter()
            .chain(by_slug.values().flatten());
        for activity in all {
            self.store_activity(activity.clone());
        }

        let main_ids: Vec<String> = main_activities
            .iter()
            .map(|activity| activity.id().to_string())
            .collect();
        let merge = merge_activity_ids_to_max_time(&main_ids, &self.ids_main, &self.by_id);
        self.ids_main = merge.ids;
        if merge.trimmed {
            self.is_main_history_end_reached = false;
        }

        let mut affected_slugs = Vec::with_capacity(by_slug.len());
        for (slug, activities) in by_slug {
            let ids: Vec<String> = activities
                .iter()
                .map(|activity| activity.id().to_string())
                .collect();
            self.ids_by_slug
                .insert(slug.clone(), merge_sorted_activity_ids(&ids, &[], &self.by_id));
            affected_slugs.push(slug.clone());
        }
        self.refresh_newest_activities(&affected_slugs);

        merge.trimmed
    }

    /// Insert newly created activities into every list they belong to.
    ///
    /// Only for activities newer than the loaded history; inserting old ones
    /// would create gaps in the per-slug timelines. `chain` is required to
    /// track pending activities.
    pub fn add_new_activities(
        &mut self,
        activities: &[ActivityRecord],
        chain: Option<Chain>,
    ) -> Vec<String> {
        if activities.is_empty() {
            return Vec::new();
        }

        let mut new_ids = Vec::with_capacity(activities.len());
        let mut new_ids_by_slug: HashMap<String, Vec<String>> = HashMap::new();
        for activity in activities {
            self.store_activity(activity.clone());
            new_ids.push(activity.id().to_string());
            for slug in activity.slugs() {
                new_ids_by_slug
                    .entry(slug.to_string())
                    .or_default()
                    .push(activity.id().to_string());
            }
        }

        self.ids_main = merge_sorted_activity_ids(&new_ids, &self.ids_main, &self.by_id);

        let mut affected_slugs = Vec::with_capacity(new_ids_by_slug.len());
        for (slug, ids) in new_ids_by_slug {
            let existing = self.ids_by_slug.get(&slug).cloned().unwrap_or_default();
            let merged = merge_sorted_activity_ids(&ids, &existing, &self.by_id);
            self.ids_by_slug.insert(slug.clone(), merged);
            affected_slugs.push(slug);
        }
        self.refresh_newest_activities(&affected_slugs);

        for id in &new_ids {
            let Some(stored) = self.by_id.get(id) else {
                continue;
            };
            if stored.is_local() || is_local_id(id) {
                self.local_activity_ids.insert(id.clone());
            } else if stored.is_pending() {
                if let Some(chain) = chain {
                    self.pending_activity_ids
                        .entry(chain)
                        .or_default()
                        .insert(id.clone());
                }
            } else {
                for pending in self.pending_activity_ids.values_mut() {
                    pending.remove(id);
                }
            }
        }

        new_ids
    }

    /// Remove ids from `by_id` and from every list and set
    pub fn remove_activities(&mut self, delete_ids: &HashSet<String>) {
        if delete_ids.is_empty() {
            return;
        }

        let mut affected_slugs = Vec::new();
        for (slug, ids) in self.ids_by_slug.iter_mut() {
            let before = ids.len();
            ids.retain(|id| !delete_ids.contains(id));
            if ids.len() != before {
                affected_slugs.push(slug.clone());
            }
        }

        self.ids_main.retain(|id| !delete_ids.contains(id));
        self.by_id.retain(|id, _| !delete_ids.contains(id));
        self.local_activity_ids.retain(|id| !delete_ids.contains(id));
        for pending in self.pending_activity_ids.values_mut() {
            pending.retain(|id| !delete_ids.contains(id));
        }

        self.refresh_newest_activities(&affected_slugs);
    }

    /// Merge a page of older history into `ids_main` or one slug list.
    /// Returns the ids that were written.
    pub fn add_history_page(&mut self, activities: &[ActivityRecord], slug: Option<&str>) -> Vec<String> {
        let mut new_ids = Vec::with_capacity(activities.len());
        for activity in activities {
            if self.store_activity(activity.clone()) == StoreOutcome::Stored {
                new_ids.push(activity.id().to_string());
            }
        }

        match slug {
            Some(slug) => {
                let existing = self.ids_by_slug.get(slug).cloned().unwrap_or_default();
                let merged = merge_sorted_activity_ids(&new_ids, &existing, &self.by_id);
                self.ids_by_slug.insert(slug.to_string(), merged);
                self.refresh_newest_activities(&[slug.to_string()]);
            }
            None => {
                self.ids_main = merge_sorted_activity_ids(&new_ids, &self.ids_main, &self.by_id);
            }
        }

        new_ids
    }

    fn refresh_newest_activities(&mut self, slugs: &[String]) {
        for slug in slugs {
            let newest = self
                .ids_by_slug
                .get(slug)
                .and_then(|ids| {
                    ids.iter()
                        .filter_map(|id| self.by_id.get(id))
                        .find(|activity| is_suitable_for_fetching_timestamp(activity))
                })
                .cloned();
            match newest {
                Some(activity) => {
                    self.newest_activities_by_slug.insert(slug.clone(), activity);
                }
                None => {
                    self.newest_activities_by_slug.remove(slug);
                }
            }
        }
    }

    // =========================================================================
    // SELECTORS
    // =========================================================================

    pub fn select_local_activities(&self) -> Vec<ActivityRecord> {
        self.local_activity_ids
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    pub fn select_pending_activities(&self, chain: Chain) -> Vec<ActivityRecord> {
        self.pending_activity_ids
            .get(&chain)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn pending_ids(&self, chain: Chain) -> HashSet<String> {
        self.pending_activity_ids
            .get(&chain)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The newest `count` non-local activities of the main list
    pub fn select_recent_non_local_activities(&self, count: usize) -> Vec<ActivityRecord> {
        self.ids_main
            .iter()
            .filter(|id| !is_local_id(id))
            .filter_map(|id| self.by_id.get(id))
            .filter(|activity| !activity.is_local())
            .take(count)
            .cloned()
            .collect()
    }

    /// Timestamp of the oldest listed activity usable as a pagination cursor
    pub fn last_suitable_timestamp(&self, slug: Option<&str>) -> Option<i64> {
        self.ids_for(slug)
            .iter()
            .rev()
            .filter_map(|id| self.by_id.get(id))
            .find(|activity| is_suitable_for_fetching_timestamp(activity))
            .map(|activity| activity.timestamp())
    }

    pub fn newest_activity_timestamps(&self) -> HashMap<String, i64> {
        self.newest_activities_by_slug
            .iter()
            .map(|(slug, activity)| (slug.clone(), activity.timestamp()))
            .collect()
    }

    /// Describe every broken invariant; empty when the state is consistent
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let mut check_list = |name: &str, ids: &[String]| {
            let mut seen = HashSet::new();
            for id in ids {
                if !self.by_id.contains_key(id) {
                    violations.push(format!("{}: unknown id {}", name, id));
                }
                if !seen.insert(id) {
                    violations.push(format!("{}: duplicate id {}", name, id));
                }
            }
            if !super::ordering::is_sorted_by_activity_order(ids, &self.by_id) {
                violations.push(format!("{}: not sorted", name));
            }
        };

        check_list("idsMain", &self.ids_main);
        for (slug, ids) in &self.ids_by_slug {
            check_list(&format!("idsBySlug[{}]", slug), ids);
        }

        for id in &self.local_activity_ids {
            if !self.by_id.contains_key(id) {
                violations.push(format!("localActivityIds: unknown id {}", id));
            }
        }
        for (chain, ids) in &self.pending_activity_ids {
            for id in ids {
                if !self.by_id.contains_key(id) {
                    violations.push(format!("pendingActivityIds[{}]: unknown id {}", chain, id));
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::fixtures::*;
    use crate::activities::types::ActivityType;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_new_activities_tracks_local_and_pending() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[tx_record(local_tx("l1|local", 300))], None);
        state.add_new_activities(&[tx_record(pending_tx("p1:0", 200))], Some(Chain::Ton));
        state.add_new_activities(&[tx_record(confirmed_tx("c1:0", 100))], None);

        assert_eq!(state.ids_main, ids(&["l1|local", "p1:0", "c1:0"]));
        assert!(state.local_activity_ids.contains("l1|local"));
        assert!(state.pending_ids(Chain::Ton).contains("p1:0"));
        assert_eq!(state.ids_for(Some("toncoin")).len(), 3);
        assert!(state.integrity_violations().is_empty());
    }

    #[test]
    fn test_pending_never_overwrites_final_record() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[tx_record(confirmed_tx("h:0", 100))], None);
        state.add_new_activities(&[tx_record(pending_tx("h:0", 100))], Some(Chain::Ton));

        assert!(state.get("h:0").unwrap().is_confirmed_or_completed());
        assert!(state.pending_ids(Chain::Ton).is_empty());
        assert_eq!(state.ids_main, ids(&["h:0"]));
    }

    #[test]
    fn test_call_contract_is_not_overwritten() {
        let mut state = AccountActivityState::new(ACCOUNT);
        let mut decoded = confirmed_tx("cc:0", 100);
        decoded.activity_type = Some(ActivityType::CallContract);
        decoded.comment = Some("decoded".to_string());
        state.store_activity(tx_record(decoded));

        let generic = confirmed_tx("cc:0", 100);
        assert_eq!(state.store_activity(tx_record(generic)), StoreOutcome::KeptCallContract);
        assert_eq!(
            state.get("cc:0").unwrap().as_transaction().unwrap().comment.as_deref(),
            Some("decoded")
        );
    }

    #[test]
    fn test_remove_activities_clears_every_index() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[tx_record(local_tx("l1|local", 300)), swap("s:0", 250)], None);
        state.add_new_activities(&[tx_record(pending_tx("p1:0", 200))], Some(Chain::Ton));

        let delete: HashSet<String> = ["l1|local", "p1:0", "s:0"].iter().map(|s| s.to_string()).collect();
        state.remove_activities(&delete);

        assert!(state.by_id.is_empty());
        assert!(state.ids_main.is_empty());
        assert!(state.ids_for(Some("usdt")).is_empty());
        assert!(state.local_activity_ids.is_empty());
        assert!(state.pending_ids(Chain::Ton).is_empty());
        assert!(state.integrity_violations().is_empty());
    }

    #[test]
    fn test_newest_activity_skips_local_and_pending() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(
            &[
                tx_record(local_tx("l1|local", 400)),
                tx_record(confirmed_tx("c2:0", 200)),
                tx_record(confirmed_tx("c1:0", 100)),
            ],
            None,
        );
        state.add_new_activities(&[tx_record(pending_tx("p1:0", 300))], Some(Chain::Ton));

        let timestamps = state.newest_activity_timestamps();
        assert_eq!(timestamps.get("toncoin"), Some(&200));
        assert_eq!(state.last_suitable_timestamp(None), Some(100));
    }

    #[test]
    fn test_initial_activities_trim_resets_end_marker() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_initial_activities(
            &[tx_record(confirmed_tx("old:0", 100)), tx_record(confirmed_tx("older:0", 10))],
            &HashMap::new(),
        );
        state.is_main_history_end_reached = true;

        let trimmed = state.add_initial_activities(&[tx_record(confirmed_tx("new:0", 500))], &HashMap::new());
        assert!(trimmed);
        assert!(!state.is_main_history_end_reached);
        assert_eq!(state.ids_main, ids(&["new:0"]));
    }

    #[test]
    fn test_recent_non_local_window() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(
            &[
                tx_record(local_tx("l1|local", 500)),
                tx_record(confirmed_tx("c3:0", 400)),
                tx_record(confirmed_tx("c2:0", 300)),
                tx_record(confirmed_tx("c1:0", 200)),
            ],
            None,
        );
        let recent: Vec<String> = state
            .select_recent_non_local_activities(2)
            .iter()
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(recent, ids(&["c3:0", "c2:0"]));
    }

    #[test]
    fn test_serde_round_trip_with_chain_keys() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[tx_record(pending_tx("p1:0", 200))], Some(Chain::Ton));
        state.set_initial_loaded(Chain::Tron);

        let json = serde_json::to_string(&state).unwrap();
        let back: AccountActivityState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert!(back.is_initial_loaded(Chain::Tron));
    }
}
