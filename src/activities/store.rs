// activities/store.rs
// Activity store: the single writer of every account's activity state.
//
// Mutations are serialized through one async lock. Each mutation works on a
// copy of the account state and swaps it in whole, so readers only ever see
// complete snapshots. Persistence is best effort: failures are logged and
// the in-memory state stays authoritative.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::Mutex;

use super::api::{ActivityApi, ActivityUpdate};
use super::events::{ActivityEvent, ActivityEventBus, Subscription};
use super::matching::{get_activity_id_replacements, ActivityMatcher, FingerprintMatcher};
use super::persistence::ActivityPersistence;
use super::poisoning::PoisoningCache;
use super::settings::ActivitySettings;
use super::state::{AccountActivityState, StoreOutcome};
use super::types::{ActivityRecord, ActivityToken, Chain, TransactionActivity};
use crate::config::ActivityConfig;
use crate::errors::ActivityResult;
use crate::logger::{self, LogTag};

pub struct ActivityStore {
    config: ActivityConfig,
    api: Arc<dyn ActivityApi>,
    persistence: Arc<dyn ActivityPersistence>,
    settings: Arc<dyn ActivitySettings>,
    matcher: Arc<dyn ActivityMatcher>,
    events: ActivityEventBus,
    /// Serializes every mutation
    write_lock: Mutex<()>,
    accounts: RwLock<HashMap<String, Arc<AccountActivityState>>>,
    poisoning_caches: RwLock<HashMap<String, PoisoningCache>>,
    /// Ids already considered for the incoming-transfer signal
    notified_ids: SyncMutex<HashSet<String>>,
}

impl ActivityStore {
    pub fn new(
        config: ActivityConfig,
        api: Arc<dyn ActivityApi>,
        persistence: Arc<dyn ActivityPersistence>,
        settings: Arc<dyn ActivitySettings>,
    ) -> Self {
        let events = ActivityEventBus::new(config.event_channel_warn_threshold);
        let matcher = FingerprintMatcher::new(config.local_match_window_secs.saturating_mul(1000));
        Self {
            config,
            api,
            persistence,
            settings,
            matcher: Arc::new(matcher),
            events,
            write_lock: Mutex::new(()),
            accounts: RwLock::new(HashMap::new()),
            poisoning_caches: RwLock::new(HashMap::new()),
            notified_ids: SyncMutex::new(HashSet::new()),
        }
    }

    /// Replace the default fingerprint matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn ActivityMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    pub fn settings(&self) -> &Arc<dyn ActivitySettings> {
        &self.settings
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Current snapshot; an unknown account yields an empty state
    pub fn get_account_state(&self, account_id: &str) -> Arc<AccountActivityState> {
        match self.accounts.read().get(account_id) {
            Some(state) => state.clone(),
            None => Arc::new(AccountActivityState::new(account_id)),
        }
    }

    pub fn get_activity(&self, account_id: &str, activity_id: &str) -> Option<ActivityRecord> {
        self.accounts
            .read()
            .get(account_id)
            .and_then(|state| state.get(activity_id).cloned())
    }

    pub fn get_poisoning_cache(&self, account_id: &str) -> PoisoningCache {
        self.poisoning_caches
            .read()
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| PoisoningCache::new(self.config.poisoning_policy))
    }

    /// Account state and poisoning cache as committed together
    pub fn snapshot(&self, account_id: &str) -> (Arc<AccountActivityState>, PoisoningCache) {
        let accounts = self.accounts.read();
        let caches = self.poisoning_caches.read();
        let state = match accounts.get(account_id) {
            Some(state) => state.clone(),
            None => Arc::new(AccountActivityState::new(account_id)),
        };
        let cache = caches
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| PoisoningCache::new(self.config.poisoning_policy));
        (state, cache)
    }

    pub fn is_transaction_with_poisoning(&self, account_id: &str, tx: &TransactionActivity) -> bool {
        self.poisoning_caches
            .read()
            .get(account_id)
            .map(|cache| cache.is_transaction_with_poisoning(tx))
            .unwrap_or(false)
    }

    /// Timestamp of the newest final activity per slug, for the pollers
    pub fn get_newest_activity_timestamps(&self, account_id: &str) -> HashMap<String, i64> {
        self.get_account_state(account_id).newest_activity_timestamps()
    }

    // =========================================================================
    // COMMIT HELPERS
    // =========================================================================

    fn load_mutable(&self, account_id: &str) -> AccountActivityState {
        (*self.get_account_state(account_id)).clone()
    }

    fn commit(&self, state: AccountActivityState) {
        self.commit_with_poisoning(state, None);
    }

    /// Persist, then swap the state and (when given) the poisoning cache
    /// under both write locks, so readers never see one without the other.
    fn commit_with_poisoning(&self, state: AccountActivityState, cache: Option<PoisoningCache>) {
        if let Err(e) = self.persistence.upsert(&state) {
            logger::error(
                LogTag::Database,
                &format!("Failed to save activities of {}: {}", state.account_id, e),
            );
        }
        let account_id = state.account_id.clone();
        let mut accounts = self.accounts.write();
        let mut caches = self.poisoning_caches.write();
        if let Some(cache) = cache {
            caches.insert(account_id.clone(), cache);
        }
        accounts.insert(account_id, Arc::new(state));
    }

    /// Current cache of the account extended with `activities`, not yet installed
    fn extended_poisoning_cache<'a, I>(&self, account_id: &str, activities: I) -> PoisoningCache
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let mut cache = self.get_poisoning_cache(account_id);
        cache.update(activities);
        cache
    }

    fn publish_changed(
        &self,
        account_id: &str,
        updated_ids: Vec<String>,
        replaced_ids: HashMap<String, String>,
    ) {
        self.events.publish(ActivityEvent::ActivitiesChanged {
            account_id: account_id.to_string(),
            updated_ids,
            replaced_ids,
        });
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    pub async fn handle_update(&self, update: ActivityUpdate) {
        match update {
            ActivityUpdate::InitialActivities {
                account_id,
                main_activities,
                by_slug,
                chain,
            } => {
                self.apply_initial_activities(&account_id, main_activities, by_slug, chain)
                    .await
            }
            ActivityUpdate::NewActivities {
                account_id,
                activities,
                pending_activities,
                chain,
            } => {
                self.apply_new_activities(&account_id, activities, pending_activities, chain)
                    .await
            }
            ActivityUpdate::NewLocalActivities {
                account_id,
                activities,
            } => self.apply_new_local_activities(&account_id, activities).await,
        }
    }

    /// Install the first page of history delivered by a chain poller
    pub async fn apply_initial_activities(
        &self,
        account_id: &str,
        main_activities: Vec<ActivityRecord>,
        by_slug: HashMap<String, Vec<ActivityRecord>>,
        chain: Option<Chain>,
    ) {
        let _guard = self.write_lock.lock().await;
        logger::info(
            LogTag::Store,
            &format!(
                "Initial activities for {} (chain={}, main={}, slugs={})",
                account_id,
                chain.map(|c| c.as_str()).unwrap_or("-"),
                main_activities.len(),
                by_slug.len()
            ),
        );

        let mut state = self.load_mutable(account_id);
        let trimmed = state.add_initial_activities(&main_activities, &by_slug);
        if trimmed {
            logger::debug(
                LogTag::Store,
                &format!("Trimmed older main ids of {} to keep history contiguous", account_id),
            );
        }
        let cache = self.extended_poisoning_cache(
            account_id,
            main_activities.iter().chain(by_slug.values().flatten()),
        );
        if let Some(chain) = chain {
            state.set_initial_loaded(chain);
        }

        self.commit_with_poisoning(state, Some(cache));
        self.publish_changed(account_id, Vec::new(), HashMap::new());
    }

    /// Merge a poller batch of confirmed (and optionally pending) activities
    pub async fn apply_new_activities(
        &self,
        account_id: &str,
        confirmed: Vec<ActivityRecord>,
        pending: Option<Vec<ActivityRecord>>,
        chain: Option<Chain>,
    ) {
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_mutable(account_id);
        logger::info(
            LogTag::Store,
            &format!(
                "New activities for {} (mainIds={}, confirmed={}, pending={})",
                account_id,
                state.ids_main.len(),
                confirmed.len(),
                pending.as_ref().map(|p| p.len()).unwrap_or(0)
            ),
        );

        let pending = pending.map(|pending| filter_stale_pending(&state, pending));
        let all_new: Vec<ActivityRecord> = pending
            .iter()
            .flatten()
            .chain(confirmed.iter())
            .cloned()
            .collect();

        let mut prev = state.select_local_activities();
        if let Some(chain) = chain {
            prev.extend(state.select_pending_activities(chain));
        }

        let replaced_ids = get_activity_id_replacements(&prev, &all_new, self.matcher.as_ref());
        if !replaced_ids.is_empty() && logger::is_debug_enabled(&LogTag::Store) {
            logger::debug(
                LogTag::Store,
                &format!("Replacements for {}: {:?}", account_id, replaced_ids),
            );
        }
        let pending = pending.map(|pending| adjust_pending_with_trusted_status(pending, &replaced_ids, &prev));

        let replaced_set: HashSet<String> = replaced_ids.keys().cloned().collect();
        state.remove_activities(&replaced_set);

        let mut updated_ids = Vec::new();
        match (chain, &pending) {
            (Some(chain), Some(pending)) => {
                let old_pending = state.pending_ids(chain);
                state.remove_activities(&old_pending);
                updated_ids.extend(state.add_new_activities(pending, Some(chain)));
            }
            (None, Some(pending)) if !pending.is_empty() => {
                logger::warning(
                    LogTag::Store,
                    &format!(
                        "Ignoring {} pending activities for {} without a chain",
                        pending.len(),
                        account_id
                    ),
                );
            }
            _ => {}
        }

        updated_ids.extend(state.add_new_activities(&confirmed, None));
        let cache = self.extended_poisoning_cache(account_id, confirmed.iter());

        if let Some(chain) = chain {
            state.set_initial_loaded(chain);
        }

        let mut seen = HashSet::new();
        updated_ids.retain(|id| seen.insert(id.clone()));

        let main_count = state.ids_main.len();
        self.commit_with_poisoning(state, Some(cache));

        // Signals read the cache installed above
        let mut signaled = Vec::new();
        if let Some(pending) = &pending {
            signaled.extend(self.collect_incoming_signals(account_id, pending));
        }
        signaled.extend(self.collect_incoming_signals(account_id, &confirmed));

        self.publish_changed(account_id, updated_ids, replaced_ids);
        for activity_id in signaled {
            self.events.publish(ActivityEvent::IncomingTransaction {
                account_id: account_id.to_string(),
                activity_id,
            });
        }

        logger::debug(
            LogTag::Store,
            &format!("New activities for {} applied (mainIds={})", account_id, main_count),
        );
    }

    /// Insert optimistic activities created on this device
    pub async fn apply_new_local_activities(&self, account_id: &str, local: Vec<ActivityRecord>) {
        let _guard = self.write_lock.lock().await;
        logger::info(
            LogTag::Store,
            &format!("New local activities for {} ({})", account_id, local.len()),
        );

        let mut state = self.load_mutable(account_id);
        let lookback = local.len() + self.config.local_match_lookback;
        let chain_activities = state.select_recent_non_local_activities(lookback);

        let local = hide_outdated_local_activities(local, &chain_activities, self.matcher.as_ref());
        let replaced_ids = get_activity_id_replacements(&local, &chain_activities, self.matcher.as_ref());

        let mut upgraded_ids = Vec::new();
        for activity in &local {
            if !activity.is_pending_trusted() {
                continue;
            }
            let Some(chain_id) = replaced_ids.get(activity.id()) else {
                continue;
            };
            let upgraded = state
                .get(chain_id)
                .and_then(|chain_activity| chain_activity.to_pending_trusted());
            if let Some(upgraded) = upgraded {
                if state.store_activity(upgraded) == StoreOutcome::Stored {
                    upgraded_ids.push(chain_id.clone());
                }
            }
        }

        let mut updated_ids = state.add_new_activities(&local, None);
        for id in upgraded_ids {
            if !updated_ids.contains(&id) {
                updated_ids.push(id);
            }
        }

        self.commit(state);
        self.publish_changed(account_id, updated_ids, HashMap::new());
    }

    /// Drop ids from every list and set of the account
    pub async fn remove_activities(&self, account_id: &str, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_mutable(account_id);
        let delete: HashSet<String> = ids.iter().cloned().collect();
        state.remove_activities(&delete);
        self.commit(state);
        self.publish_changed(account_id, Vec::new(), HashMap::new());
    }

    // =========================================================================
    // PAGINATION
    // =========================================================================

    pub async fn fetch_all_activities(
        &self,
        account_id: &str,
        limit: usize,
        should_load_with_budget: bool,
    ) -> ActivityResult<()> {
        self.fetch_history(account_id, limit, None, should_load_with_budget)
            .await
    }

    pub async fn fetch_token_activities(
        &self,
        account_id: &str,
        limit: usize,
        token: &ActivityToken,
        should_load_with_budget: bool,
    ) -> ActivityResult<()> {
        self.fetch_history(account_id, limit, Some(&token.slug), should_load_with_budget)
            .await
    }

    /// One page, and with a budget a second one after yielding
    async fn fetch_history(
        &self,
        account_id: &str,
        limit: usize,
        slug: Option<&str>,
        should_load_with_budget: bool,
    ) -> ActivityResult<()> {
        let mut load_with_budget = should_load_with_budget;
        loop {
            self.fetch_history_page(account_id, limit, slug).await?;
            if !load_with_budget {
                return Ok(());
            }
            load_with_budget = false;
            tokio::task::yield_now().await;
        }
    }

    async fn fetch_history_page(
        &self,
        account_id: &str,
        limit: usize,
        slug: Option<&str>,
    ) -> ActivityResult<()> {
        let snapshot = self.get_account_state(account_id);
        if snapshot.is_history_end_reached(slug) {
            logger::debug(
                LogTag::Store,
                &format!("History of {} ({}) already complete", account_id, slug.unwrap_or("main")),
            );
            return Ok(());
        }

        let mut to_timestamp = snapshot.last_suitable_timestamp(slug);
        drop(snapshot);

        let hide_tiny = self.settings.hide_tiny_transfers();
        let mut poisoning = self.get_poisoning_cache(account_id);
        let mut fetched: Vec<ActivityRecord> = Vec::new();
        let mut end_reached = false;

        loop {
            let page = self
                .api
                .fetch_past_activities(account_id, limit, slug, to_timestamp)
                .await?;
            if page.is_empty() {
                end_reached = true;
                break;
            }

            poisoning.update(page.iter());
            let visible = page
                .iter()
                .filter(|activity| match activity {
                    ActivityRecord::Transaction(tx) => {
                        if hide_tiny && activity.is_tiny_or_scam(self.config.tiny_transfer_max_cost_usd) {
                            return false;
                        }
                        !poisoning.is_transaction_with_poisoning(tx)
                    }
                    ActivityRecord::Swap(_) => true,
                })
                .count();

            to_timestamp = page.iter().map(|activity| activity.timestamp()).min();
            fetched.extend(page);
            if visible >= 1 && fetched.len() >= limit {
                break;
            }
        }

        // Other updates may have landed while the network was busy
        let _guard = self.write_lock.lock().await;
        let mut state = self.load_mutable(account_id);
        let new_ids = state.add_history_page(&fetched, slug);
        if end_reached {
            state.set_history_end_reached(slug, true);
        }
        let cache = self.extended_poisoning_cache(account_id, fetched.iter());
        self.commit_with_poisoning(state, Some(cache));

        logger::info(
            LogTag::Store,
            &format!(
                "Fetched {} older activities for {} ({}), {} new ids{}",
                fetched.len(),
                account_id,
                slug.unwrap_or("main"),
                new_ids.len(),
                if end_reached { ", end of history" } else { "" }
            ),
        );
        self.publish_changed(account_id, Vec::new(), HashMap::new());
        Ok(())
    }

    /// Fetch the detailed form of an activity and store it under the same id
    pub async fn fetch_activity_details(
        &self,
        account_id: &str,
        activity: &ActivityRecord,
    ) -> ActivityResult<ActivityRecord> {
        let detailed = self.api.fetch_activity_details(account_id, activity).await?;

        let _guard = self.write_lock.lock().await;
        let mut state = self.load_mutable(account_id);
        if state.store_activity(detailed.clone()) == StoreOutcome::Stored {
            self.commit(state);
        }
        self.publish_changed(account_id, vec![detailed.id().to_string()], HashMap::new());
        Ok(detailed)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Install every persisted account state. Returns the number of accounts.
    pub async fn load_from_persistence(&self) -> ActivityResult<usize> {
        let _guard = self.write_lock.lock().await;
        let states = self.persistence.read_all()?;
        logger::info(
            LogTag::Store,
            &format!("Loaded activity state of {} accounts", states.len()),
        );

        let mut changed = Vec::new();
        for state in states {
            let account_id = state.account_id.clone();
            let unchanged = self
                .accounts
                .read()
                .get(&account_id)
                .map(|current| **current == state)
                .unwrap_or(false);
            if unchanged {
                continue;
            }

            let mut cache = PoisoningCache::new(self.config.poisoning_policy);
            cache.update(state.by_id.values());
            let mut accounts = self.accounts.write();
            self.poisoning_caches.write().insert(account_id.clone(), cache);
            accounts.insert(account_id.clone(), Arc::new(state));
            drop(accounts);
            changed.push(account_id);
        }

        let count = changed.len();
        for account_id in changed {
            self.publish_changed(&account_id, Vec::new(), HashMap::new());
        }
        Ok(count)
    }

    /// Forget an account entirely (wallet removed)
    pub async fn remove_account(&self, account_id: &str) {
        let _guard = self.write_lock.lock().await;
        {
            let mut accounts = self.accounts.write();
            accounts.remove(account_id);
            self.poisoning_caches.write().remove(account_id);
        }
        if let Err(e) = self.persistence.delete(account_id) {
            logger::error(
                LogTag::Database,
                &format!("Failed to delete activities of {}: {}", account_id, e),
            );
        }
        logger::info(LogTag::Store, &format!("Removed activities of {}", account_id));
        self.publish_changed(account_id, Vec::new(), HashMap::new());
    }

    /// Clear every account, in memory and on disk
    pub async fn clean(&self) {
        let _guard = self.write_lock.lock().await;
        let account_ids: Vec<String> = self.accounts.read().keys().cloned().collect();
        {
            let mut accounts = self.accounts.write();
            accounts.clear();
            self.poisoning_caches.write().clear();
        }
        if let Err(e) = self.persistence.delete_all() {
            logger::error(LogTag::Database, &format!("Failed to clean activities: {}", e));
        }
        logger::info(
            LogTag::Store,
            &format!("Cleaned activities of {} accounts", account_ids.len()),
        );
        for account_id in account_ids {
            self.publish_changed(&account_id, Vec::new(), HashMap::new());
        }
    }

    /// Tell view models to re-derive their projection
    pub fn notify_settings_changed(&self) {
        self.events.publish(ActivityEvent::SettingsChanged);
    }

    // =========================================================================
    // INCOMING SIGNAL
    // =========================================================================

    /// Ids of fresh confirmed incoming transfers the user should hear about.
    /// Every confirmed id passed in is remembered, signaled or not.
    fn collect_incoming_signals(&self, account_id: &str, activities: &[ActivityRecord]) -> Vec<String> {
        let now_ms = Utc::now().timestamp_millis();
        let max_age_ms = self.config.incoming_sound_max_age_secs * 1000;
        let hide_tiny = self.settings.hide_tiny_transfers();
        let mut notified = self.notified_ids.lock();
        let mut signaled = Vec::new();

        for activity in activities {
            if !activity.is_confirmed_or_completed() {
                continue;
            }
            if let ActivityRecord::Transaction(tx) = activity {
                let should_signal = tx.is_incoming
                    && now_ms - activity.timestamp() < max_age_ms
                    && !(hide_tiny && activity.is_tiny_or_scam(self.config.tiny_transfer_max_cost_usd))
                    && !self.is_transaction_with_poisoning(account_id, tx)
                    && self.settings.sounds_enabled()
                    && self.settings.is_app_unlocked()
                    && !notified.contains(activity.id());
                if should_signal {
                    logger::info(
                        LogTag::Store,
                        &format!("Incoming transaction {} for {}", activity.id(), account_id),
                    );
                    signaled.push(activity.id().to_string());
                }
            }
            notified.insert(activity.id().to_string());
        }

        signaled
    }
}

// =============================================================================
// MERGE POLICIES
// =============================================================================

/// Drop pending activities whose final form is already stored
fn filter_stale_pending(state: &AccountActivityState, pending: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
    if pending.is_empty() || state.by_id.is_empty() {
        return pending;
    }

    let mut non_pending_ids = HashSet::new();
    let mut non_pending_hashes = HashSet::new();
    for (id, activity) in &state.by_id {
        if !activity.is_non_pending() {
            continue;
        }
        non_pending_ids.insert(id.as_str());
        non_pending_hashes.insert(activity.logical_hash());
    }

    pending
        .into_iter()
        .filter(|activity| {
            if activity.is_confirmed_or_completed() {
                return true;
            }
            if non_pending_ids.contains(activity.id()) {
                logger::error(
                    LogTag::Store,
                    &format!(
                        "pending activity filtered due to non-pending id match id={} status={} hash={}",
                        activity.id(),
                        activity.status_str(),
                        activity.logical_hash()
                    ),
                );
                return false;
            }
            let hash = activity.logical_hash();
            if non_pending_hashes.contains(&hash) {
                logger::error(
                    LogTag::Store,
                    &format!(
                        "pending activity filtered due to non-pending hash match id={} status={} hash={}",
                        activity.id(),
                        activity.status_str(),
                        hash
                    ),
                );
                return false;
            }
            true
        })
        .collect()
}

/// A pending activity replacing a trusted local one inherits `pendingTrusted`
fn adjust_pending_with_trusted_status(
    pending: Vec<ActivityRecord>,
    replaced_ids: &HashMap<String, String>,
    prev: &[ActivityRecord],
) -> Vec<ActivityRecord> {
    if pending.is_empty() || replaced_ids.is_empty() || prev.is_empty() {
        return pending;
    }

    let old_by_new: HashMap<&str, &str> = replaced_ids
        .iter()
        .map(|(old, new)| (new.as_str(), old.as_str()))
        .collect();
    let prev_by_id: HashMap<&str, &ActivityRecord> =
        prev.iter().map(|activity| (activity.id(), activity)).collect();

    pending
        .into_iter()
        .map(|activity| {
            let inherits_trust = old_by_new
                .get(activity.id())
                .and_then(|old_id| prev_by_id.get(old_id))
                .map(|old| old.is_pending_trusted())
                .unwrap_or(false);
            if !inherits_trust {
                return activity;
            }
            activity.to_pending_trusted().unwrap_or(activity)
        })
        .collect()
}

/// Hide local activities whose on-chain counterpart already arrived
fn hide_outdated_local_activities(
    local: Vec<ActivityRecord>,
    chain_activities: &[ActivityRecord],
    matcher: &dyn ActivityMatcher,
) -> Vec<ActivityRecord> {
    local
        .into_iter()
        .map(|mut activity| {
            if !activity.should_hide()
                && chain_activities
                    .iter()
                    .any(|chain_activity| matcher.is_same_activity(&activity, chain_activity))
            {
                activity.set_should_hide(true);
            }
            activity
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::fixtures::*;
    use crate::activities::types::{SwapStatus, TransactionStatus};

    #[test]
    fn test_filter_stale_pending_by_hash() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[tx_record(confirmed_tx("h1:5", 100))], None);

        let kept = filter_stale_pending(
            &state,
            vec![
                tx_record(pending_tx("h1:0", 100)),
                tx_record(pending_tx("h2:0", 100)),
                tx_record(confirmed_tx("h1:9", 100)),
            ],
        );
        let ids: Vec<&str> = kept.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["h2:0", "h1:9"]);
    }

    #[test]
    fn test_trusted_status_is_inherited() {
        let mut local = local_tx("l1|local", 100);
        local.status = TransactionStatus::PendingTrusted;
        let prev = vec![tx_record(local)];
        let replaced: HashMap<String, String> =
            [("l1|local".to_string(), "h1:0".to_string())].into_iter().collect();

        let adjusted = adjust_pending_with_trusted_status(
            vec![tx_record(pending_tx("h1:0", 100)), tx_record(pending_tx("h2:0", 100))],
            &replaced,
            &prev,
        );
        assert!(adjusted[0].is_pending_trusted());
        assert!(!adjusted[1].is_pending_trusted());
    }

    #[test]
    fn test_hide_outdated_local() {
        let chain = vec![tx_record(confirmed_tx("h1:0", 100))];
        let local = vec![tx_record(local_tx("l1|local", 100)), {
            let mut other = local_tx("l2|local", 100);
            other.amount = -7;
            tx_record(other)
        }];

        let result = hide_outdated_local_activities(local, &chain, &FingerprintMatcher::default());
        assert!(result[0].should_hide());
        assert!(!result[1].should_hide());
    }

    #[test]
    fn test_swap_statuses_in_pending_filter() {
        let mut state = AccountActivityState::new(ACCOUNT);
        state.add_new_activities(&[swap("sw:1", 100)], None);

        let pending_swap = match swap("sw:1", 100) {
            ActivityRecord::Swap(mut swap) => {
                swap.status = SwapStatus::Pending;
                ActivityRecord::Swap(swap)
            }
            other => other,
        };
        assert!(filter_stale_pending(&state, vec![pending_swap]).is_empty());
    }
}
