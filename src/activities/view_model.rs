// activities/view_model.rs
// Read-side projection of one account (or one token page) for list UIs.
//
// The view model keeps a stable id for every row. When the store replaces a
// local or pending id with its confirmed successor, the row keeps the id it
// was first shown with, so list diffing sees an update instead of a
// delete + insert.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::events::{ActivityEvent, Subscription};
use super::poisoning::PoisoningCache;
use super::state::AccountActivityState;
use super::store::ActivityStore;
use super::types::{ActivityRecord, ActivityToken};
use crate::logger::{self, LogTag};

pub trait ActivityViewModelDelegate: Send + Sync {
    fn activity_view_model_changed(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    HeaderPlaceholder,
    FirstRow,
    Transactions { account_id: String, date: NaiveDate },
    EmptyPlaceholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Row {
    HeaderPlaceholder,
    FirstRow,
    Transaction { account_id: String, stable_id: String },
    LoadingMore,
    EmptyPlaceholder,
}

/// Sections with their rows, in display order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivitySnapshot {
    pub sections: Vec<(Section, Vec<Row>)>,
    /// Rows whose content changed without a change of identity
    pub reconfigured_stable_ids: Vec<String>,
}

impl ActivitySnapshot {
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.sections.iter().flat_map(|(_, rows)| rows.iter())
    }

    pub fn transaction_stable_ids(&self) -> Vec<String> {
        self.rows()
            .filter_map(|row| match row {
                Row::Transaction { stable_id, .. } => Some(stable_id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_row(&self, row: &Row) -> bool {
        self.rows().any(|candidate| candidate == row)
    }
}

/// Everything one projection pass produced
#[derive(Debug, Clone, Default)]
pub struct ActivityViewState {
    pub account_state: Arc<AccountActivityState>,
    /// stable id -> current id
    pub aliases: HashMap<String, String>,
    /// Stable ids grouped by local calendar day, newest day first
    pub ids_by_date: Vec<(NaiveDate, Vec<String>)>,
    pub is_end_reached: bool,
    pub is_empty: bool,
    pub snapshot: ActivitySnapshot,
}

impl ActivityViewState {
    pub fn activity(&self, stable_id: &str) -> Option<&ActivityRecord> {
        let current_id = self
            .aliases
            .get(stable_id)
            .map(String::as_str)
            .unwrap_or(stable_id);
        self.account_state.get(current_id)
    }
}

// =============================================================================
// VIEW MODEL
// =============================================================================

pub struct ActivityViewModel {
    inner: Arc<ViewModelInner>,
    event_loop: JoinHandle<()>,
}

struct ViewModelInner {
    account_id: String,
    token: Option<ActivityToken>,
    store: Arc<ActivityStore>,
    /// stable id -> current id; the lock also serializes projection passes
    aliases: Mutex<HashMap<String, String>>,
    view: RwLock<Arc<ActivityViewState>>,
    delegate: RwLock<Option<Arc<dyn ActivityViewModelDelegate>>>,
    load_more_task: SyncMutex<Option<JoinHandle<()>>>,
}

impl ActivityViewModel {
    /// The first projection is computed before this returns. The delegate is
    /// only told about changes after that.
    pub async fn new(
        store: Arc<ActivityStore>,
        account_id: &str,
        token: Option<ActivityToken>,
        delegate: Arc<dyn ActivityViewModelDelegate>,
    ) -> Self {
        let subscription = store.subscribe();
        let inner = Arc::new(ViewModelInner {
            account_id: account_id.to_string(),
            token,
            store,
            aliases: Mutex::new(HashMap::new()),
            view: RwLock::new(Arc::new(ActivityViewState::default())),
            delegate: RwLock::new(None),
            load_more_task: SyncMutex::new(None),
        });

        inner.get_state(&[], &HashMap::new()).await;
        let event_loop = tokio::spawn(run_event_loop(inner.clone(), subscription));
        *inner.delegate.write() = Some(delegate);

        Self { inner, event_loop }
    }

    pub fn account_id(&self) -> &str {
        &self.inner.account_id
    }

    pub fn token(&self) -> Option<&ActivityToken> {
        self.inner.token.as_ref()
    }

    /// Latest projection
    pub fn state(&self) -> Arc<ActivityViewState> {
        self.inner.view.read().clone()
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        self.state().snapshot.clone()
    }

    pub fn is_end_reached(&self) -> bool {
        self.state().is_end_reached
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty
    }

    /// Resolve a row's stable id to the record it currently shows
    pub fn activity(&self, stable_id: &str) -> Option<ActivityRecord> {
        self.state().activity(stable_id).cloned()
    }

    /// Re-derive the projection without a store change
    pub async fn refresh(&self) {
        self.inner.get_state(&[], &HashMap::new()).await;
    }

    /// Start loading an older page unless one is already in flight.
    /// Returns whether a new load was started.
    pub fn request_more_if_needed(&self) -> bool {
        let mut task = self.inner.load_more_task.lock();
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                return false;
            }
        }

        let inner = self.inner.clone();
        *task = Some(tokio::spawn(async move {
            inner.load_more().await;
        }));
        true
    }

    pub fn is_loading_more(&self) -> bool {
        self.inner
            .load_more_task
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ActivityViewModel {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

async fn run_event_loop(inner: Arc<ViewModelInner>, mut subscription: Subscription) {
    while let Some(event) = subscription.recv().await {
        match event {
            ActivityEvent::ActivitiesChanged {
                account_id,
                updated_ids,
                replaced_ids,
            } if account_id == inner.account_id => {
                inner.get_state(&updated_ids, &replaced_ids).await;
            }
            ActivityEvent::SettingsChanged => {
                inner.get_state(&[], &HashMap::new()).await;
            }
            _ => {}
        }
    }
}

impl ViewModelInner {
    fn slug(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.slug.as_str())
    }

    async fn load_more(&self) {
        let limit = self.store.config().page_limit;
        let result = match &self.token {
            Some(token) => {
                self.store
                    .fetch_token_activities(&self.account_id, limit, token, true)
                    .await
            }
            None => {
                self.store
                    .fetch_all_activities(&self.account_id, limit, true)
                    .await
            }
        };
        if let Err(e) = result {
            logger::error(
                LogTag::ViewModel,
                &format!("requestMoreIfNeeded failed for {}: {}", self.account_id, e),
            );
        }
        *self.load_more_task.lock() = None;
    }

    fn is_visible(&self, activity: &ActivityRecord, state_ctx: &VisibilityContext) -> bool {
        if activity.should_hide() {
            return false;
        }
        let ActivityRecord::Transaction(tx) = activity else {
            return true;
        };
        if tx.is_incoming && state_ctx.poisoning.is_transaction_with_poisoning(tx) {
            return false;
        }
        if !state_ctx.hide_tiny_transfers {
            return true;
        }
        // zero-priced tokens keep their own page
        if self.token.as_ref().and_then(|token| token.price_usd) == Some(0.0) {
            return true;
        }
        if !activity.is_tiny_or_scam(state_ctx.tiny_max_cost_usd) {
            return true;
        }
        state_ctx.always_shown_slugs.contains(activity.slug())
    }

    async fn get_state(&self, updated_ids: &[String], replaced_ids: &HashMap<String, String>) {
        let mut aliases = self.aliases.lock().await;

        let account_state = self.store.get_account_state(&self.account_id);
        let settings = self.store.settings();
        let ctx = VisibilityContext {
            poisoning: self.store.get_poisoning_cache(&self.account_id),
            hide_tiny_transfers: settings.hide_tiny_transfers(),
            always_shown_slugs: settings.always_shown_slugs(&self.account_id),
            tiny_max_cost_usd: self.store.config().tiny_transfer_max_cost_usd,
        };

        let ids: Vec<String> = account_state
            .ids_for(self.slug())
            .iter()
            .filter(|id| {
                account_state
                    .get(id)
                    .map(|activity| self.is_visible(activity, &ctx))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let stable_by_current = update_activity_id_aliases(&mut aliases, replaced_ids, &ids);
        let stable_id_of = |id: &String| stable_by_current.get(id).cloned().unwrap_or_else(|| id.clone());

        let mut ids_by_date: Vec<(NaiveDate, Vec<String>)> = Vec::new();
        let mut date_index: HashMap<NaiveDate, usize> = HashMap::new();
        for id in &ids {
            let Some(activity) = account_state.get(id) else {
                continue;
            };
            let date = activity.timestamp_datetime().with_timezone(&Local).date_naive();
            let index = *date_index.entry(date).or_insert_with(|| {
                ids_by_date.push((date, Vec::new()));
                ids_by_date.len() - 1
            });
            ids_by_date[index].1.push(stable_id_of(id));
        }

        let mut updated_stable: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for id in updated_ids.iter().chain(replaced_ids.values()) {
            let stable = stable_id_of(id);
            if seen.insert(stable.clone()) {
                updated_stable.push(stable);
            }
        }

        let is_end_reached = account_state.is_history_end_reached(self.slug());
        let snapshot = make_snapshot(
            &self.account_id,
            &ids_by_date,
            self.token.is_some(),
            is_end_reached,
            &updated_stable,
        );

        logger::info(
            LogTag::ViewModel,
            &format!(
                "getState {} {}: dates={} ids={}",
                self.account_id,
                self.slug().unwrap_or("main"),
                ids_by_date.len(),
                ids.len()
            ),
        );

        let view = ActivityViewState {
            account_state,
            aliases: aliases.clone(),
            is_empty: is_end_reached && ids_by_date.is_empty(),
            ids_by_date,
            is_end_reached,
            snapshot,
        };
        *self.view.write() = Arc::new(view);

        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.activity_view_model_changed();
        }
    }
}

struct VisibilityContext {
    poisoning: PoisoningCache,
    hide_tiny_transfers: bool,
    always_shown_slugs: HashSet<String>,
    tiny_max_cost_usd: f64,
}

// =============================================================================
// PROJECTION HELPERS
// =============================================================================

/// Fold replacements into the alias table and drop aliases whose current id
/// is no longer listed. Returns current id -> stable id.
pub fn update_activity_id_aliases(
    aliases: &mut HashMap<String, String>,
    replaced_ids: &HashMap<String, String>,
    next_ids: &[String],
) -> HashMap<String, String> {
    for (old_id, new_id) in replaced_ids {
        let existing_stable = aliases
            .iter()
            .find(|(_, current)| *current == old_id)
            .map(|(stable, _)| stable.clone());
        let stable_id = existing_stable.unwrap_or_else(|| old_id.clone());

        aliases.retain(|stable, current| current != new_id || *stable == stable_id);
        aliases.insert(stable_id, new_id.clone());
    }

    if !aliases.is_empty() {
        let next: HashSet<&str> = next_ids.iter().map(String::as_str).collect();
        aliases.retain(|_, current| next.contains(current.as_str()));
    }

    aliases
        .iter()
        .map(|(stable, current)| (current.clone(), stable.clone()))
        .collect()
}

pub fn make_snapshot(
    account_id: &str,
    ids_by_date: &[(NaiveDate, Vec<String>)],
    show_first_row: bool,
    is_end_reached: bool,
    updated_stable_ids: &[String],
) -> ActivitySnapshot {
    let mut sections = vec![(Section::HeaderPlaceholder, vec![Row::HeaderPlaceholder])];
    if show_first_row {
        sections.push((Section::FirstRow, vec![Row::FirstRow]));
    }

    let mut present = HashSet::new();
    for (date, stable_ids) in ids_by_date {
        let rows = stable_ids
            .iter()
            .map(|stable_id| {
                present.insert(stable_id.as_str());
                Row::Transaction {
                    account_id: account_id.to_string(),
                    stable_id: stable_id.clone(),
                }
            })
            .collect();
        sections.push((
            Section::Transactions {
                account_id: account_id.to_string(),
                date: *date,
            },
            rows,
        ));
    }

    if ids_by_date.is_empty() && is_end_reached {
        sections.push((Section::EmptyPlaceholder, vec![Row::EmptyPlaceholder]));
    } else if !is_end_reached {
        if let Some((_, rows)) = sections.last_mut() {
            rows.push(Row::LoadingMore);
        }
    }

    let reconfigured_stable_ids = updated_stable_ids
        .iter()
        .filter(|id| present.contains(id.as_str()))
        .cloned()
        .collect();

    ActivitySnapshot {
        sections,
        reconfigured_stable_ids,
    }
}
