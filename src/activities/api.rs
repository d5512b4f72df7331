// activities/api.rs
// Network-side collaborators: the history fetcher and the update shapes the
// poller pushes into the store.

use std::collections::HashMap;

use async_trait::async_trait;

use super::types::{ActivityRecord, Chain};
use crate::errors::ActivityResult;

/// Remote activity source.
///
/// Timeouts and retries are the implementation's concern; the store only
/// propagates errors to its caller.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    /// Up to `limit` activities older than `to_timestamp`, newest first.
    /// An empty page means the history is exhausted.
    async fn fetch_past_activities(
        &self,
        account_id: &str,
        limit: usize,
        token_slug: Option<&str>,
        to_timestamp: Option<i64>,
    ) -> ActivityResult<Vec<ActivityRecord>>;

    async fn fetch_activity_details(
        &self,
        account_id: &str,
        activity: &ActivityRecord,
    ) -> ActivityResult<ActivityRecord>;
}

/// Updates pushed by the chain pollers
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityUpdate {
    InitialActivities {
        account_id: String,
        main_activities: Vec<ActivityRecord>,
        by_slug: HashMap<String, Vec<ActivityRecord>>,
        chain: Option<Chain>,
    },
    NewActivities {
        account_id: String,
        activities: Vec<ActivityRecord>,
        /// None when the poller did not report pending state
        pending_activities: Option<Vec<ActivityRecord>>,
        chain: Option<Chain>,
    },
    NewLocalActivities {
        account_id: String,
        activities: Vec<ActivityRecord>,
    },
}

impl ActivityUpdate {
    pub fn account_id(&self) -> &str {
        match self {
            ActivityUpdate::InitialActivities { account_id, .. } => account_id,
            ActivityUpdate::NewActivities { account_id, .. } => account_id,
            ActivityUpdate::NewLocalActivities { account_id, .. } => account_id,
        }
    }
}
