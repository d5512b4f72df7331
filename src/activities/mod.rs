//! Activity reconciliation and cache engine
//!
//! Merges confirmed, pending and locally created activities of each wallet
//! account into one deduplicated, ordered history, and projects it for list
//! UIs with identities that survive the local -> pending -> confirmed
//! transitions.
//!
//! ## Components
//!
//! - [`ActivityStore`]: single writer of every account's [`AccountActivityState`]
//! - [`ActivityViewModel`]: date-grouped, stably identified projection
//! - [`PoisoningCache`]: address-poisoning heuristic per account
//! - [`ActivityEventBus`]: change notifications with explicit subscriptions
//!
//! Collaborators are injected as traits: [`ActivityApi`] (network),
//! [`ActivityPersistence`] (storage), [`ActivitySettings`] (user preferences)
//! and [`ActivityMatcher`] (replacement predicate).

pub mod api;
pub mod events;
pub mod matching;
pub mod ordering;
pub mod persistence;
pub mod poisoning;
pub mod settings;
pub mod state;
pub mod store;
pub mod types;
pub mod view_model;

#[cfg(test)]
mod fixtures;

pub use api::{ActivityApi, ActivityUpdate};
pub use events::{ActivityEvent, ActivityEventBus, Subscription};
pub use matching::{get_activity_id_replacements, ActivityMatcher, FingerprintMatcher};
pub use ordering::{compare_activities, merge_activity_ids_to_max_time, merge_sorted_activity_ids};
pub use persistence::{ActivityPersistence, InMemoryPersistence, SqliteActivityPersistence};
pub use poisoning::{shortened_address, PoisoningCache, PoisoningCacheEntry, PoisoningPolicy};
pub use settings::{ActivitySettings, SharedSettings};
pub use state::AccountActivityState;
pub use store::ActivityStore;
pub use types::{
    parse_tx_id, ActivityRecord, ActivityToken, ActivityType, CexMetadata, Chain, NftRef,
    ParsedTxId, SwapActivity, SwapStatus, TransactionActivity, TransactionStatus, TxIdKind,
};
pub use view_model::{
    ActivitySnapshot, ActivityViewModel, ActivityViewModelDelegate, ActivityViewState, Row,
    Section,
};
