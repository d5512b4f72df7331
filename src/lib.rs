//! Wallet activity engine
//!
//! Ingests blockchain transaction and swap events for wallet accounts,
//! reconciles them into one consistent history per account and per asset,
//! and serves that history to UI consumers.

pub mod activities;
pub mod config; // Configuration schemas and TOML loading
pub mod errors; // Structured error handling
pub mod logger;

pub use activities::{
    ActivityApi, ActivityEvent, ActivityRecord, ActivityStore, ActivityToken, ActivityUpdate,
    ActivityViewModel, ActivityViewModelDelegate, Chain,
};
pub use config::ActivityConfig;
pub use errors::{ActivityError, ActivityResult};
