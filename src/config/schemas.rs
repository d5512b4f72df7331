/// Configuration schemas - defined once with defaults via config_struct!
use crate::activities::PoisoningPolicy;
use crate::config_struct;

config_struct! {
    /// Activity engine configuration
    pub struct ActivityConfig {
        /// Page size passed to the network collaborator when paginating history
        page_limit: usize = 60,

        /// Extra non-local activities scanned when matching new local activities
        /// (the window is `local_activities.len() + local_match_lookback`)
        local_match_lookback: usize = 20,

        /// A local activity only matches chain records that are at most this
        /// much older than it; anything earlier is a separate transfer
        local_match_window_secs: i64 = 300,

        /// Incoming transactions older than this never trigger the sound signal
        incoming_sound_max_age_secs: i64 = 60,

        // Initial values for SharedSettings
        hide_tiny_transfers: bool = false,
        sounds_enabled: bool = true,

        /// Transfers with a known USD value below this are "tiny"
        tiny_transfer_max_cost_usd: f64 = 0.01,

        /// SQLite file used by SqliteActivityPersistence
        database_path: String = "data/activities.db".to_string(),

        /// A subscriber queue longer than this is reported as lagging
        event_channel_warn_threshold: usize = 1024,

        poisoning_policy: PoisoningPolicy = PoisoningPolicy::EarliestSighting,
    }
}
