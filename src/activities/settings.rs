// activities/settings.rs
// User preferences the store and view models read on every pass

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::config::ActivityConfig;

pub trait ActivitySettings: Send + Sync {
    fn hide_tiny_transfers(&self) -> bool;
    /// Slugs exempt from tiny-transfer hiding for this account
    fn always_shown_slugs(&self, account_id: &str) -> HashSet<String>;
    fn sounds_enabled(&self) -> bool;
    fn is_app_unlocked(&self) -> bool;
}

/// In-process settings, seeded from [`ActivityConfig`]
#[derive(Debug)]
pub struct SharedSettings {
    hide_tiny_transfers: RwLock<bool>,
    sounds_enabled: RwLock<bool>,
    app_unlocked: RwLock<bool>,
    always_shown_slugs: RwLock<HashMap<String, HashSet<String>>>,
}

impl SharedSettings {
    pub fn from_config(config: &ActivityConfig) -> Self {
        Self {
            hide_tiny_transfers: RwLock::new(config.hide_tiny_transfers),
            sounds_enabled: RwLock::new(config.sounds_enabled),
            app_unlocked: RwLock::new(true),
            always_shown_slugs: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_hide_tiny_transfers(&self, value: bool) {
        *self.hide_tiny_transfers.write() = value;
    }

    pub fn set_sounds_enabled(&self, value: bool) {
        *self.sounds_enabled.write() = value;
    }

    pub fn set_app_unlocked(&self, value: bool) {
        *self.app_unlocked.write() = value;
    }

    pub fn set_always_shown_slugs(&self, account_id: &str, slugs: HashSet<String>) {
        self.always_shown_slugs
            .write()
            .insert(account_id.to_string(), slugs);
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::from_config(&ActivityConfig::default())
    }
}

impl ActivitySettings for SharedSettings {
    fn hide_tiny_transfers(&self) -> bool {
        *self.hide_tiny_transfers.read()
    }

    fn always_shown_slugs(&self, account_id: &str) -> HashSet<String> {
        self.always_shown_slugs
            .read()
            .get(account_id)
            .cloned()
            .unwrap_or_default()
    }

    fn sounds_enabled(&self) -> bool {
        *self.sounds_enabled.read()
    }

    fn is_app_unlocked(&self) -> bool {
        *self.app_unlocked.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_from_config() {
        let mut config = ActivityConfig::default();
        config.hide_tiny_transfers = true;
        config.sounds_enabled = false;

        let settings = SharedSettings::from_config(&config);
        assert!(settings.hide_tiny_transfers());
        assert!(!settings.sounds_enabled());
        assert!(settings.is_app_unlocked());
    }

    #[test]
    fn test_always_shown_is_per_account() {
        let settings = SharedSettings::default();
        settings.set_always_shown_slugs("acc-1", ["usdt".to_string()].into_iter().collect());

        assert!(settings.always_shown_slugs("acc-1").contains("usdt"));
        assert!(settings.always_shown_slugs("acc-2").is_empty());
    }
}
