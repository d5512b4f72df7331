/// Configuration utilities - loading and saving ActivityConfig
///
/// The store takes its configuration by value, so there is no process-wide
/// config instance here; callers load once and hand the result to
/// `ActivityStore::new`.
use super::schemas::ActivityConfig;
use crate::errors::{ActivityError, ActivityResult};
use crate::logger::{self, LogTag};
use std::path::Path;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/activities.toml";

pub fn load_config() -> ActivityResult<ActivityConfig> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a TOML file. A missing file yields the defaults.
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> ActivityResult<ActivityConfig> {
    let path = path.as_ref();
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(ActivityConfig::default());
    }

    let contents = std::fs::read_to_string(path)?;
    load_config_from_str(&contents).map_err(|e| {
        ActivityError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
    })
}

pub fn load_config_from_str(contents: &str) -> ActivityResult<ActivityConfig> {
    toml::from_str::<ActivityConfig>(contents).map_err(|e| ActivityError::Config(e.to_string()))
}

pub fn save_config_to_path<P: AsRef<Path>>(config: &ActivityConfig, path: P) -> ActivityResult<()> {
    let path = path.as_ref();
    let contents = toml::to_string_pretty(config)
        .map_err(|e| ActivityError::Config(format!("Failed to serialize config: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;

    logger::debug(LogTag::Config, &format!("Saved config to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, ActivityConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("activities.toml");

        let mut cfg = ActivityConfig::default();
        cfg.page_limit = 15;
        cfg.sounds_enabled = false;
        save_config_to_path(&cfg, &path).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        assert_eq!(loaded.page_limit, 15);
        assert!(!loaded.sounds_enabled);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = load_config_from_str("page_limit = \"many\"").unwrap_err();
        assert!(matches!(err, ActivityError::Config(_)));
    }
}
