/// Logger configuration and command-line flag parsing
///
/// Recognized arguments:
/// - `--debug-<tag>`   enable debug output for one tag (e.g. `--debug-store`)
/// - `--verbose`       lower the threshold to Verbose for every tag
/// - `--verbose-<tag>` enable verbose output for one tag
/// - `--quiet`         only errors and warnings
use super::levels::LogLevel;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub debug_tags: HashSet<String>,
    pub verbose_tags: HashSet<String>,
    /// Empty means every tag is enabled
    pub enabled_tags: HashSet<String>,
    pub colored: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            verbose_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            colored: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> = Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub fn update_logger_config<F>(f: F)
where
    F: FnOnce(&mut LoggerConfig),
{
    f(&mut LOGGER_CONFIG.write());
}

/// Configure the logger from the process arguments
pub fn init_from_args() {
    let args: Vec<String> = std::env::args().collect();
    set_logger_config(config_from_args(&args));
}

pub fn config_from_args(args: &[String]) -> LoggerConfig {
    let mut config = LoggerConfig::default();

    for arg in args {
        if arg == "--verbose" {
            config.min_level = LogLevel::Verbose;
        } else if arg == "--quiet" {
            config.min_level = LogLevel::Warning;
        } else if arg == "--no-color" {
            config.colored = false;
        } else if let Some(tag) = arg.strip_prefix("--debug-") {
            config.debug_tags.insert(tag.to_lowercase());
            if config.min_level < LogLevel::Debug {
                config.min_level = LogLevel::Debug;
            }
        } else if let Some(tag) = arg.strip_prefix("--verbose-") {
            config.verbose_tags.insert(tag.to_lowercase());
            config.debug_tags.insert(tag.to_lowercase());
            config.min_level = LogLevel::Verbose;
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_debug_flag_enables_tag() {
        let config = config_from_args(&args(&["bin", "--debug-store"]));
        assert!(config.debug_tags.contains("store"));
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.verbose_tags.is_empty());
    }

    #[test]
    fn test_verbose_and_quiet() {
        let config = config_from_args(&args(&["bin", "--verbose"]));
        assert_eq!(config.min_level, LogLevel::Verbose);

        let config = config_from_args(&args(&["bin", "--quiet"]));
        assert_eq!(config.min_level, LogLevel::Warning);
    }

    #[test]
    fn test_verbose_tag_implies_debug_tag() {
        let config = config_from_args(&args(&["bin", "--verbose-view-model"]));
        assert!(config.verbose_tags.contains("view-model"));
        assert!(config.debug_tags.contains("view-model"));
    }
}
