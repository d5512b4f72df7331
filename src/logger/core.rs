/// Core logging implementation with automatic filtering
///
/// Checks whether a message should be displayed based on level and tag,
/// then hands it to the format module.

use super::config::{get_logger_config, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Filtering rules:
/// 1. Errors are always shown
/// 2. Check against minimum log level threshold
/// 3. Debug level requires --debug-<tag> for that tag
/// 4. Verbose level requires --verbose or --verbose-<tag>
/// 5. If enabled_tags is non-empty, tag must be in the set
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    should_log_with(&get_logger_config(), tag, level)
}

pub(crate) fn should_log_with(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if level > config.min_level {
        return false;
    }

    let key = tag.to_debug_key();

    if level == LogLevel::Debug {
        return config.debug_tags.contains(&key);
    }

    if level == LogLevel::Verbose {
        // --verbose alone opens every tag, --verbose-<tag> narrows it
        return config.verbose_tags.is_empty() || config.verbose_tags.contains(&key);
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&key) {
        return false;
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_always_pass() {
        let config = LoggerConfig {
            min_level: LogLevel::Error,
            ..LoggerConfig::default()
        };
        assert!(should_log_with(&config, &LogTag::Store, LogLevel::Error));
        assert!(!should_log_with(&config, &LogTag::Store, LogLevel::Warning));
    }

    #[test]
    fn test_debug_is_gated_per_tag() {
        let mut config = LoggerConfig {
            min_level: LogLevel::Debug,
            ..LoggerConfig::default()
        };
        config.debug_tags.insert("store".to_string());

        assert!(should_log_with(&config, &LogTag::Store, LogLevel::Debug));
        assert!(!should_log_with(&config, &LogTag::ViewModel, LogLevel::Debug));
        assert!(should_log_with(&config, &LogTag::ViewModel, LogLevel::Info));
    }

    #[test]
    fn test_enabled_tags_filter_info() {
        let mut config = LoggerConfig::default();
        config.enabled_tags.insert("database".to_string());

        assert!(should_log_with(&config, &LogTag::Database, LogLevel::Info));
        assert!(!should_log_with(&config, &LogTag::Store, LogLevel::Info));
    }
}
