//! Structured logging for the activity engine
//!
//! ## Usage
//!
//! ```rust
//! use wallet_activity::logger::{self, LogTag};
//!
//! logger::error(LogTag::Database, "Failed to upsert account state");
//! logger::info(LogTag::Store, "Applied 12 new activities");
//! logger::debug(LogTag::Store, "Replacement map: ..."); // Only with --debug-store
//! ```
//!
//! Call `logger::init()` once at startup to pick up `--debug-<tag>`,
//! `--verbose` and `--quiet` from the process arguments.

mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{
    config_from_args, get_logger_config, init_from_args, set_logger_config, update_logger_config,
    LoggerConfig,
};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger from command-line arguments
pub fn init() {
    config::init_from_args();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, only shown with --debug-<tag>
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level, only shown with --verbose
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Whether a debug line for `tag` would be printed. Use it to skip building
/// expensive messages.
pub fn is_debug_enabled(tag: &LogTag) -> bool {
    core::should_log(tag, LogLevel::Debug)
}
