/// Log tags identify the subsystem a message comes from.
///
/// Debug output is enabled per tag with `--debug-<key>` where `<key>` is
/// [`LogTag::to_debug_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    Store,
    ViewModel,
    Poisoning,
    Database,
    Config,
    System,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` flags and `LoggerConfig.debug_tags`.
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Store => "store".to_string(),
            LogTag::ViewModel => "view-model".to_string(),
            LogTag::Poisoning => "poisoning".to_string(),
            LogTag::Database => "database".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::System => "system".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(name) => name.to_lowercase(),
        }
    }

    /// Uncolored label, as written to non-terminal sinks.
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::Store => "STORE".to_string(),
            LogTag::ViewModel => "VIEWMODEL".to_string(),
            LogTag::Poisoning => "POISONING".to_string(),
            LogTag::Database => "DATABASE".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
