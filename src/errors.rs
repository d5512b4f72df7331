use thiserror::Error;

/// Error type shared by the activity store, its collaborators and the config loader.
#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Network error: {0}")] Network(String),

    #[error("API error: {0}")] Api(String),

    #[error("Persistence error: {0}")] Persistence(String),

    #[error("Configuration error: {0}")] Config(String),

    #[error("Invalid argument: {0}")] InvalidArgument(String),

    #[error("Database error: {0}")] Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")] Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")] Io(#[from] std::io::Error),
}

impl ActivityError {
    /// Errors a caller may retry later (the next scroll, the next poll).
    pub fn is_recoverable(&self) -> bool {
        match self {
            ActivityError::Network(_) => true,
            ActivityError::Api(_) => true,
            _ => false,
        }
    }
}

pub type ActivityResult<T> = Result<T, ActivityError>;
