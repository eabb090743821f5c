//! Error types for lando-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lando_core::Error),

    #[error(transparent)]
    Config(#[from] lando_config::Error),

    #[error(transparent)]
    Cache(#[from] lando_cache::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not initialize logging: {0}")]
    Logging(String),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
