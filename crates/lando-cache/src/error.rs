//! Error types for lando-cache

/// Result type for lando-cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lando-cache operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key cannot be used as a file name
    #[error("Invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// The value could not be converted to JSON
    #[error("Failed to serialize cache entry '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error from lando-fs
    #[error(transparent)]
    Fs(#[from] lando_fs::Error),
}
