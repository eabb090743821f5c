//! Error types for lando-config

use std::path::PathBuf;

/// Result type for lando-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lando-config operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown configuration store: {name}")]
    UnknownStore { name: String },

    #[error("Configuration store '{name}' has no backing file to save to")]
    NoBackingFile { name: String },

    #[error("Configuration store '{name}' is backed by a read-only descriptor at {path}")]
    ReadOnlyStore { name: String, path: PathBuf },

    #[error("Unknown merge strategy: {0}")]
    UnknownStrategy(String),

    #[error("Descriptor for store '{name}' failed: {message}")]
    Descriptor { name: String, message: String },

    #[error(transparent)]
    Fs(#[from] lando_fs::Error),
}
