use std::path::PathBuf;

/// Errors that can occur while loading or managing plugins.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Plugin directory does not exist.
    #[error("plugin directory not found: {0}")]
    NotFound(PathBuf),

    /// A descriptor parsed but does not have the shape of a manifest.
    #[error("invalid plugin manifest at {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// Unknown plugin type name.
    #[error("unknown plugin type: {0}")]
    UnknownType(String),

    /// No discovered plugin has this name.
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error(transparent)]
    Fs(#[from] lando_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
