//! Error types for lando-core

use std::path::PathBuf;

/// Result type for lando-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lando-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Could not find component '{id}'. If it was added recently, try again with --clear to rebuild the registry"
    )]
    ComponentNotFound { id: String },

    #[error(
        "Component '{id}' points at {path}, which does not exist. Try again with --clear to rebuild the registry"
    )]
    LocatorMissing { id: String, path: PathBuf },

    #[error("Component '{id}' does not resolve to something that can be instantiated")]
    NotInstantiable { id: String },

    #[error("Invalid arguments for component '{id}': {reason}")]
    InvalidArguments { id: String, reason: String },

    #[error("Component descriptor {path} names unknown {kind} '{name}'")]
    UnknownImplementation {
        path: PathBuf,
        kind: String,
        name: String,
    },

    #[error("Component resolution for '{id}' exceeded the maximum alias/extension depth")]
    ResolutionCycle { id: String },

    #[error("Component '{id}' failed to initialize: {message}")]
    Init { id: String, message: String },

    #[error("Invalid plugin sources in configuration: {reason}")]
    InvalidPluginSources { reason: String },

    #[error("Plugin installation from '{source_ref}' failed: {message}")]
    Install { source_ref: String, message: String },

    #[error(transparent)]
    Fs(#[from] lando_fs::Error),

    #[error(transparent)]
    Cache(#[from] lando_cache::Error),

    #[error(transparent)]
    Config(#[from] lando_config::Error),

    #[error(transparent)]
    Plugins(#[from] lando_plugins::Error),
}
