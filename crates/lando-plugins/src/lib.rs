//! Plugin discovery for Lando
//!
//! A plugin is a directory holding `plugin.exec`, `plugin.yaml`,
//! `plugin.yml` or `package.json`. [`discover`] scans a ranked list of
//! [`PluginSource`]s and returns a [`PluginSet`] with every name resolved
//! to its most local copy.

pub mod discovery;
pub mod error;
pub mod manifest;
pub mod plugin;

pub use discovery::{PluginSet, PluginSource, discover, find_plugin_dirs};
pub use error::{Error, Result};
pub use manifest::{Manifest, PackageJson};
pub use plugin::{Plugin, PluginType, has_marker, remove_plugin};
