//! Plugin manifests and package descriptors.
//!
//! A plugin's metadata comes from exactly one place, picked in this order:
//!
//! 1. `plugin.exec`, an executable descriptor printing the manifest
//! 2. `plugin.yaml` / `plugin.yml`
//! 3. the `lando` section of `package.json`
//! 4. nothing, an empty manifest
//!
//! # Example YAML
//!
//! ```yaml
//! name: php
//! registry:
//!   core.engine: ./lib/engine.yml
//! hooks:
//!   post-start:
//!     - ./hooks/report.yml
//! tasks:
//!   composer: ./tasks/composer.yml
//! config:
//!   version: "8.2"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Manifest fragments a plugin contributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Manifest {
    /// Overrides the package name when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component id to locator.
    #[serde(default)]
    pub registry: Map<String, Value>,
    /// Event name to one or more locators.
    #[serde(default)]
    pub hooks: Map<String, Value>,
    /// Task name to locator.
    #[serde(default)]
    pub tasks: Map<String, Value>,
    /// Configuration contributed under the plugin's namespace.
    #[serde(default)]
    pub config: Map<String, Value>,
    /// Explicit opt-out; anything but `false` means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Build a manifest from a parsed tree. `null` is an empty manifest.
    pub fn from_value(path: &Path, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| Error::InvalidManifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// The parts of `package.json` plugin loading cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dependencies: Map<String, Value>,
    /// Embedded plugin descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lando: Option<Value>,
}

impl PackageJson {
    /// Keyword marking a package as a plugin without an embedded section.
    pub const KEYWORD: &'static str = "lando-plugin";

    pub fn from_value(path: &Path, value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidManifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Whether the package declares itself a plugin.
    pub fn is_plugin(&self) -> bool {
        self.lando.is_some() || self.keywords.iter().any(|k| k == Self::KEYWORD)
    }
}
