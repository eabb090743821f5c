//! A discovered plugin directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lando_fs::{format, io, run_descriptor};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::manifest::{Manifest, PackageJson};

/// Executable descriptor marker.
pub const EXEC_DESCRIPTOR: &str = "plugin.exec";
/// YAML descriptor markers.
pub const YAML_DESCRIPTORS: [&str; 2] = ["plugin.yaml", "plugin.yml"];
/// Package descriptor marker.
pub const PACKAGE_DESCRIPTOR: &str = "package.json";
/// Directory whose contents mean dependencies were installed.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Every file whose presence makes a directory a plugin candidate.
pub const MARKERS: [&str; 4] = [
    EXEC_DESCRIPTOR,
    YAML_DESCRIPTORS[0],
    YAML_DESCRIPTORS[1],
    PACKAGE_DESCRIPTOR,
];

/// Whether `dir` contains any plugin marker file.
pub fn has_marker(dir: &Path) -> bool {
    MARKERS.iter().any(|marker| dir.join(marker).is_file())
}

/// Where a plugin was installed, from most general to most local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Core,
    System,
    Global,
    #[default]
    User,
    App,
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Core => "core",
            Self::System => "system",
            Self::Global => "global",
            Self::User => "user",
            Self::App => "app",
        };
        f.write_str(name)
    }
}

impl FromStr for PluginType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "core" => Ok(Self::Core),
            "system" => Ok(Self::System),
            "global" => Ok(Self::Global),
            "user" => Ok(Self::User),
            "app" => Ok(Self::App),
            other => Err(Error::UnknownType(other.to_string())),
        }
    }
}

/// One plugin directory and everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    pub version: String,
    pub root: PathBuf,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    /// Id of the discovery source that found it.
    #[serde(default)]
    pub source: String,
    pub manifest: Manifest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageJson>,
    pub is_valid: bool,
    pub enabled: bool,
    pub is_installed: bool,
}

impl Plugin {
    /// Load the plugin rooted at `root`.
    ///
    /// Fails on unreadable or malformed descriptors; discovery turns those
    /// failures into [`Plugin::invalid`] entries.
    pub fn load(root: impl Into<PathBuf>, plugin_type: PluginType) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotFound(root));
        }

        let package_path = root.join(PACKAGE_DESCRIPTOR);
        let package = if package_path.is_file() {
            let value = format::load_value(&package_path)?;
            Some(PackageJson::from_value(&package_path, value)?)
        } else {
            None
        };

        let (descriptor, metadata) = Self::metadata(&root, plugin_type, package.as_ref())?;
        let manifest = Manifest::from_value(&descriptor, metadata)?;

        let has_descriptor = descriptor != package_path;
        let is_valid = has_descriptor || package.as_ref().is_some_and(PackageJson::is_plugin);

        let dir_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = manifest
            .name
            .clone()
            .or_else(|| package.as_ref().and_then(|p| p.name.clone()))
            .unwrap_or(dir_name);
        let version = package
            .as_ref()
            .and_then(|p| p.version.clone())
            .or_else(|| {
                manifest
                    .extra
                    .get("version")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "0.0.0".to_string());

        let enabled = manifest.enabled != Some(false);
        let is_installed = package.as_ref().is_none_or(|p| p.dependencies.is_empty())
            || io::is_populated_dir(root.join(DEPENDENCY_DIR));

        tracing::debug!(
            name = %name,
            root = %root.display(),
            kind = %plugin_type,
            is_valid,
            enabled,
            "Loaded plugin"
        );

        Ok(Self {
            name,
            version,
            root,
            plugin_type,
            source: String::new(),
            manifest,
            package,
            is_valid,
            enabled,
            is_installed,
        })
    }

    /// Placeholder for a directory that could not be loaded.
    pub fn invalid(root: impl Into<PathBuf>, plugin_type: PluginType) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            version: "0.0.0".to_string(),
            root,
            plugin_type,
            source: String::new(),
            manifest: Manifest::default(),
            package: None,
            is_valid: false,
            enabled: false,
            is_installed: false,
        }
    }

    /// Locate and read plugin-local metadata, returning the file it came from.
    fn metadata(
        root: &Path,
        plugin_type: PluginType,
        package: Option<&PackageJson>,
    ) -> Result<(PathBuf, Value)> {
        let exec = root.join(EXEC_DESCRIPTOR);
        if exec.is_file() {
            let context = json!({
                "root": root,
                "type": plugin_type,
                "package": package,
            });
            return Ok((exec.clone(), run_descriptor(&exec, &context)?));
        }

        for name in YAML_DESCRIPTORS {
            let path = root.join(name);
            if path.is_file() {
                return Ok((path.clone(), format::load_value(&path)?));
            }
        }

        let package_path = root.join(PACKAGE_DESCRIPTOR);
        let embedded = package.and_then(|p| p.lando.clone()).unwrap_or(Value::Null);
        Ok((package_path, embedded))
    }

    /// The version as semver, when it parses.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(self.version.trim_start_matches('v')).ok()
    }

    /// Valid and not opted out.
    pub fn is_active(&self) -> bool {
        self.is_valid && self.enabled
    }
}

/// Delete a plugin directory.
pub fn remove_plugin(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }
    std::fs::remove_dir_all(root).map_err(|e| lando_fs::Error::io(root, e))?;
    tracing::debug!(root = %root.display(), "Removed plugin");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("core", PluginType::Core)]
    #[case("app", PluginType::App)]
    fn test_type_names(#[case] name: &str, #[case] expected: PluginType) {
        assert_eq!(name.parse::<PluginType>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn test_unknown_type() {
        assert!("vendor".parse::<PluginType>().is_err());
    }

    #[test]
    fn test_semver_accepts_v_prefix() {
        let mut plugin = Plugin::invalid("/tmp/x", PluginType::User);
        plugin.version = "v1.2.3".into();
        assert_eq!(plugin.semver(), Some(semver::Version::new(1, 2, 3)));
    }
}
