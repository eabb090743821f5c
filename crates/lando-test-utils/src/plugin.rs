//! [`PluginFixture`] builder for plugin directories.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// A plugin directory under construction.
///
/// # Example
///
/// ```rust,no_run
/// use lando_test_utils::PluginFixture;
/// use std::path::Path;
///
/// let plugin = PluginFixture::new(Path::new("/tmp/plugins"), "php")
///     .with_yaml("name: php\nregistry:\n  php: ./php.yml\n")
///     .with_file("php.yml", "class: php\n");
/// assert!(plugin.root().ends_with("php"));
/// ```
#[derive(Debug, Clone)]
pub struct PluginFixture {
    root: PathBuf,
}

impl PluginFixture {
    /// Create `parent/dir_name` (nested names like `@lando/php` work).
    pub fn new(parent: &Path, dir_name: &str) -> Self {
        let root = parent.join(dir_name);
        fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `plugin.yml`.
    pub fn with_yaml(self, content: &str) -> Self {
        self.with_file("plugin.yml", content)
    }

    /// Write `package.json`.
    pub fn with_package(self, package: Value) -> Self {
        let content = serde_json::to_string_pretty(&package).unwrap();
        self.with_file("package.json", &content)
    }

    /// Write an executable `plugin.exec` shell script.
    #[cfg(unix)]
    pub fn with_exec(self, body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.join("plugin.exec");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    /// Write any file relative to the plugin root.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        self
    }

    /// Populate the dependency directory.
    pub fn with_dependencies_installed(self) -> Self {
        self.with_file("node_modules/dep/index.js", "")
    }
}
