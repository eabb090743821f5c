//! [`TestLando`] temporary product layout.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory laid out like a Lando installation.
///
/// ```text
/// <root>/core            core root, bundled plugins in core/plugins
/// <root>/home/.lando     user config root (config.yml, instance, plugins/)
/// <root>/home/.lando/cache
/// <root>/app             an app root
/// ```
pub struct TestLando {
    temp_dir: TempDir,
}

impl Default for TestLando {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLando {
    /// Create the layout with every directory present.
    pub fn new() -> Self {
        let lando = Self {
            temp_dir: TempDir::new().unwrap(),
        };
        for dir in [
            lando.core_root(),
            lando.user_conf_root(),
            lando.app_root(),
        ] {
            fs::create_dir_all(dir).unwrap();
        }
        lando
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn core_root(&self) -> PathBuf {
        self.root().join("core")
    }

    pub fn user_conf_root(&self) -> PathBuf {
        self.root().join("home").join(".lando")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.user_conf_root().join("cache")
    }

    pub fn app_root(&self) -> PathBuf {
        self.root().join("app")
    }

    /// Plugins bundled with the core.
    pub fn core_plugins(&self) -> PathBuf {
        self.core_root().join("plugins")
    }

    /// Plugins installed by the user.
    pub fn user_plugins(&self) -> PathBuf {
        self.user_conf_root().join("plugins")
    }

    /// Write `config.yml` in the user config root and return its path.
    pub fn write_user_config(&self, content: &str) -> PathBuf {
        let path = self.user_conf_root().join("config.yml");
        fs::write(&path, content).unwrap();
        path
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
