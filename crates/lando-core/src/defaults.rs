//! Built-in configuration defaults.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Engine selected when nothing else says otherwise.
pub const DEFAULT_ENGINE: &str = "docker-desktop";

/// Pre-resolved locations the core needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    pub product: String,
    /// Where the shipped core lives; `plugins/` under it holds core plugins.
    pub core_root: PathBuf,
    /// Per-user configuration, e.g. `~/.lando`.
    pub user_conf_root: PathBuf,
    /// Per-user data, home of globally installed plugins.
    pub user_data_root: PathBuf,
    pub cache_dir: PathBuf,
}

impl SystemPaths {
    /// Lay everything out under one user configuration root.
    pub fn in_root(
        product: impl Into<String>,
        core_root: impl Into<PathBuf>,
        user_conf_root: impl Into<PathBuf>,
    ) -> Self {
        let user_conf_root = user_conf_root.into();
        Self {
            product: product.into(),
            core_root: core_root.into(),
            user_data_root: user_conf_root.clone(),
            cache_dir: user_conf_root.join("cache"),
            user_conf_root,
        }
    }

    /// Standard per-user locations: `~/.<product>` for configuration and
    /// the platform data directory for data. `None` without a home
    /// directory.
    pub fn detect(product: impl Into<String>, core_root: impl Into<PathBuf>) -> Option<Self> {
        let product = product.into();
        let user_conf_root = dirs::home_dir()?.join(format!(".{product}"));
        let user_data_root = dirs::data_dir()
            .map(|dir| dir.join(&product))
            .unwrap_or_else(|| user_conf_root.clone());
        Some(Self {
            cache_dir: user_conf_root.join("cache"),
            core_root: core_root.into(),
            user_conf_root,
            user_data_root,
            product,
        })
    }

    pub fn core_plugins(&self) -> PathBuf {
        self.core_root.join("plugins")
    }

    pub fn global_plugins(&self) -> PathBuf {
        self.user_data_root.join("global-plugins")
    }

    pub fn user_plugins(&self) -> PathBuf {
        self.user_conf_root.join("plugins")
    }

    /// The user's editable configuration file.
    pub fn user_config_file(&self) -> PathBuf {
        self.user_conf_root.join("config.yml")
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// The default configuration tree, in decoded (camelCase) form.
pub fn defaults_tree(paths: &SystemPaths) -> Value {
    json!({
        "system": {
            "product": paths.product,
            "coreRoot": display(&paths.core_root),
            "userConfRoot": display(&paths.user_conf_root),
            "userDataRoot": display(&paths.user_data_root),
            "cacheDir": display(&paths.cache_dir),
        },
        "core": {
            "caching": true,
            "engine": DEFAULT_ENGINE,
        },
        "plugin": {
            "dirs": [
                {"id": "core", "dir": display(&paths.core_plugins()), "depth": 1, "weight": -1000, "type": "core"},
                {"id": "global", "dir": display(&paths.global_plugins()), "depth": 2, "weight": -100, "type": "global"},
                {"id": "user", "dir": display(&paths.user_plugins()), "depth": 2, "weight": 0, "type": "user"},
            ]
        },
        "registry": {},
        "hooks": {},
        "tasks": {},
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_root_layout() {
        let paths = SystemPaths::in_root("lando", "/core", "/home/me/.lando");
        assert_eq!(paths.cache_dir, PathBuf::from("/home/me/.lando/cache"));
        assert_eq!(paths.user_plugins(), PathBuf::from("/home/me/.lando/plugins"));
        assert_eq!(paths.core_plugins(), PathBuf::from("/core/plugins"));
    }

    #[test]
    fn test_plugin_sources_rank_user_over_core() {
        let tree = defaults_tree(&SystemPaths::in_root("lando", "/core", "/u"));
        let dirs = tree["plugin"]["dirs"].as_array().unwrap();
        let weights: Vec<i64> = dirs.iter().map(|d| d["weight"].as_i64().unwrap()).collect();
        assert_eq!(weights, vec![-1000, -100, 0]);
        assert_eq!(tree["core"]["engine"], DEFAULT_ENGINE);
    }
}
