//! Manifest fragments with origin-relative locators resolved.
//!
//! Stores and plugins both contribute `registry`, `hooks` and `tasks`
//! sections whose string values are paths relative to where they were
//! written. A [`Fragment`] pairs such a tree with its origin directory and
//! rewrites those paths to absolute ones before anything is folded.

use std::path::{Path, PathBuf};

use lando_fs::NormalizedPath;
use lando_plugins::Plugin;
use serde_json::{Map, Value};

/// Sections whose string leaves are locators.
pub const LOCATOR_SECTIONS: [&str; 3] = ["registry", "hooks", "tasks"];

/// A tree and the directory its relative locators are relative to.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub origin: PathBuf,
    pub tree: Value,
}

impl Fragment {
    /// Build a fragment, normalizing its locator sections.
    pub fn new(origin: impl Into<PathBuf>, tree: Value) -> Self {
        let origin = origin.into();
        let tree = normalize(&origin, tree);
        Self { origin, tree }
    }

    /// The registry/hooks/tasks contribution of an enabled plugin.
    pub fn from_plugin(plugin: &Plugin) -> Self {
        let manifest = &plugin.manifest;
        let mut tree = Map::new();
        tree.insert("registry".into(), Value::Object(manifest.registry.clone()));
        tree.insert("hooks".into(), Value::Object(manifest.hooks.clone()));
        tree.insert("tasks".into(), Value::Object(manifest.tasks.clone()));
        Self::new(&plugin.root, Value::Object(tree))
    }

    /// A section of the tree as an object, if present.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.tree.get(name).and_then(Value::as_object)
    }
}

fn normalize(origin: &Path, mut tree: Value) -> Value {
    if let Value::Object(map) = &mut tree {
        for section in LOCATOR_SECTIONS {
            if let Some(value) = map.get_mut(section) {
                resolve_locators(origin, value);
            }
        }
    }
    tree
}

/// Resolve every string leaf (at any depth) against `origin`.
fn resolve_locators(origin: &Path, value: &mut Value) {
    match value {
        Value::String(locator) => {
            *locator = NormalizedPath::resolve(origin, locator).as_str().to_string();
        }
        Value::Array(items) => items.iter_mut().for_each(|v| resolve_locators(origin, v)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|v| resolve_locators(origin, v)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relative_locators_become_absolute() {
        let fragment = Fragment::new(
            "/plugins/php",
            json!({
                "registry": {"php": "./lib/php.yml", "abs": "/opt/x.yml"},
                "hooks": {"post-start": ["../shared/hook.yml"]},
                "tasks": {"composer": "tasks/composer.yml"},
                "config": {"path": "./not-a-locator"}
            }),
        );

        assert_eq!(
            fragment.tree,
            json!({
                "registry": {"php": "/plugins/php/lib/php.yml", "abs": "/opt/x.yml"},
                "hooks": {"post-start": ["/plugins/shared/hook.yml"]},
                "tasks": {"composer": "/plugins/php/tasks/composer.yml"},
                "config": {"path": "./not-a-locator"}
            })
        );
    }

    #[test]
    fn test_non_object_tree_is_untouched() {
        let fragment = Fragment::new("/x", json!(["a"]));
        assert_eq!(fragment.tree, json!(["a"]));
        assert!(fragment.section("registry").is_none());
    }
}
