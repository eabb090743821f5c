//! The compiled component registry
//!
//! Maps dotted component ids (`core.engine`, `compose`) to absolute
//! locator paths, plus an alias table. Built once per bootstrap from
//! normalized [`Fragment`]s and cached as a whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fragment::Fragment;

/// Longest alias chain followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 16;

/// Component id to locator path, plus aliases.
///
/// # Example
///
/// ```
/// use lando_core::Registry;
///
/// let mut registry = Registry::new();
/// registry.register("engine.docker-desktop", "/core/engine/desktop.yml");
/// registry.alias("core.engine", "engine.docker-desktop");
/// assert_eq!(registry.resolve_alias("core.engine"), "engine.docker-desktop");
/// assert_eq!(registry.get("core.engine"), Some("/core/engine/desktop.yml"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    components: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the `registry` sections of `fragments`, lowest priority first.
    ///
    /// Later fragments win conflicts. Non-string locators are skipped.
    pub fn compile(fragments: &[Fragment]) -> Self {
        let mut registry = Self::new();
        for fragment in fragments {
            let Some(section) = fragment.section("registry") else {
                continue;
            };
            for (id, locator) in section {
                match locator.as_str() {
                    Some(path) => registry.register(id.clone(), path),
                    None => tracing::debug!(id = %id, origin = %fragment.origin.display(), "Skipping non-path registry entry"),
                }
            }
        }
        tracing::debug!(components = registry.len(), "Compiled registry");
        registry
    }

    /// Register (or replace) a component locator.
    pub fn register(&mut self, id: impl Into<String>, locator: impl Into<String>) {
        self.components.insert(id.into(), locator.into());
    }

    /// Point `from` at another component id.
    pub fn alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }

    /// Generate aliases from a `core` config section and an explicit
    /// `aliases` section.
    ///
    /// `core.<k> = <v>` aliases `core.<k>` to `<k>.<v>` whenever `<k>.<v>` is
    /// registered. Explicit aliases are added as-is and win.
    pub fn add_aliases(&mut self, core: Option<&Value>, explicit: Option<&Value>) {
        if let Some(Value::Object(core)) = core {
            for (key, value) in core {
                let Some(variant) = value.as_str() else {
                    continue;
                };
                let target = format!("{key}.{variant}");
                if self.contains(&target) {
                    self.alias(format!("core.{key}"), target);
                }
            }
        }
        if let Some(Value::Object(explicit)) = explicit {
            for (from, to) in explicit {
                if let Some(to) = to.as_str() {
                    self.alias(from.clone(), to);
                }
            }
        }
    }

    /// Follow aliases from `id` to the id actually registered.
    ///
    /// Chains stop at [`MAX_ALIAS_DEPTH`]; a cycle resolves to wherever the
    /// walk stopped and then fails lookup as not found.
    pub fn resolve_alias<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        for _ in 0..MAX_ALIAS_DEPTH {
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => return current,
            }
        }
        tracing::warn!(id, "Alias chain too deep, stopping");
        current
    }

    /// Locator for `id`, following aliases.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.components
            .get(self.resolve_alias(id))
            .map(String::as_str)
    }

    /// Whether `id` itself is registered (aliases are not followed).
    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn is_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    pub fn components(&self) -> &BTreeMap<String, String> {
        &self.components
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_fragments_win() {
        let registry = Registry::compile(&[
            Fragment::new("/core", json!({"registry": {"engine": "./a.yml", "compose": "./c.yml"}})),
            Fragment::new("/plugin", json!({"registry": {"engine": "./b.yml"}})),
        ]);

        assert_eq!(registry.get("engine"), Some("/plugin/b.yml"));
        assert_eq!(registry.get("compose"), Some("/core/c.yml"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_generated_aliases_require_a_registered_target() {
        let mut registry = Registry::new();
        registry.register("engine.docker-desktop", "/e.yml");
        registry.add_aliases(
            Some(&json!({"engine": "docker-desktop", "caching": true, "mode": "missing"})),
            Some(&json!({"compose": "engine.docker-desktop"})),
        );

        assert_eq!(registry.resolve_alias("core.engine"), "engine.docker-desktop");
        assert!(!registry.is_alias("core.mode"));
        assert!(!registry.is_alias("core.caching"));
        assert_eq!(registry.get("compose"), Some("/e.yml"));
    }

    #[test]
    fn test_alias_cycles_terminate() {
        let mut registry = Registry::new();
        registry.alias("a", "b");
        registry.alias("b", "a");
        assert!(registry.get("a").is_none());
    }
}
