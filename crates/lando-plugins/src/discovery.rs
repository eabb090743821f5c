//! Plugin discovery across ranked sources.
//!
//! Sources are scanned lowest weight first. When two sources provide a
//! plugin with the same name, the one from the higher-weight (more local)
//! source wins, so an app-level plugin shadows a globally installed one.
//! Enabled, disabled and invalid plugins shadow only their own kind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::plugin::{DEPENDENCY_DIR, Plugin, PluginType, has_marker};

fn default_depth() -> usize {
    2
}

/// A place plugins are looked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSource {
    pub id: String,
    /// Directory to scan; sources may instead carry pre-built plugins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// How many directory levels below `dir` to search.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Higher weight wins name conflicts.
    #[serde(default)]
    pub weight: i64,
    #[serde(rename = "type", default)]
    pub plugin_type: PluginType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
}

impl PluginSource {
    pub fn dir(
        id: impl Into<String>,
        dir: impl Into<PathBuf>,
        depth: usize,
        weight: i64,
        plugin_type: PluginType,
    ) -> Self {
        Self {
            id: id.into(),
            dir: Some(dir.into()),
            depth,
            weight,
            plugin_type,
            plugins: Vec::new(),
        }
    }

    /// A source made of already-built plugins.
    pub fn literal(id: impl Into<String>, weight: i64, plugins: Vec<Plugin>) -> Self {
        Self {
            id: id.into(),
            dir: None,
            depth: 0,
            weight,
            plugin_type: PluginType::default(),
            plugins,
        }
    }
}

/// Directories below `dir` containing a plugin marker.
///
/// The search does not descend into a directory once it has a marker, and
/// skips hidden and dependency directories. Results are in path order.
pub fn find_plugin_dirs(dir: &Path, depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(dir, 0, depth, &mut found);
    found
}

fn walk(dir: &Path, level: usize, depth: usize, found: &mut Vec<PathBuf>) {
    if level >= depth {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(dir = %dir.display(), error = %e, "Could not read plugin directory");
            }
            return;
        }
    };

    let mut children: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .map(|n| n.to_string_lossy())
                .is_some_and(|n| !n.starts_with('.') && n != DEPENDENCY_DIR)
        })
        .collect();
    children.sort();

    for child in children {
        if has_marker(&child) {
            found.push(child);
        } else {
            walk(&child, level + 1, depth, found);
        }
    }
}

/// Plugins found by one source, split by state.
#[derive(Debug, Clone, Default)]
struct Partition {
    active: Vec<Plugin>,
    invalid: Vec<Plugin>,
}

fn scan(source: &PluginSource) -> Partition {
    let mut plugins: Vec<Plugin> = source.plugins.clone();

    if let Some(dir) = &source.dir {
        for root in find_plugin_dirs(dir, source.depth) {
            let plugin = match Plugin::load(&root, source.plugin_type) {
                Ok(plugin) => plugin,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Marking unloadable plugin invalid");
                    Plugin::invalid(&root, source.plugin_type)
                }
            };
            plugins.push(plugin);
        }
    }

    let mut partition = Partition::default();
    for mut plugin in plugins {
        plugin.source = source.id.clone();
        if !plugin.is_valid {
            partition.invalid.push(plugin);
            continue;
        }
        // Same name twice in one source: the higher version stays
        match partition.active.iter_mut().find(|p| p.name == plugin.name) {
            Some(existing) if existing.semver() > plugin.semver() => {}
            Some(existing) => *existing = plugin,
            None => partition.active.push(plugin),
        }
    }

    tracing::debug!(
        source = %source.id,
        found = partition.active.len(),
        invalid = partition.invalid.len(),
        "Scanned plugin source"
    );
    partition
}

/// Resolved plugins, each list in priority order, lowest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginSet {
    pub enabled: Vec<Plugin>,
    pub disabled: Vec<Plugin>,
    pub invalid: Vec<Plugin>,
}

impl PluginSet {
    /// Names of enabled plugins, lowest priority first.
    pub fn names(&self) -> Vec<&str> {
        self.enabled.iter().map(|p| p.name.as_str()).collect()
    }

    /// Look up a valid plugin by name, enabled or not.
    pub fn get(&self, name: &str) -> Option<&Plugin> {
        self.all().find(|p| p.name == name)
    }

    /// Every valid plugin: enabled ones, then disabled ones.
    pub fn all(&self) -> impl Iterator<Item = &Plugin> {
        self.enabled.iter().chain(&self.disabled)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|p| p.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty() && self.invalid.is_empty()
    }
}

/// Scan every source and resolve name conflicts by source weight.
///
/// Enabled, disabled and invalid plugins are folded into separate lists,
/// each keyed by name with the most local source winning. A disabled copy
/// never hides an enabled one from a lower source, and the reverse.
pub fn discover(sources: &[PluginSource]) -> PluginSet {
    let mut ordered: Vec<&PluginSource> = sources.iter().collect();
    ordered.sort_by_key(|s| s.weight);

    let mut enabled = Vec::new();
    let mut disabled = Vec::new();
    let mut invalid = Vec::new();
    for partition in ordered.iter().map(|s| scan(s)) {
        let (on, off): (Vec<Plugin>, Vec<Plugin>) =
            partition.active.into_iter().partition(|p| p.enabled);
        enabled.push(on);
        disabled.push(off);
        invalid.push(partition.invalid);
    }

    let set = PluginSet {
        enabled: fold(enabled),
        disabled: fold(disabled),
        invalid: fold(invalid),
    };

    tracing::debug!(
        enabled = set.enabled.len(),
        disabled = set.disabled.len(),
        invalid = set.invalid.len(),
        "Discovered plugins"
    );
    set
}

/// Merge per-source lists, lowest source first, into one list where the
/// first copy of a name seen from the most local source wins.
fn fold(lists: Vec<Vec<Plugin>>) -> Vec<Plugin> {
    let mut winners: Vec<Plugin> = Vec::new();
    for list in lists.into_iter().rev() {
        for plugin in list.into_iter().rev() {
            if !winners.iter().any(|p| p.name == plugin.name) {
                winners.push(plugin);
            }
        }
    }
    winners.reverse();
    winners
}
