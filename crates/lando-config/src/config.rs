//! The layered configuration store

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lando_fs::{Format, YamlDocument, format, io, run_descriptor};
use serde_json::{Map, Value};

use crate::codec::{decode_tree, encode_path, encode_tree};
use crate::env::env_tree;
use crate::merge::{MergeStrategy, merge_into};
use crate::path::{get_at_path, key_segments, leaves, parse_path, remove_at_path, set_at_path};
use crate::store::{DescriptorFn, Source, Store};
use crate::{Error, Result};

/// Instance-level options for a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Product id, used in log fields and as the default env prefix.
    pub id: String,
    /// Store targeted by `save` and `remove` when none is named.
    pub managed_store: String,
    /// Array policy applied when stores are merged.
    pub strategy: MergeStrategy,
    /// Encode store data on insertion and lookup paths on read.
    pub encode: bool,
    /// Decode results on read.
    pub decode: bool,
    /// Where `dump` writes the compiled snapshot.
    pub cached_snapshot_path: Option<PathBuf>,
    /// Origin for stores without a backing file.
    pub base_dir: PathBuf,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            id: "lando".to_string(),
            managed_store: "user".to_string(),
            strategy: MergeStrategy::default(),
            encode: true,
            decode: true,
            cached_snapshot_path: None,
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Per-call read options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    pub encode: bool,
    pub decode: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            encode: true,
            decode: true,
        }
    }
}

impl GetOptions {
    /// Read keys exactly as stored.
    pub fn raw() -> Self {
        Self {
            encode: false,
            decode: false,
        }
    }
}

/// An ordered set of named stores merged on read.
///
/// Insertion order is priority order: later stores win. Every read merges
/// from scratch, so `get` never mutates anything.
#[derive(Debug, Clone, Default)]
pub struct Config {
    options: ConfigOptions,
    stores: Vec<Store>,
}

impl Config {
    pub fn new(options: ConfigOptions) -> Self {
        Self {
            options,
            stores: Vec::new(),
        }
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    fn encoded(&self, data: Value) -> Value {
        if self.options.encode {
            encode_tree(&data)
        } else {
            data
        }
    }

    /// Insert a store, replacing a same-named one in place.
    fn insert(&mut self, mut store: Store) -> &mut Self {
        store.data = self.encoded(store.data);
        tracing::debug!(
            config = %self.options.id,
            store = %store.name,
            kind = %store.kind(),
            "Adding configuration store"
        );
        match self.stores.iter().position(|s| s.name == store.name) {
            Some(idx) => self.stores[idx] = store,
            None => self.stores.push(store),
        }
        self
    }

    /// Add an empty in-memory store.
    pub fn memory(&mut self, name: &str) -> &mut Self {
        self.insert(Store::new(name, Source::Memory, Value::Object(Map::new())))
    }

    /// Add a literal store.
    pub fn literal(&mut self, name: &str, data: Value) -> &mut Self {
        self.insert(Store::new(name, Source::Literal, data))
    }

    /// Add a literal store meant to sit at the bottom of the stack.
    pub fn defaults(&mut self, name: &str, data: Value) -> &mut Self {
        self.literal(name, data)
    }

    /// Add a literal store meant to sit at the top of the stack.
    pub fn overrides(&mut self, name: &str, data: Value) -> &mut Self {
        self.literal(name, data)
    }

    /// Add a file store. A missing file is an empty store.
    ///
    /// `.exec` files are executed with the configuration merged so far as
    /// JSON on stdin.
    pub fn file(&mut self, name: &str, path: impl Into<PathBuf>) -> Result<&mut Self> {
        let path = path.into();
        let data = self.load_file(&path)?;
        Ok(self.insert(Store::new(name, Source::File(path), data)))
    }

    /// Add an environment store reading the process environment.
    pub fn env(&mut self, name: &str) -> &mut Self {
        let data = env_tree(name, std::env::vars());
        self.insert(Store::new(
            name,
            Source::Environment {
                prefix: name.to_string(),
                vars: None,
            },
            data,
        ))
    }

    /// Add an environment store over an explicit variable set.
    pub fn env_from<I, K, V>(&mut self, name: &str, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let data = env_tree(name, vars.clone());
        self.insert(Store::new(
            name,
            Source::Environment {
                prefix: name.to_string(),
                vars: Some(vars),
            },
            data,
        ))
    }

    /// Add a store computed from the configuration built so far.
    ///
    /// The function runs now and again on every `reset`.
    pub fn descriptor<F>(&mut self, name: &str, f: F) -> Result<&mut Self>
    where
        F: Fn(&Config) -> Result<Value> + Send + Sync + 'static,
    {
        let f: DescriptorFn = Arc::new(f);
        let data = f(self)?;
        Ok(self.insert(Store::new(name, Source::Descriptor(f), data)))
    }

    /// Add a literal store from a snapshot written by [`Config::dump`].
    pub fn restore(&mut self, name: &str, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let data = Format::Json.parse(path, &io::read_text(path)?)?;
        tracing::debug!(store = %name, path = %path.display(), "Restored configuration snapshot");
        Ok(self.literal(name, data))
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn store(&self, name: &str) -> Option<&Store> {
        self.stores.iter().find(|s| s.name == name)
    }

    pub fn has_store(&self, name: &str) -> bool {
        self.store(name).is_some()
    }

    pub fn remove_store(&mut self, name: &str) -> Option<Store> {
        let idx = self.stores.iter().position(|s| s.name == name)?;
        Some(self.stores.remove(idx))
    }

    /// Every store merged lowest priority first, keys as stored.
    pub fn merged(&self) -> Value {
        let mut merged = Value::Object(Map::new());
        for store in &self.stores {
            merge_into(&mut merged, &store.data, &self.options.strategy);
        }
        merged
    }

    /// The fully merged, decoded tree.
    pub fn all(&self) -> Value {
        self.get("").unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Read a path from the merged tree, or from one store with `store:path`.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.get_with(path, GetOptions::default())
    }

    pub fn get_with(&self, path: &str, options: GetOptions) -> Option<Value> {
        let (tree, path) = match path.split_once(':') {
            Some((name, rest)) => match self.store(name) {
                Some(store) => (Cow::Borrowed(&store.data), rest),
                None => {
                    tracing::debug!(store = %name, "Lookup against unknown store");
                    return None;
                }
            },
            None => (Cow::Owned(self.merged()), path),
        };

        let lookup = if options.encode && self.options.encode {
            encode_path(path)
        } else {
            path.to_string()
        };

        let found = get_at_path(&tree, &parse_path(&lookup))?;
        if options.decode && self.options.decode {
            Some(decode_tree(found))
        } else {
            Some(found.clone())
        }
    }

    /// Write into the highest-priority memory store, creating one if needed.
    pub fn set(&mut self, path: &str, value: Value) {
        let lookup = if self.options.encode {
            encode_path(path)
        } else {
            path.to_string()
        };
        let value = self.encoded(value);

        let idx = match self.stores.iter().rposition(|s| matches!(s.source, Source::Memory)) {
            Some(idx) => idx,
            None => {
                self.memory("memory");
                self.stores.len() - 1
            }
        };

        let store = &mut self.stores[idx];
        if !set_at_path(&mut store.data, &parse_path(&lookup), value) {
            tracing::warn!(store = %store.name, path, "Could not set configuration path");
        }
    }

    fn file_target(&self, store: Option<&str>) -> Result<(String, PathBuf, Format)> {
        let name = store.unwrap_or(self.options.managed_store.as_str()).to_string();
        let target = self
            .store(&name)
            .ok_or_else(|| Error::UnknownStore { name: name.clone() })?;
        let path = target
            .path()
            .ok_or_else(|| Error::NoBackingFile { name: name.clone() })?
            .to_path_buf();
        let format = Format::from_path(&path)?;
        if format == Format::Executable {
            return Err(Error::ReadOnlyStore { name, path });
        }
        Ok((name, path, format))
    }

    /// Merge `data` into a file store's backing file.
    ///
    /// `"true"`/`"false"` strings become booleans, and a string aimed at an
    /// existing array is split on commas and whitespace. Arrays in `data`
    /// replace the stored array whole. YAML files are edited in place.
    pub fn save(&mut self, data: &Value, store: Option<&str>) -> Result<()> {
        let (name, path, format) = self.file_target(store)?;
        let data = self.encoded(data.clone());
        let current = self
            .store(&name)
            .map(|s| s.data.clone())
            .unwrap_or(Value::Null);

        let updates: Vec<(Vec<String>, Value)> = leaves(&data, false)
            .into_iter()
            .filter_map(|segments| {
                let at = key_segments(&segments);
                let value = get_at_path(&data, &at)?.clone();
                let existing = get_at_path(&current, &at);
                Some((segments, coerce(value, existing)))
            })
            .collect();

        match format {
            Format::Yaml => {
                let mut doc = YamlDocument::load(&path)?;
                for (segments, value) in &updates {
                    let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
                    doc.set_in(&parts, value)?;
                }
                doc.save(&path)?;
            }
            _ => {
                let mut tree = format::load_value_or_empty(&path)?;
                for (segments, value) in updates {
                    set_at_path(&mut tree, &key_segments(&segments), value);
                }
                format::save_value(&path, &tree)?;
            }
        }

        tracing::debug!(store = %name, path = %path.display(), "Saved configuration");
        self.reset()?;
        self.dump()?;
        Ok(())
    }

    /// Delete a path from a file store's backing file.
    pub fn remove(&mut self, path: &str, store: Option<&str>) -> Result<bool> {
        let (name, file, format) = self.file_target(store)?;
        let lookup = if self.options.encode {
            encode_path(path)
        } else {
            path.to_string()
        };
        let segments: Vec<String> = parse_path(&lookup).iter().map(|s| s.as_key()).collect();

        let removed = match format {
            Format::Yaml => {
                let mut doc = YamlDocument::load(&file)?;
                let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
                let removed = doc.delete_in(&parts)?;
                if removed {
                    doc.save(&file)?;
                }
                removed
            }
            _ => {
                let mut tree = format::load_value_or_empty(&file)?;
                let removed = remove_at_path(&mut tree, &key_segments(&segments)).is_some();
                if removed {
                    format::save_value(&file, &tree)?;
                }
                removed
            }
        };

        tracing::debug!(store = %name, path = %lookup, removed, "Removed configuration path");
        self.reset()?;
        self.dump()?;
        Ok(removed)
    }

    /// Reload every file, environment and descriptor store from its origin.
    pub fn reset(&mut self) -> Result<()> {
        for idx in 0..self.stores.len() {
            let source = self.stores[idx].source.clone();
            let data = match &source {
                Source::File(path) => self.load_file(path)?,
                Source::Environment { prefix, vars } => match vars {
                    Some(vars) => env_tree(prefix, vars.clone()),
                    None => env_tree(prefix, std::env::vars()),
                },
                Source::Descriptor(f) => f(self)?,
                Source::Memory | Source::Literal => continue,
            };
            self.stores[idx].data = self.encoded(data);
        }
        Ok(())
    }

    /// Write the merged tree to the cached snapshot path, if one is set.
    pub fn dump(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.options.cached_snapshot_path else {
            return Ok(None);
        };
        let content = Format::Json.render(path, &self.merged())?;
        io::write_text(path, &content)?;
        tracing::debug!(path = %path.display(), "Dumped configuration snapshot");
        Ok(Some(path.clone()))
    }

    /// Every store as an `(origin directory, tree)` pair, lowest priority first.
    ///
    /// File stores originate in their file's directory; everything else in
    /// the configured base directory.
    pub fn fragments(&self) -> Vec<(PathBuf, &Value)> {
        self.stores
            .iter()
            .map(|store| {
                let origin = store
                    .path()
                    .and_then(Path::parent)
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.options.base_dir.clone());
                (origin, &store.data)
            })
            .collect()
    }

    fn load_file(&self, path: &Path) -> Result<Value> {
        let data = match Format::from_path(path)? {
            Format::Executable if path.is_file() => run_descriptor(path, &self.all())?,
            Format::Executable => Value::Object(Map::new()),
            _ => format::load_value_or_empty(path)?,
        };
        Ok(data)
    }
}

fn coerce(value: Value, existing: Option<&Value>) -> Value {
    match value {
        Value::String(s) if s == "true" => Value::Bool(true),
        Value::String(s) if s == "false" => Value::Bool(false),
        Value::String(s) if matches!(existing, Some(Value::Array(_))) => Value::Array(
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        other => other,
    }
}
