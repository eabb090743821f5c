//! Bootstrap: configuration in, plugins, registry and components out.
//!
//! Every stage is computed eagerly in [`Bootstrap::new`] and cached under a
//! key derived from the product id, so the next process can skip discovery
//! and registry compilation entirely. Installing or removing a plugin
//! invalidates all of it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lando_cache::{Cache, CacheExt, NullCache, SetOptions};
use lando_config::{Config, GetOptions};
use lando_plugins::{Plugin, PluginSet, PluginSource, PluginType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::component::{
    Component, ComponentClass, ComponentLoader, DescriptorLoader, InitContext, LoaderFn,
    instantiate,
};
use crate::fragment::Fragment;
use crate::hooks::{Hooks, Tasks};
use crate::registry::Registry;
use crate::resolver::ComponentResolver;
use crate::{Error, Result};

/// File under the user configuration root holding the instance id.
pub const INSTANCE_FILE: &str = "instance";

/// Cached bootstrap stages.
const STAGES: [&str; 4] = ["plugins", "registry", "hooks", "tasks"];

/// Fetches a plugin from somewhere and unpacks it into a directory.
#[async_trait]
pub trait PluginInstaller: Send + Sync {
    /// Install `source` under `dest`, returning the plugin's root.
    async fn install(
        &self,
        source: &str,
        dest: &Path,
    ) -> std::result::Result<PathBuf, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Clone)]
pub struct BootstrapOptions {
    /// Turns registry paths into component artifacts.
    pub loader: Arc<dyn ComponentLoader>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            loader: Arc::new(DescriptorLoader::default()),
        }
    }
}

impl std::fmt::Debug for BootstrapOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapOptions").finish_non_exhaustive()
    }
}

/// The bootstrapped core.
pub struct Bootstrap {
    config: Config,
    options: BootstrapOptions,
    loaders: HashMap<String, LoaderFn>,
    instance: String,
    cache: Arc<dyn Cache>,
    plugins: PluginSet,
    registry: Registry,
    hooks: Hooks,
    tasks: Tasks,
    resolver: ComponentResolver,
}

impl Bootstrap {
    pub fn new(config: Config, options: BootstrapOptions) -> Result<Self> {
        let instance = instance_id(&config)?;
        let cache = select_cache(&config);
        let resolver = ComponentResolver::new(
            Registry::new(),
            options.loader.clone(),
            Value::Null,
            false,
        );

        let mut bootstrap = Self {
            config,
            options,
            loaders: HashMap::new(),
            instance,
            cache,
            plugins: PluginSet::default(),
            registry: Registry::new(),
            hooks: Hooks::default(),
            tasks: Tasks::default(),
            resolver,
        };
        bootstrap.build()?;
        Ok(bootstrap)
    }

    /// Product id; prefixes every cache key.
    pub fn id(&self) -> &str {
        &self.config.options().id
    }

    /// Persistent per-installation uuid.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration. Call [`invalidate`](Self::invalidate) after
    /// changing anything plugins or the registry depend on.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn tasks(&self) -> &Tasks {
        &self.tasks
    }

    /// Cache key for a bootstrap stage.
    pub fn cache_key(&self, stage: &str) -> String {
        format!("{}.{stage}", self.id())
    }

    /// Resolve a component id to its class.
    pub fn get_component(&self, id: &str) -> Result<Arc<ComponentClass>> {
        self.resolver.resolve(id)
    }

    /// Serve `id` from an in-process loader. Survives invalidation.
    pub fn register_loader(&mut self, id: impl Into<String>, loader: LoaderFn) {
        let id = id.into();
        self.loaders.insert(id.clone(), loader.clone());
        self.resolver.register_loader(id, loader);
    }

    /// Resolve, construct and initialize a component.
    pub async fn instantiate_component(
        &self,
        id: &str,
        args: Value,
    ) -> Result<Box<dyn Component>> {
        let class = self.get_component(id)?;
        let ctx = InitContext {
            config: self.config.all(),
            registry: self.registry.clone(),
            cache: self.cache.clone(),
            defaults: class.config(),
        };
        instantiate(&class, args, &ctx).await
    }

    /// Install a plugin through `installer`, then rebuild.
    pub async fn install_plugin(
        &mut self,
        installer: &dyn PluginInstaller,
        source: &str,
        dest: &Path,
    ) -> Result<Plugin> {
        tracing::debug!(source, dest = %dest.display(), "Installing plugin");
        let root = installer
            .install(source, dest)
            .await
            .map_err(|e| Error::Install {
                source_ref: source.to_string(),
                message: e.to_string(),
            })?;
        let plugin = Plugin::load(root, PluginType::User)?;
        self.invalidate()?;
        tracing::debug!(name = %plugin.name, "Installed plugin");
        Ok(plugin)
    }

    /// Delete a discovered plugin's directory, then rebuild.
    pub fn remove_plugin(&mut self, name: &str) -> Result<Plugin> {
        let plugin = self
            .plugins
            .get(name)
            .or_else(|| self.plugins.invalid.iter().find(|p| p.name == name))
            .cloned()
            .ok_or_else(|| lando_plugins::Error::UnknownPlugin(name.to_string()))?;
        lando_plugins::remove_plugin(&plugin.root)?;
        self.invalidate()?;
        tracing::debug!(name, "Removed plugin");
        Ok(plugin)
    }

    /// Forget every cached stage and rebuild from source.
    pub fn invalidate(&mut self) -> Result<()> {
        for stage in STAGES {
            self.cache.remove(&self.cache_key(stage))?;
        }
        self.build()
    }

    fn build(&mut self) -> Result<()> {
        self.plugins = self.cached("plugins", |this| {
            let sources = plugin_sources(&this.config)?;
            Ok(lando_plugins::discover(&sources))
        })?;

        let fragments = self.fragments();
        // Aliases follow the live config, so only the components are cached.
        let mut registry = self.cached("registry", |_| Ok(Registry::compile(&fragments)))?;
        registry.add_aliases(
            self.config.get_with("core", GetOptions::raw()).as_ref(),
            self.config.get_with("aliases", GetOptions::raw()).as_ref(),
        );
        self.registry = registry;
        self.hooks = self.cached("hooks", |_| Ok(Hooks::compile(&fragments)))?;
        self.tasks = self.cached("tasks", |_| Ok(Tasks::compile(&fragments)))?;

        let mut resolver = ComponentResolver::new(
            self.registry.clone(),
            self.options.loader.clone(),
            self.config.all(),
            self.cache.is_enabled(),
        );
        for (id, loader) in &self.loaders {
            resolver.register_loader(id.clone(), loader.clone());
        }
        self.resolver = resolver;

        tracing::debug!(
            plugins = self.plugins.enabled.len(),
            components = self.registry.len(),
            "Bootstrap complete"
        );
        Ok(())
    }

    /// Configuration fragments, then enabled plugins, lowest priority first.
    fn fragments(&self) -> Vec<Fragment> {
        self.config
            .fragments()
            .into_iter()
            .map(|(origin, tree)| Fragment::new(origin, tree.clone()))
            .chain(self.plugins.enabled.iter().map(Fragment::from_plugin))
            .collect()
    }

    fn cached<T, F>(&self, stage: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Self) -> Result<T>,
    {
        let key = self.cache_key(stage);
        if let Some(value) = self.cache.get_as::<T>(&key) {
            tracing::debug!(key = %key, "Using cached bootstrap stage");
            return Ok(value);
        }
        let value = compute(self)?;
        self.cache.set_as(&key, &value, SetOptions::persistent())?;
        Ok(value)
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("id", &self.id())
            .field("instance", &self.instance)
            .field("cache", &self.cache)
            .field("plugins", &self.plugins.names())
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Read `plugin.dirs` into sources.
fn plugin_sources(config: &Config) -> Result<Vec<PluginSource>> {
    match config.get("plugin.dirs") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| Error::InvalidPluginSources {
            reason: e.to_string(),
        }),
    }
}

fn select_cache(config: &Config) -> Arc<dyn Cache> {
    let enabled = config
        .get("core.caching")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    match config.get("system.cacheDir").and_then(|v| v.as_str().map(PathBuf::from)) {
        Some(dir) => lando_cache::backend(enabled, dir),
        None => {
            tracing::debug!("No cache directory configured, using null cache");
            Arc::new(NullCache)
        }
    }
}

/// Read the instance id, minting and persisting one on first run.
fn instance_id(config: &Config) -> Result<String> {
    let Some(root) = config
        .get("system.userConfRoot")
        .and_then(|v| v.as_str().map(PathBuf::from))
    else {
        return Ok(uuid::Uuid::new_v4().to_string());
    };

    let path = root.join(INSTANCE_FILE);
    if let Some(existing) = lando_fs::io::read_text_opt(&path)? {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    lando_fs::io::write_text(&path, &id)?;
    tracing::debug!(instance = %id, "Created instance id");
    Ok(id)
}
