//! Component resolution: id to memoized, config-stamped class.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use lando_config::codec::decode_key;
use lando_config::{MergeStrategy, merge_values};
use serde_json::{Map, Value};

use crate::component::{Artifact, ComponentClass, ComponentLoader, LoaderFn, Locator};
use crate::registry::Registry;
use crate::{Error, Result};

/// Longest extension chain followed before resolution gives up.
pub const MAX_RESOLUTION_DEPTH: usize = 32;

/// Resolves component ids against a compiled [`Registry`].
///
/// With caching on, each final (alias-resolved) id resolves to the same
/// `Arc` every time, so static configuration set on it sticks. Parents
/// resolved on the way to an extension are never memoized: an extension
/// chain always starts from a fresh copy of its parent.
pub struct ComponentResolver {
    registry: Registry,
    loaders: HashMap<String, LoaderFn>,
    loader: Arc<dyn ComponentLoader>,
    config: Value,
    caching: bool,
    memo: Mutex<HashMap<String, Arc<ComponentClass>>>,
}

impl ComponentResolver {
    /// `config` is the decoded merged configuration used to stamp classes.
    pub fn new(
        registry: Registry,
        loader: Arc<dyn ComponentLoader>,
        config: Value,
        caching: bool,
    ) -> Self {
        Self {
            registry,
            loaders: HashMap::new(),
            loader,
            config,
            caching,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Serve `id` from an in-process loader instead of a registry path.
    pub fn register_loader(&mut self, id: impl Into<String>, loader: LoaderFn) {
        let id = id.into();
        self.memo().remove(&id);
        self.loaders.insert(id, loader);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Drop every memoized class.
    pub fn clear(&self) {
        self.memo().clear();
    }

    /// Resolve `id` to an instantiable class.
    pub fn resolve(&self, id: &str) -> Result<Arc<ComponentClass>> {
        let target = self.registry.resolve_alias(id).to_string();
        if target != id {
            tracing::trace!(id, target = %target, "Following component alias");
        }

        if self.caching {
            if let Some(class) = self.memo().get(&target) {
                tracing::trace!(id = %target, "Component memo hit");
                return Ok(class.clone());
            }
        }

        let class = self.load_class(&target, 0)?;
        if !class.is_instantiable() {
            return Err(Error::NotInstantiable { id: target });
        }
        self.stamp(&target, &class);

        if self.caching {
            self.memo().insert(target.clone(), class.clone());
        }
        tracing::debug!(id = %target, class = class.name(), "Resolved component");
        Ok(class)
    }

    /// Where `id` comes from; in-process loaders win over registry paths.
    pub fn locate(&self, id: &str) -> Result<Locator> {
        if let Some(loader) = self.loaders.get(id) {
            return Ok(Locator::Loader(loader.clone()));
        }
        let path = self
            .registry
            .get(id)
            .map(PathBuf::from)
            .ok_or_else(|| Error::ComponentNotFound { id: id.to_string() })?;
        if !path.exists() {
            return Err(Error::LocatorMissing {
                id: id.to_string(),
                path,
            });
        }
        Ok(Locator::Path(path))
    }

    fn load_class(&self, id: &str, depth: usize) -> Result<Arc<ComponentClass>> {
        if depth >= MAX_RESOLUTION_DEPTH {
            return Err(Error::ResolutionCycle { id: id.to_string() });
        }
        let id = self.registry.resolve_alias(id);

        let artifact = match self.locate(id)? {
            Locator::Loader(loader) => loader()?,
            Locator::Path(path) => self.loader.load(id, &path)?,
        };

        match artifact {
            Artifact::Direct(class) => Ok(Arc::new(class)),
            Artifact::Extended {
                extends,
                get_component,
            } => {
                let parent = self.load_class(&extends, depth + 1)?;
                self.stamp(self.registry.resolve_alias(&extends), &parent);
                tracing::debug!(id, extends = %extends, "Extending component");
                Ok(Arc::new(get_component(parent)?))
            }
            Artifact::Opaque(_) => Err(Error::NotInstantiable { id: id.to_string() }),
        }
    }

    /// Merge system, core and the id's own namespace section into the
    /// class's static configuration.
    ///
    /// The namespace is the last dotted segment of the id, so
    /// `engine.docker-desktop` picks up the `dockerDesktop` section.
    fn stamp(&self, id: &str, class: &ComponentClass) {
        let mut scoped = Map::new();
        for section in ["system", "core"] {
            if let Some(value) = self.config.get(section) {
                scoped.insert(section.to_string(), value.clone());
            }
        }
        let mut overlay = Value::Object(scoped);

        let namespace = decode_key(id.rsplit('.').next().unwrap_or(id));
        if let Some(section) = self.config.get(&namespace).filter(|v| v.is_object()) {
            overlay = merge_values(&overlay, section, &MergeStrategy::Replace);
        }

        class.merge_config(&overlay);
    }

    fn memo(&self) -> MutexGuard<'_, HashMap<String, Arc<ComponentClass>>> {
        self.memo.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ComponentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentResolver")
            .field("components", &self.registry.len())
            .field("loaders", &self.loaders.len())
            .field("caching", &self.caching)
            .finish()
    }
}
