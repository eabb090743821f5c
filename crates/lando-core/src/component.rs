//! Components, component classes and the artifacts loaders produce.
//!
//! A [`ComponentClass`] plays the part of a class: it has a name, optional
//! parent, a constructor and mutable static configuration. Resolution
//! produces classes; [`instantiate`] turns one into a live [`Component`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lando_cache::Cache;
use lando_config::{MergeStrategy, merge_values};
use serde_json::{Map, Value};

use crate::registry::Registry;
use crate::{Error, Result};

/// What an instance's async initializer is handed.
#[derive(Debug, Clone)]
pub struct InitContext {
    /// The decoded, fully merged configuration.
    pub config: Value,
    pub registry: Registry,
    pub cache: Arc<dyn Cache>,
    /// The class's stamped static configuration.
    pub defaults: Value,
}

/// A live component instance.
#[async_trait]
pub trait Component: Send + Sync {
    /// Async initializer, awaited once right after construction.
    async fn init(&mut self, _ctx: &InitContext) -> Result<()> {
        Ok(())
    }

    /// For downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Builds an instance from its class and constructor arguments.
pub type Constructor =
    Arc<dyn Fn(&ComponentClass, Vec<Value>) -> Result<Box<dyn Component>> + Send + Sync>;

/// Derives a class from its resolved parent.
pub type ExtensionFactory = Arc<dyn Fn(Arc<ComponentClass>) -> Result<ComponentClass> + Send + Sync>;

/// An in-process loader registered in place of a path locator.
pub type LoaderFn = Arc<dyn Fn() -> Result<Artifact> + Send + Sync>;

/// A resolvable component implementation.
pub struct ComponentClass {
    name: String,
    parent: Option<Arc<ComponentClass>>,
    constructor: Option<Constructor>,
    config: RwLock<Value>,
}

impl ComponentClass {
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&ComponentClass, Vec<Value>) -> Result<Box<dyn Component>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parent: None,
            constructor: Some(Arc::new(constructor)),
            config: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// A class that can be extended but never constructed itself.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            constructor: None,
            config: RwLock::new(Value::Object(Map::new())),
        }
    }

    /// A subclass of `parent`, inheriting its constructor and a copy of its
    /// static configuration.
    pub fn extend(name: impl Into<String>, parent: Arc<ComponentClass>) -> Self {
        Self {
            name: name.into(),
            constructor: parent.constructor.clone(),
            config: RwLock::new(parent.config()),
            parent: Some(parent),
        }
    }

    /// Replace the constructor, typically on a class made with [`extend`](Self::extend).
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&ComponentClass, Vec<Value>) -> Result<Box<dyn Component>> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn with_config(self, config: Value) -> Self {
        self.merge_config(&config);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<ComponentClass>> {
        self.parent.as_ref()
    }

    /// This class's name followed by its ancestors'.
    pub fn lineage(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        let mut current = self.parent.as_deref();
        while let Some(class) = current {
            names.push(class.name.as_str());
            current = class.parent.as_deref();
        }
        names
    }

    /// Whether `name` is this class or one of its ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage().contains(&name)
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// A snapshot of the static configuration.
    pub fn config(&self) -> Value {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_config(&self, config: Value) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
    }

    /// Merge `overlay` over the static configuration. `null` is a no-op.
    pub fn merge_config(&self, overlay: &Value) {
        if overlay.is_null() {
            return;
        }
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        *config = merge_values(&config, overlay, &MergeStrategy::Replace);
    }

    /// Run the constructor.
    pub fn construct(&self, args: Vec<Value>) -> Result<Box<dyn Component>> {
        let constructor = self.constructor.as_ref().ok_or_else(|| Error::NotInstantiable {
            id: self.name.clone(),
        })?;
        constructor(self, args)
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// What loading a locator yields.
pub enum Artifact {
    /// A class used as-is.
    Direct(ComponentClass),
    /// A class derived from another component, resolved first.
    Extended {
        extends: String,
        get_component: ExtensionFactory,
    },
    /// Data that is not a class at all.
    Opaque(Value),
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(class) => f.debug_tuple("Direct").field(class).finish(),
            Self::Extended { extends, .. } => {
                f.debug_struct("Extended").field("extends", extends).finish()
            }
            Self::Opaque(value) => f.debug_tuple("Opaque").field(value).finish(),
        }
    }
}

/// Where a component comes from.
#[derive(Clone)]
pub enum Locator {
    Path(std::path::PathBuf),
    Loader(LoaderFn),
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Loader(_) => f.write_str("Loader"),
        }
    }
}

/// Turns a path locator into an artifact.
pub trait ComponentLoader: Send + Sync {
    fn load(&self, id: &str, path: &Path) -> Result<Artifact>;
}

/// Native constructors and extension factories, looked up by name.
#[derive(Default, Clone)]
pub struct ComponentCatalog {
    classes: HashMap<String, Constructor>,
    extensions: HashMap<String, ExtensionFactory>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class<F>(&mut self, name: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&ComponentClass, Vec<Value>) -> Result<Box<dyn Component>> + Send + Sync + 'static,
    {
        self.classes.insert(name.into(), Arc::new(constructor));
        self
    }

    pub fn register_extension<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Arc<ComponentClass>) -> Result<ComponentClass> + Send + Sync + 'static,
    {
        self.extensions.insert(name.into(), Arc::new(factory));
        self
    }

    /// A fresh class for a registered constructor.
    pub fn class(&self, name: &str) -> Option<ComponentClass> {
        self.classes.get(name).map(|constructor| ComponentClass {
            name: name.to_string(),
            parent: None,
            constructor: Some(constructor.clone()),
            config: RwLock::new(Value::Object(Map::new())),
        })
    }

    pub fn extension(&self, name: &str) -> Option<ExtensionFactory> {
        self.extensions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .classes
            .keys()
            .chain(self.extensions.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("names", &self.names())
            .finish()
    }
}

/// Loads YAML or JSON component descriptors against a [`ComponentCatalog`].
///
/// A descriptor names exactly one of:
///
/// - `class: <name>`: a registered constructor
/// - `abstract: <name>`: a constructor-less class, useful as a parent
/// - `extension: <name>` with `extends: <component id>`: a registered
///   extension factory applied to the resolved parent
///
/// An optional `config` object is merged into the class's static
/// configuration. Anything else loads as [`Artifact::Opaque`].
#[derive(Debug, Default, Clone)]
pub struct DescriptorLoader {
    catalog: ComponentCatalog,
}

impl DescriptorLoader {
    pub fn new(catalog: ComponentCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }
}

impl ComponentLoader for DescriptorLoader {
    fn load(&self, id: &str, path: &Path) -> Result<Artifact> {
        let descriptor = lando_fs::format::load_value(path)?;
        let config = descriptor.get("config").cloned().unwrap_or(Value::Null);
        let unknown = |kind: &str, name: &str| Error::UnknownImplementation {
            path: path.to_path_buf(),
            kind: kind.to_string(),
            name: name.to_string(),
        };

        if let Some(name) = descriptor.get("class").and_then(Value::as_str) {
            let class = self.catalog.class(name).ok_or_else(|| unknown("class", name))?;
            tracing::debug!(id, class = name, "Loaded component descriptor");
            return Ok(Artifact::Direct(class.with_config(config)));
        }

        if let Some(name) = descriptor.get("abstract").and_then(Value::as_str) {
            return Ok(Artifact::Direct(
                ComponentClass::abstract_class(name).with_config(config),
            ));
        }

        if let Some(name) = descriptor.get("extension").and_then(Value::as_str) {
            let factory = self
                .catalog
                .extension(name)
                .ok_or_else(|| unknown("extension", name))?;
            let extends = descriptor
                .get("extends")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::InvalidArguments {
                    id: id.to_string(),
                    reason: format!("extension '{name}' has no 'extends' target"),
                })?
                .to_string();
            tracing::debug!(id, extension = name, extends = %extends, "Loaded extension descriptor");
            let get_component: ExtensionFactory =
                Arc::new(move |parent: Arc<ComponentClass>| -> Result<ComponentClass> {
                    Ok(factory(parent)?.with_config(config.clone()))
                });
            return Ok(Artifact::Extended {
                extends,
                get_component,
            });
        }

        Ok(Artifact::Opaque(descriptor))
    }
}

/// Construct `class` and await its initializer.
///
/// Initializer failures surface as [`Error::Init`] naming the class.
/// An array of `args` is spread into the constructor, `null` passes none
/// and anything else is passed as the single argument.
pub async fn instantiate(
    class: &ComponentClass,
    args: Value,
    ctx: &InitContext,
) -> Result<Box<dyn Component>> {
    let args = match args {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    let mut component = class.construct(args)?;
    component.init(ctx).await.map_err(|e| match e {
        Error::Init { .. } => e,
        other => Error::Init {
            id: class.name().to_string(),
            message: other.to_string(),
        },
    })?;
    tracing::debug!(class = class.name(), "Instantiated component");
    Ok(component)
}
