//! Component resolution against a hand-built registry.

use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lando_cache::NullCache;
use lando_core::{
    Artifact, Component, ComponentCatalog, ComponentClass, ComponentResolver, DescriptorLoader,
    Error, InitContext, Registry, Result, instantiate,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::TempDir;

struct Engine {
    args: Vec<Value>,
    defaults: Value,
    initialized: bool,
}

#[async_trait]
impl Component for Engine {
    async fn init(&mut self, ctx: &InitContext) -> Result<()> {
        self.defaults = ctx.defaults.clone();
        self.initialized = true;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn engine(_: &ComponentClass, args: Vec<Value>) -> Result<Box<dyn Component>> {
    Ok(Box::new(Engine {
        args,
        defaults: Value::Null,
        initialized: false,
    }))
}

fn catalog() -> ComponentCatalog {
    let mut catalog = ComponentCatalog::new();
    catalog
        .register_class("engine", engine)
        .register_extension("installer", |parent| {
            Ok(ComponentClass::extend("installer", parent).with_config(json!({"installs": true})))
        })
        .register_extension("loop", |parent| Ok(ComponentClass::extend("loop", parent)));
    catalog
}

/// Descriptor files in a temp dir, registered under their ids.
struct Fixture {
    dir: TempDir,
    registry: Registry,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            registry: Registry::new(),
        }
    }

    fn component(mut self, id: &str, descriptor: &str) -> Self {
        let path = self.dir.path().join(format!("{id}.yml"));
        fs::write(&path, descriptor).unwrap();
        self.registry.register(id, path.to_string_lossy());
        self
    }

    fn resolver(&self, config: Value, caching: bool) -> ComponentResolver {
        ComponentResolver::new(
            self.registry.clone(),
            Arc::new(DescriptorLoader::new(catalog())),
            config,
            caching,
        )
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn engines() -> Fixture {
    Fixture::new()
        .component("engine", "class: engine\nconfig:\n  port: 80\n")
        .component("engine-installer", "extension: installer\nextends: engine\n")
}

#[test]
fn test_extension_wraps_its_resolved_parent() {
    let fixture = engines();
    let resolver = fixture.resolver(json!({}), true);

    let installer = resolver.resolve("engine-installer").unwrap();
    assert_eq!(installer.lineage(), vec!["installer", "engine"]);
    assert_eq!(installer.config(), json!({"port": 80, "installs": true}));
    assert!(installer.is_instantiable());
}

#[test]
fn test_extended_parent_resolves_to_itself_afterwards() {
    let fixture = engines();
    let resolver = fixture.resolver(json!({}), true);

    let installer = resolver.resolve("engine-installer").unwrap();
    let engine = resolver.resolve("engine").unwrap();

    assert_eq!(engine.name(), "engine");
    assert!(engine.parent().is_none());
    assert_eq!(engine.config(), json!({"port": 80}));
    assert!(!Arc::ptr_eq(&engine, installer.parent().unwrap()));
}

#[rstest]
#[case::caching(true, true)]
#[case::no_caching(false, false)]
fn test_memoization_follows_caching(#[case] caching: bool, #[case] same: bool) {
    let fixture = engines();
    let resolver = fixture.resolver(json!({}), caching);

    let first = resolver.resolve("engine").unwrap();
    first.set_config(json!({"mutated": true}));
    let second = resolver.resolve("engine").unwrap();

    assert_eq!(Arc::ptr_eq(&first, &second), same);
    assert_eq!(second.config().get("mutated").is_some(), same);
}

#[test]
fn test_aliases_share_the_memoized_target() {
    let mut fixture = engines();
    fixture.registry.alias("core.engine", "engine");
    let resolver = fixture.resolver(json!({}), true);

    let aliased = resolver.resolve("core.engine").unwrap();
    let direct = resolver.resolve("engine").unwrap();
    assert!(Arc::ptr_eq(&aliased, &direct));
}

#[test]
fn test_stamp_merges_system_core_and_namespace() {
    let fixture = Fixture::new().component("engine.docker-desktop", "class: engine\n");
    let resolver = fixture.resolver(
        json!({
            "system": {"product": "lando"},
            "core": {"engine": "docker-desktop"},
            "dockerDesktop": {"socket": "/var/run/docker.sock"},
            "unrelated": {"x": 1}
        }),
        true,
    );

    let class = resolver.resolve("engine.docker-desktop").unwrap();
    assert_eq!(
        class.config(),
        json!({
            "system": {"product": "lando"},
            "core": {"engine": "docker-desktop"},
            "socket": "/var/run/docker.sock"
        })
    );
}

#[test]
fn test_unknown_component_names_the_id_and_suggests_clear() {
    let resolver = Fixture::new().resolver(json!({}), true);
    let err = resolver.resolve("nope").unwrap_err();

    assert!(matches!(&err, Error::ComponentNotFound { id } if id == "nope"));
    let message = err.to_string();
    assert!(message.contains("'nope'"));
    assert!(message.contains("--clear"));
}

#[test]
fn test_missing_locator_file_is_reported() {
    let mut fixture = Fixture::new();
    let missing = fixture.path().join("gone.yml");
    fixture.registry.register("gone", missing.to_string_lossy());
    let resolver = fixture.resolver(json!({}), true);

    let err = resolver.resolve("gone").unwrap_err();
    assert!(matches!(err, Error::LocatorMissing { id, path } if id == "gone" && path == missing));
}

#[rstest]
#[case::abstract_class("abstract: base\n")]
#[case::plain_data("name: just data\n")]
fn test_non_class_artifacts_are_rejected(#[case] descriptor: &str) {
    let fixture = Fixture::new().component("thing", descriptor);
    let resolver = fixture.resolver(json!({}), true);

    let err = resolver.resolve("thing").unwrap_err();
    assert!(matches!(err, Error::NotInstantiable { id } if id == "thing"));
}

#[test]
fn test_abstract_parent_can_be_extended() {
    let mut catalog = catalog();
    catalog.register_extension("concrete", |parent| {
        Ok(ComponentClass::extend("concrete", parent).with_constructor(engine))
    });
    let fixture = Fixture::new()
        .component("base", "abstract: base\nconfig:\n  shared: true\n")
        .component("impl", "extension: concrete\nextends: base\n");
    let resolver = ComponentResolver::new(
        fixture.registry.clone(),
        Arc::new(DescriptorLoader::new(catalog)),
        json!({}),
        true,
    );

    let class = resolver.resolve("impl").unwrap();
    assert!(class.is_a("base"));
    assert_eq!(class.config(), json!({"shared": true}));
}

#[test]
fn test_extension_cycles_fail() {
    let fixture = Fixture::new()
        .component("a", "extension: loop\nextends: b\n")
        .component("b", "extension: loop\nextends: a\n");
    let resolver = fixture.resolver(json!({}), true);

    assert!(matches!(
        resolver.resolve("a").unwrap_err(),
        Error::ResolutionCycle { .. }
    ));
}

#[test]
fn test_in_process_loader_needs_no_registry_entry() {
    let mut resolver = Fixture::new().resolver(json!({}), true);
    resolver.register_loader(
        "inline",
        Arc::new(|| Ok(Artifact::Direct(ComponentClass::new("inline", engine)))),
    );

    assert_eq!(resolver.resolve("inline").unwrap().name(), "inline");
}

#[rstest]
#[case::spread(json!([1, "two"]), vec![json!(1), json!("two")])]
#[case::single(json!({"a": 1}), vec![json!({"a": 1})])]
#[case::none(Value::Null, vec![])]
#[tokio::test]
async fn test_instantiate_spreads_arguments_and_awaits_init(
    #[case] args: Value,
    #[case] expected: Vec<Value>,
) {
    let fixture = engines();
    let resolver = fixture.resolver(json!({}), true);
    let class = resolver.resolve("engine").unwrap();
    let ctx = InitContext {
        config: json!({}),
        registry: resolver.registry().clone(),
        cache: Arc::new(NullCache),
        defaults: class.config(),
    };

    let component = instantiate(&class, args, &ctx).await.unwrap();
    let engine = component.as_any().downcast_ref::<Engine>().unwrap();
    assert!(engine.initialized);
    assert_eq!(engine.args, expected);
    assert_eq!(engine.defaults, json!({"port": 80}));
}

struct Broken;

#[async_trait]
impl Component for Broken {
    async fn init(&mut self, _ctx: &InitContext) -> Result<()> {
        Err(Error::InvalidArguments {
            id: "broken".into(),
            reason: "socket unavailable".into(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn broken(_: &ComponentClass, _: Vec<Value>) -> Result<Box<dyn Component>> {
    Ok(Box::new(Broken))
}

#[tokio::test]
async fn test_init_failure_names_the_class() {
    let class = ComponentClass::new("broken", broken);
    let ctx = InitContext {
        config: json!({}),
        registry: Registry::new(),
        cache: Arc::new(NullCache),
        defaults: json!({}),
    };

    let err = instantiate(&class, Value::Null, &ctx).await.err().unwrap();
    match err {
        Error::Init { id, message } => {
            assert_eq!(id, "broken");
            assert!(message.contains("socket unavailable"));
        }
        other => panic!("expected init error, got {other}"),
    }
}
