//! End-to-end bootstrap over a temporary installation.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lando_cache::Cache;
use lando_config::{Config, ConfigOptions};
use lando_core::{
    Bootstrap, BootstrapOptions, Component, ComponentCatalog, ComponentClass, DescriptorLoader,
    Error, InitContext, PluginInstaller, Result, SystemPaths, defaults_tree,
};
use lando_fs::NormalizedPath;
use lando_test_utils::{PluginFixture, TestLando};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

struct Engine {
    flavor: Value,
    product: Value,
}

#[async_trait]
impl Component for Engine {
    async fn init(&mut self, ctx: &InitContext) -> Result<()> {
        self.flavor = ctx.defaults["flavor"].clone();
        self.product = ctx.config["system"]["product"].clone();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn options() -> BootstrapOptions {
    let mut catalog = ComponentCatalog::new();
    catalog.register_class("engine", |_: &ComponentClass, _| {
        Ok(Box::new(Engine {
            flavor: Value::Null,
            product: Value::Null,
        }) as Box<dyn Component>)
    });
    BootstrapOptions {
        loader: Arc::new(DescriptorLoader::new(catalog)),
    }
}

fn paths(lando: &TestLando) -> SystemPaths {
    SystemPaths::in_root("lando", lando.core_root(), lando.user_conf_root())
}

fn config(lando: &TestLando) -> Config {
    let mut config = Config::new(ConfigOptions {
        base_dir: lando.root().to_path_buf(),
        ..ConfigOptions::default()
    });
    config.defaults("defaults", defaults_tree(&paths(lando)));
    config
        .file("user", lando.user_conf_root().join("config.yml"))
        .unwrap();
    config
}

/// A core plugin providing both engines, a hook and a task.
fn engines_plugin(lando: &TestLando) -> PluginFixture {
    PluginFixture::new(&lando.core_plugins(), "engines")
        .with_yaml(
            "registry:\n  engine.docker-desktop: ./desktop.yml\n  engine.docker-engine: ./engine.yml\n\
             hooks:\n  post-start: ./hooks/ready.yml\n\
             tasks:\n  start: ./tasks/start.yml\n",
        )
        .with_file("desktop.yml", "class: engine\nconfig:\n  flavor: desktop\n")
        .with_file("engine.yml", "class: engine\nconfig:\n  flavor: engine\n")
}

fn bootstrap(lando: &TestLando) -> Bootstrap {
    Bootstrap::new(config(lando), options()).unwrap()
}

#[test]
fn test_default_engine_resolves_through_core_alias() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    let bootstrap = bootstrap(&lando);

    assert_eq!(bootstrap.plugins().names(), vec!["engines"]);
    assert_eq!(
        bootstrap.registry().resolve_alias("core.engine"),
        "engine.docker-desktop"
    );
    let class = bootstrap.get_component("core.engine").unwrap();
    assert_eq!(class.config()["flavor"], "desktop");
    assert_eq!(class.config()["core"]["engine"], "docker-desktop");
}

#[test]
fn test_user_config_switches_the_engine() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    lando.write_user_config("core:\n  engine: docker-engine\n");
    let bootstrap = bootstrap(&lando);

    let class = bootstrap.get_component("core.engine").unwrap();
    assert_eq!(class.config()["flavor"], "engine");
}

#[test]
fn test_engine_switch_applies_over_a_warm_cache() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    let first = bootstrap(&lando);
    assert_eq!(first.get_component("core.engine").unwrap().config()["flavor"], "desktop");
    lando.assert_file_exists("home/.lando/cache/lando.registry");

    lando.write_user_config("core:\n  engine: docker-engine\n");
    let second = bootstrap(&lando);

    assert!(second.cache().is_enabled());
    assert_eq!(
        second.registry().resolve_alias("core.engine"),
        "engine.docker-engine"
    );
    assert_eq!(second.get_component("core.engine").unwrap().config()["flavor"], "engine");
}

#[test]
fn test_plugin_locators_are_absolute() {
    let lando = TestLando::new();
    let plugin = engines_plugin(&lando);
    let bootstrap = bootstrap(&lando);

    let expected = |rel: &str| NormalizedPath::new(plugin.root().join(rel)).as_str().to_string();
    assert_eq!(
        bootstrap.registry().get("engine.docker-engine"),
        Some(expected("engine.yml").as_str())
    );
    assert_eq!(bootstrap.hooks().get("post-start"), &[expected("hooks/ready.yml")]);
    assert_eq!(bootstrap.tasks().get("start"), Some(expected("tasks/start.yml").as_str()));
}

#[tokio::test]
async fn test_instantiate_component_runs_init_with_context() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    let bootstrap = bootstrap(&lando);

    let component = bootstrap
        .instantiate_component("core.engine", Value::Null)
        .await
        .unwrap();
    let engine = component.as_any().downcast_ref::<Engine>().unwrap();
    assert_eq!(engine.flavor, "desktop");
    assert_eq!(engine.product, "lando");
}

#[test]
fn test_missing_component_suggests_clear() {
    let lando = TestLando::new();
    let bootstrap = bootstrap(&lando);

    let err = bootstrap.get_component("core.engine").unwrap_err();
    assert!(matches!(err, Error::ComponentNotFound { .. }));
    assert!(err.to_string().contains("--clear"));
}

#[test]
fn test_stages_are_cached_until_invalidated() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    let first = bootstrap(&lando);
    for stage in ["plugins", "registry", "hooks", "tasks"] {
        lando.assert_file_exists(&format!("home/.lando/cache/lando.{stage}"));
    }
    assert_eq!(first.cache_key("plugins"), "lando.plugins");

    PluginFixture::new(&lando.user_plugins(), "extra").with_yaml("name: extra\n");
    let mut second = bootstrap(&lando);
    assert_eq!(second.plugins().names(), vec!["engines"]);

    second.invalidate().unwrap();
    assert_eq!(second.plugins().names(), vec!["engines", "extra"]);
}

#[test]
fn test_disabled_caching_writes_nothing_and_skips_memo() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    lando.write_user_config("core:\n  caching: false\n");
    let bootstrap = bootstrap(&lando);

    assert!(!bootstrap.cache().is_enabled());
    lando.assert_file_not_exists("home/.lando/cache/lando.plugins");
    let first = bootstrap.get_component("core.engine").unwrap();
    let second = bootstrap.get_component("core.engine").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_memoized_component_keeps_static_changes() {
    let lando = TestLando::new();
    engines_plugin(&lando);
    let bootstrap = bootstrap(&lando);

    bootstrap
        .get_component("core.engine")
        .unwrap()
        .merge_config(&json!({"patched": true}));
    assert_eq!(
        bootstrap.get_component("engine.docker-desktop").unwrap().config()["patched"],
        true
    );
}

#[test]
fn test_instance_id_is_persisted() {
    let lando = TestLando::new();
    let first = bootstrap(&lando);
    let second = bootstrap(&lando);

    assert_eq!(first.instance(), second.instance());
    assert!(uuid_like(first.instance()));
    lando.assert_file_exists("home/.lando/instance");
}

fn uuid_like(id: &str) -> bool {
    id.len() == 36 && id.chars().filter(|c| *c == '-').count() == 4
}

#[test]
fn test_remove_plugin_deletes_and_rebuilds() {
    let lando = TestLando::new();
    let plugin = engines_plugin(&lando);
    let mut bootstrap = bootstrap(&lando);

    let removed = bootstrap.remove_plugin("engines").unwrap();
    assert_eq!(removed.root, plugin.root());
    assert!(!plugin.root().exists());
    assert!(bootstrap.plugins().is_empty());
    assert!(bootstrap.registry().is_empty());

    let err = bootstrap.remove_plugin("engines").unwrap_err();
    assert!(matches!(
        err,
        Error::Plugins(lando_plugins::Error::UnknownPlugin(name)) if name == "engines"
    ));
}

struct FixtureInstaller;

#[async_trait]
impl PluginInstaller for FixtureInstaller {
    async fn install(
        &self,
        source: &str,
        dest: &Path,
    ) -> std::result::Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
        if source == "broken" {
            return Err("registry unreachable".into());
        }
        let plugin = PluginFixture::new(dest, source).with_yaml(&format!("name: {source}\n"));
        Ok(plugin.root().to_path_buf())
    }
}

#[tokio::test]
async fn test_install_plugin_invalidates_discovery() {
    let lando = TestLando::new();
    let mut bootstrap = bootstrap(&lando);
    assert!(bootstrap.plugins().is_empty());

    let plugin = bootstrap
        .install_plugin(&FixtureInstaller, "php", &lando.user_plugins())
        .await
        .unwrap();

    assert_eq!(plugin.name, "php");
    assert_eq!(bootstrap.plugins().names(), vec!["php"]);
}

#[tokio::test]
async fn test_install_failure_propagates() {
    let lando = TestLando::new();
    let mut bootstrap = bootstrap(&lando);

    let err = bootstrap
        .install_plugin(&FixtureInstaller, "broken", &lando.user_plugins())
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Install { source_ref, .. } if source_ref == "broken"));
    assert!(err.to_string().contains("registry unreachable"));
}

#[test]
fn test_invalid_plugin_sources_are_reported() {
    let lando = TestLando::new();
    let mut config = config(&lando);
    config.overrides("broken", json!({"plugin": {"dirs": "not-a-list"}}));

    let err = Bootstrap::new(config, options()).unwrap_err();
    assert!(matches!(err, Error::InvalidPluginSources { .. }));
}
