//! End-to-end scenarios across the whole stack
//!
//! Configuration stores feed plugin discovery, plugins feed the registry and
//! the registry feeds component resolution.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use lando_cache::{Cache, FileCache, SetOptions};
use lando_config::{Config, ConfigOptions, MergeStrategy};
use lando_core::{
    Bootstrap, BootstrapOptions, Component, ComponentCatalog, ComponentClass, DescriptorLoader,
    InitContext, Result, SystemPaths, defaults_tree,
};
use lando_plugins::{PluginSource, PluginType, discover};
use lando_test_utils::{PluginFixture, TestLando};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

#[test]
fn test_user_file_overrides_default_engine() {
    let lando = TestLando::new();
    let mut config = Config::default();
    config.defaults("defaults", json!({"core": {"engine": "docker-desktop"}}));
    assert_eq!(config.get("core.engine"), Some(json!("docker-desktop")));

    let user = lando.write_user_config("core:\n  engine: docker-engine\n");
    config.file("user", &user).unwrap();
    assert_eq!(config.get("core.engine"), Some(json!("docker-engine")));
}

#[test]
fn test_unmarked_package_is_only_invalid() {
    let lando = TestLando::new();
    PluginFixture::new(&lando.user_plugins(), "not-a-plugin")
        .with_package(json!({"name": "not-a-plugin", "version": "1.0.0"}));

    let set = discover(&[PluginSource::dir(
        "user",
        lando.user_plugins(),
        2,
        0,
        PluginType::User,
    )]);

    assert!(set.enabled.is_empty());
    assert!(set.disabled.is_empty());
    assert_eq!(set.invalid.len(), 1);
    assert!(!set.invalid[0].is_valid);
}

#[test]
fn test_app_plugin_shadows_global_plugin() {
    let lando = TestLando::new();
    let global = lando.root().join("global");
    let app = lando.app_root().join("plugins");
    PluginFixture::new(&global, "foo").with_yaml("name: foo\n");
    let local = PluginFixture::new(&app, "foo").with_yaml("name: foo\n");

    let set = discover(&[
        PluginSource::dir("app", &app, 2, 10, PluginType::App),
        PluginSource::dir("global", &global, 2, 0, PluginType::Global),
    ]);

    assert_eq!(set.names(), vec!["foo"]);
    assert_eq!(set.get("foo").unwrap().root, local.root());
}

#[test]
fn test_merge_strategy_applies_across_stores() {
    let mut config = Config::new(ConfigOptions {
        strategy: MergeStrategy::merge_by_id(),
        ..ConfigOptions::default()
    });
    config
        .defaults("defaults", json!({"services": [{"id": "web", "port": 80}, {"id": "db"}]}))
        .overrides("app", json!({"services": [{"id": "web", "port": 8080}, {"id": "cache"}]}));

    assert_eq!(
        config.get("services"),
        Some(json!([
            {"id": "web", "port": 8080},
            {"id": "db"},
            {"id": "cache"}
        ]))
    );
}

#[test]
fn test_cache_survives_a_new_process() {
    let lando = TestLando::new();
    let first = FileCache::new(lando.cache_dir());
    first
        .set("lando.registry", json!({"a": 1}), SetOptions::persistent())
        .unwrap();

    let second = FileCache::new(lando.cache_dir());
    assert_eq!(second.get("lando.registry"), Some(json!({"a": 1})));
}

struct Installer {
    engine: String,
}

#[async_trait]
impl Component for Installer {
    async fn init(&mut self, ctx: &InitContext) -> Result<()> {
        self.engine = ctx.defaults["core"]["engine"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn options() -> BootstrapOptions {
    let mut catalog = ComponentCatalog::new();
    catalog
        .register_class("desktop", |_: &ComponentClass, _| {
            Ok(Box::new(Installer {
                engine: String::new(),
            }) as Box<dyn Component>)
        })
        .register_class("engine", |_: &ComponentClass, _| {
            Ok(Box::new(Installer {
                engine: String::new(),
            }) as Box<dyn Component>)
        })
        .register_extension("installer", |parent| {
            let name = format!("{}-installer", parent.name());
            Ok(ComponentClass::extend(name, parent))
        });
    BootstrapOptions {
        loader: Arc::new(DescriptorLoader::new(catalog)),
    }
}

fn lando_config(lando: &TestLando) -> Config {
    let paths = SystemPaths::in_root("lando", lando.core_root(), lando.user_conf_root());
    let mut config = Config::new(ConfigOptions {
        base_dir: lando.root().to_path_buf(),
        ..ConfigOptions::default()
    });
    config.defaults("defaults", defaults_tree(&paths));
    config.file("user", paths.user_config_file()).unwrap();
    config
}

fn install_engines(lando: &TestLando) {
    PluginFixture::new(&lando.core_plugins(), "engines")
        .with_yaml(
            "registry:\n  engine.docker-desktop: ./desktop.yml\n  engine.docker-engine: ./engine.yml\n",
        )
        .with_file("desktop.yml", "class: desktop\n")
        .with_file("engine.yml", "class: engine\n");
    PluginFixture::new(&lando.user_plugins(), "setup")
        .with_yaml("registry:\n  installer: ./installer.yml\n")
        .with_file("installer.yml", "extension: installer\nextends: core.engine\n");
}

#[tokio::test]
async fn test_installer_extends_whichever_engine_is_configured() {
    let lando = TestLando::new();
    install_engines(&lando);

    let bootstrap = Bootstrap::new(lando_config(&lando), options()).unwrap();
    let class = bootstrap.get_component("installer").unwrap();
    assert_eq!(class.lineage(), vec!["desktop-installer", "desktop"]);

    let component = bootstrap
        .instantiate_component("installer", Value::Null)
        .await
        .unwrap();
    let installer = component.as_any().downcast_ref::<Installer>().unwrap();
    assert_eq!(installer.engine, "docker-desktop");

    lando.write_user_config("core:\n  engine: docker-engine\n");
    let bootstrap = Bootstrap::new(lando_config(&lando), options()).unwrap();
    assert!(bootstrap.cache().is_enabled());
    assert_eq!(bootstrap.registry().resolve_alias("core.engine"), "engine.docker-engine");
    let class = bootstrap.get_component("installer").unwrap();
    assert_eq!(class.lineage(), vec!["engine-installer", "engine"]);
}
