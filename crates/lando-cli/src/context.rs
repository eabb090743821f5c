//! Building the configuration and bootstrap a command runs against

use std::path::PathBuf;

use lando_cache::FileCache;
use lando_config::{Config, ConfigOptions};
use lando_core::{Bootstrap, BootstrapOptions, SystemPaths, defaults_tree};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Product name: env prefix, config directory and cache key prefix.
pub const PRODUCT: &str = "lando";

/// Name of the compiled configuration snapshot inside the cache dir.
pub const SNAPSHOT_FILE: &str = "config.json";

/// Locate the core and user roots from flags, env or the home directory.
pub fn system_paths(cli: &Cli) -> Result<SystemPaths> {
    let core_root = match &cli.core_root {
        Some(root) => root.clone(),
        None => default_core_root()?,
    };
    match &cli.user_conf_root {
        Some(root) => Ok(SystemPaths::in_root(PRODUCT, core_root, root.clone())),
        None => SystemPaths::detect(PRODUCT, core_root)
            .ok_or_else(|| CliError::user("Could not determine the home directory")),
    }
}

fn default_core_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Defaults, then the user's config file, then `LANDO_*` variables.
pub fn load_config(paths: &SystemPaths) -> Result<Config> {
    let mut config = Config::new(ConfigOptions {
        id: PRODUCT.to_string(),
        cached_snapshot_path: Some(paths.cache_dir.join(SNAPSHOT_FILE)),
        base_dir: std::env::current_dir()?,
        ..ConfigOptions::default()
    });
    config.defaults("defaults", defaults_tree(paths));
    config.file("user", paths.user_config_file())?;
    config.env(PRODUCT);
    tracing::debug!(stores = config.stores().len(), "Loaded configuration");
    Ok(config)
}

/// Flush the cache when asked, then bootstrap.
pub fn bootstrap(cli: &Cli) -> Result<Bootstrap> {
    let paths = system_paths(cli)?;
    if cli.clear {
        FileCache::flush_dir(&paths.cache_dir)?;
        tracing::debug!(dir = %paths.cache_dir.display(), "Cleared cache");
    }
    let config = load_config(&paths)?;
    Ok(Bootstrap::new(config, BootstrapOptions::default())?)
}
