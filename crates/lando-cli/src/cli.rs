//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lando - inspect configuration, plugins and components
#[derive(Parser, Debug)]
#[command(name = "lando")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Flush the cache before doing anything else
    #[arg(long, global = true)]
    pub clear: bool,

    /// Core installation root; bundled plugins live in its plugins/ dir
    #[arg(long, global = true, env = "LANDO_CORE_ROOT", hide = true)]
    pub core_root: Option<PathBuf>,

    /// User configuration root (defaults to ~/.lando)
    #[arg(long, global = true, env = "LANDO_USER_CONF_ROOT", hide = true)]
    pub user_conf_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print merged configuration
    ///
    /// Examples:
    ///   lando config                   # everything
    ///   lando config core.engine       # one value
    ///   lando config core --store user # one store only
    Config {
        /// Dotted path to read
        path: Option<String>,

        /// Read a single store instead of the merged view
        #[arg(long)]
        store: Option<String>,
    },

    /// List discovered plugins
    Plugins,

    /// List registered components and aliases
    Registry,

    /// Resolve a component id
    Component {
        /// Component id or alias, e.g. core.engine
        id: String,
    },
}
