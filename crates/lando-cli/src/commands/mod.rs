//! Command implementations for lando-cli

pub mod component;
pub mod config;
pub mod plugins;
pub mod registry;

pub use component::run_component;
pub use config::run_config;
pub use plugins::run_plugins;
pub use registry::run_registry;
