//! Shared test utilities for the Lando workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`home`]: [`TestLando`], a temporary product layout (core root, user
//!   config root, cache dir, app root)
//! - [`plugin`]: [`PluginFixture`] builder for plugin directories

pub mod home;
pub mod plugin;

pub use home::TestLando;
pub use plugin::PluginFixture;
