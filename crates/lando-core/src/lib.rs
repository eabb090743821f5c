//! Registry compilation, component resolution and bootstrap for Lando
//!
//! This crate ties the lower layers together:
//!
//! - [`Fragment`] pairs a store or plugin manifest with its origin and
//!   resolves relative locators against it
//! - [`Registry`], [`Hooks`] and [`Tasks`] fold fragments, lowest priority first
//! - [`ComponentResolver`] turns component ids into memoized
//!   [`ComponentClass`]es, including classes that extend another component
//!   chosen at configuration time
//! - [`Bootstrap`] runs discovery and compilation once, caches every stage
//!   and exposes [`Bootstrap::instantiate_component`]
//!
//! Everything is synchronous except component initialization and plugin
//! installation.

pub mod bootstrap;
pub mod component;
pub mod defaults;
pub mod error;
pub mod fragment;
pub mod hooks;
pub mod registry;
pub mod resolver;

pub use bootstrap::{Bootstrap, BootstrapOptions, PluginInstaller};
pub use component::{
    Artifact, Component, ComponentCatalog, ComponentClass, ComponentLoader, Constructor,
    DescriptorLoader, ExtensionFactory, InitContext, LoaderFn, Locator, instantiate,
};
pub use defaults::{SystemPaths, defaults_tree};
pub use error::{Error, Result};
pub use fragment::Fragment;
pub use hooks::{Hooks, Tasks};
pub use registry::Registry;
pub use resolver::ComponentResolver;
