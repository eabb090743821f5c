//! Layered configuration for Lando
//!
//! A [`Config`] is an ordered stack of named [`Store`]s (defaults, files,
//! environment, in-memory overrides) merged on every read. Keys are
//! kebab-case at rest and camelCase when read back through [`codec`];
//! arrays combine according to a [`MergeStrategy`].
//!
//! ```
//! use lando_config::Config;
//! use serde_json::json;
//!
//! let mut config = Config::default();
//! config.defaults("defaults", json!({"core": {"engine": "docker-desktop"}}));
//! config.overrides("overrides", json!({"core": {"engine": "docker-engine"}}));
//!
//! assert_eq!(config.get("core.engine"), Some(json!("docker-engine")));
//! ```

pub mod codec;
pub mod config;
pub mod env;
pub mod error;
pub mod merge;
pub mod path;
pub mod store;

pub use config::{Config, ConfigOptions, GetOptions};
pub use error::{Error, Result};
pub use merge::{MergeStrategy, merge_arrays, merge_into, merge_values};
pub use path::keys;
pub use store::{DescriptorFn, Store, StoreKind};
