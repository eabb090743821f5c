//! Filesystem primitives for Lando
//!
//! Everything above this crate deals in configuration trees and plugin
//! directories; this crate owns the parts that actually touch the disk:
//!
//! - [`NormalizedPath`]: forward-slash paths with `.`/`..` resolved, used for
//!   every locator string that ends up in a compiled registry
//! - [`io`]: atomic writes and text reads
//! - [`format`]: extension-driven parsing and rendering of YAML, JSON and TOML
//! - [`yaml`]: comment-preserving edits of block-style YAML documents
//! - [`exec`]: running executable descriptors

pub mod error;
pub mod exec;
pub mod format;
pub mod io;
pub mod path;
pub mod yaml;

pub use error::{Error, Result};
pub use exec::run_descriptor;
pub use format::Format;
pub use path::NormalizedPath;
pub use yaml::YamlDocument;
