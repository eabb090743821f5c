//! Named configuration stores

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{Config, Result};

/// A native descriptor: computes a tree from the configuration built so far.
pub type DescriptorFn = Arc<dyn Fn(&Config) -> Result<Value> + Send + Sync>;

/// What kind of source a store reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Literal,
    File,
    Environment,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Literal => "literal",
            Self::File => "file",
            Self::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// Where a store's data comes from and how `reset` reloads it.
#[derive(Clone)]
pub(crate) enum Source {
    Memory,
    Literal,
    File(PathBuf),
    Environment {
        prefix: String,
        /// Injected variables; `None` reads the process environment.
        vars: Option<BTreeMap<String, String>>,
    },
    Descriptor(DescriptorFn),
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "Memory"),
            Self::Literal => write!(f, "Literal"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Environment { prefix, .. } => {
                f.debug_struct("Environment").field("prefix", prefix).finish()
            }
            Self::Descriptor(_) => write!(f, "Descriptor"),
        }
    }
}

/// One named source within a [`Config`].
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) name: String,
    pub(crate) source: Source,
    pub(crate) data: Value,
}

impl Store {
    pub(crate) fn new(name: impl Into<String>, source: Source, data: Value) -> Self {
        Self {
            name: name.into(),
            source,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StoreKind {
        match self.source {
            Source::Memory => StoreKind::Memory,
            Source::Literal | Source::Descriptor(_) => StoreKind::Literal,
            Source::File(_) => StoreKind::File,
            Source::Environment { .. } => StoreKind::Environment,
        }
    }

    /// The backing file, for file stores.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path),
            _ => None,
        }
    }

    /// The store's tree in its stored (encoded) form.
    pub fn data(&self) -> &Value {
        &self.data
    }
}
