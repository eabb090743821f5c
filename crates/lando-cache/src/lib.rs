//! Cache backend for Lando
//!
//! Plugin discovery and registry compilation walk the filesystem and parse
//! dozens of manifests. Their results are stored here so repeated CLI
//! invocations can skip that work. Two interchangeable implementations sit
//! behind the [`Cache`] trait:
//!
//! - [`FileCache`]: an in-memory map backed by one JSON file per key
//! - [`NullCache`]: accepts everything, remembers nothing
//!
//! Callers pick one with [`backend`] and never branch on it again.
//!
//! Misses are soft: a missing, expired or unreadable entry is `None`, and the
//! caller recomputes. Only invalid keys and filesystem failures during writes
//! surface as errors.

pub mod entry;
pub mod error;
pub mod file;
pub mod key;
pub mod null;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use entry::{CacheEntry, SetOptions};
pub use error::{Error, Result};
pub use file::FileCache;
pub use key::validate_key;
pub use null::NullCache;

/// A synchronous key/value cache.
///
/// Every method takes `&self`; implementations handle their own interior
/// mutability so a single backend can be shared behind an `Arc`.
pub trait Cache: Send + Sync + std::fmt::Debug {
    /// Look up an entry, preferring memory over disk.
    fn get(&self, id: &str) -> Option<Value>;

    /// Store an entry in memory and, when `options.persist` is set, on disk.
    fn set(&self, id: &str, value: Value, options: SetOptions) -> Result<()>;

    /// Remove an entry from memory and disk, returning whether it existed.
    fn remove(&self, id: &str) -> Result<bool>;

    /// Drop every entry.
    fn flush(&self) -> Result<()>;

    /// Drop expired entries, returning how many were removed.
    fn sweep(&self) -> Result<usize>;

    /// Whether this backend actually stores anything.
    fn is_enabled(&self) -> bool;
}

/// Typed helpers over any [`Cache`].
pub trait CacheExt: Cache {
    /// Get an entry and deserialize it; a shape mismatch is a miss.
    fn get_as<T: DeserializeOwned>(&self, id: &str) -> Option<T> {
        let value = self.get(id)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::debug!(id, error = %e, "Cached entry has an unexpected shape, ignoring");
                None
            }
        }
    }

    /// Serialize and store an entry.
    fn set_as<T: Serialize>(&self, id: &str, value: &T, options: SetOptions) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Error::Serialize {
            id: id.to_string(),
            source: e,
        })?;
        self.set(id, value, options)
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}

/// Select a backend: a [`FileCache`] rooted at `dir` when caching is
/// enabled, a [`NullCache`] otherwise.
pub fn backend(enabled: bool, dir: impl AsRef<Path>) -> Arc<dyn Cache> {
    if enabled {
        Arc::new(FileCache::new(dir.as_ref()))
    } else {
        tracing::debug!("Caching disabled, using null cache");
        Arc::new(NullCache)
    }
}
