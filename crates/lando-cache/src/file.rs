//! Memory plus on-disk cache

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::{Cache, CacheEntry, Result, SetOptions, validate_key};
use lando_fs::io;

/// A cache held in memory and mirrored to `<dir>/<key>` JSON files.
///
/// Memory always wins on `get`; disk is only consulted on a miss, which is
/// the cold-start case for a fresh process. There is no file locking across
/// processes: concurrent writers race and the last one wins, which is fine
/// because every entry can be rebuilt from source.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    memory: Mutex<HashMap<String, CacheEntry>>,
}

impl FileCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// the first persisted write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// The directory persisted entries live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete and recreate a cache directory without an instance.
    ///
    /// This is what `--clear` runs before any backend is constructed.
    pub fn flush_dir(dir: impl AsRef<Path>) -> Result<()> {
        tracing::debug!(dir = %dir.as_ref().display(), "Flushing cache directory");
        io::recreate_dir(dir)?;
        Ok(())
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned map only means another thread panicked mid-insert;
        // the data is still a valid cache.
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_disk(&self, id: &str) -> Option<CacheEntry> {
        let path = self.entry_path(id);
        let content = match io::read_text_opt(&path) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(id, error = %e, "Could not read cache file, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(id, error = %e, "Corrupt cache file, treating as miss");
                None
            }
        }
    }
}

impl Cache for FileCache {
    fn get(&self, id: &str) -> Option<Value> {
        if let Err(e) = validate_key(id) {
            tracing::debug!(error = %e, "Rejected cache lookup");
            return None;
        }

        let mut memory = self.memory();
        if let Some(entry) = memory.get(id) {
            if !entry.is_expired() {
                tracing::trace!(id, "Cache hit (memory)");
                return Some(entry.value.clone());
            }
            memory.remove(id);
            let _ = io::remove_file_if_exists(self.entry_path(id));
            tracing::debug!(id, "Cache entry expired");
            return None;
        }

        let entry = self.read_disk(id)?;
        if entry.is_expired() {
            let _ = io::remove_file_if_exists(self.entry_path(id));
            tracing::debug!(id, "Cache entry on disk expired");
            return None;
        }

        tracing::trace!(id, "Cache hit (disk)");
        let value = entry.value.clone();
        memory.insert(id.to_string(), entry);
        Some(value)
    }

    fn set(&self, id: &str, value: Value, options: SetOptions) -> Result<()> {
        validate_key(id)?;

        let entry = CacheEntry::new(value, options.ttl);
        if options.persist {
            let content = serde_json::to_string(&entry).map_err(|e| crate::Error::Serialize {
                id: id.to_string(),
                source: e,
            })?;
            io::write_text(self.entry_path(id), &content)?;
        }

        tracing::debug!(id, persist = options.persist, ttl = options.ttl, "Cached entry");
        self.memory().insert(id.to_string(), entry);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        validate_key(id)?;
        let in_memory = self.memory().remove(id).is_some();
        let on_disk = io::remove_file_if_exists(self.entry_path(id))?;
        Ok(in_memory || on_disk)
    }

    fn flush(&self) -> Result<()> {
        Self::flush_dir(&self.dir)?;
        self.memory().clear();
        Ok(())
    }

    fn sweep(&self) -> Result<usize> {
        let expired: Vec<String> = {
            let mut memory = self.memory();
            let names = memory
                .iter()
                .filter(|(_, entry)| entry.is_expired())
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>();
            for id in &names {
                memory.remove(id);
            }
            names
        };
        let mut removed = expired.len();

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(removed),
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_key(&name).is_err() {
                continue;
            }
            if self.read_disk(&name).is_some_and(|e| e.is_expired())
                && io::remove_file_if_exists(entry.path())?
                && !expired.contains(&name)
            {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "Swept expired cache entries");
        }
        Ok(removed)
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
