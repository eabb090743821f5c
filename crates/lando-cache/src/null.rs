//! The disabled cache

use serde_json::Value;

use crate::{Cache, Result, SetOptions};

/// A cache that stores nothing.
///
/// Used when caching is disabled so callers keep a single code path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl Cache for NullCache {
    fn get(&self, _id: &str) -> Option<Value> {
        None
    }

    fn set(&self, _id: &str, _value: Value, _options: SetOptions) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _id: &str) -> Result<bool> {
        Ok(false)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn sweep(&self) -> Result<usize> {
        Ok(0)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_cache_forgets_everything() {
        let cache = NullCache;
        cache.set("anything", json!(1), SetOptions::persistent()).unwrap();
        assert!(cache.get("anything").is_none());
        assert!(!cache.remove("anything").unwrap());
        assert!(!cache.is_enabled());
    }
}
