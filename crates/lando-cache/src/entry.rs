//! Cache entries and write options

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options for [`Cache::set`](crate::Cache::set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Also write the entry to disk.
    pub persist: bool,
    /// Lifetime in seconds; `0` keeps the entry until removed or flushed.
    pub ttl: u64,
}

impl SetOptions {
    /// Options for an entry that should survive the process.
    pub fn persistent() -> Self {
        Self {
            persist: true,
            ttl: 0,
        }
    }

    /// Set the lifetime in seconds.
    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A stored value with its optional expiry.
///
/// This envelope is exactly what lands on disk, one JSON file per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Wrap a value, computing the expiry from `ttl` seconds.
    ///
    /// A ttl past what a timestamp can hold never expires.
    pub fn new(value: Value, ttl: u64) -> Self {
        let expires = (ttl > 0)
            .then(|| {
                i64::try_from(ttl)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            })
            .flatten();
        Self { value, expires }
    }

    /// Whether the entry has outlived its ttl at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| now >= expires)
    }

    /// Whether the entry has outlived its ttl.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_ttl_never_expires() {
        let entry = CacheEntry::new(json!(1), 0);
        assert!(entry.expires.is_none());
        assert!(!entry.is_expired_at(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn ttl_sets_expiry_in_the_future() {
        let entry = CacheEntry::new(json!(1), 60);
        assert!(!entry.is_expired());
        assert!(entry.is_expired_at(Utc::now() + Duration::seconds(61)));
    }

    #[test]
    fn overflowing_ttl_never_expires() {
        for ttl in [u64::MAX, u64::MAX / 4, i64::MAX as u64] {
            let entry = CacheEntry::new(json!(1), ttl);
            assert!(entry.expires.is_none());
            assert!(!entry.is_expired());
        }
    }

    #[test]
    fn envelope_omits_missing_expiry() {
        let entry = CacheEntry::new(json!({"a": 1}), 0);
        let text = serde_json::to_string(&entry).unwrap();
        assert_eq!(text, r#"{"value":{"a":1}}"#);
    }
}
