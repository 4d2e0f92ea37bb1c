//! Process-local TTL cache backed by [`DashMap`].
//!
//! Entries expire lazily: a read that finds an expired entry removes it. A
//! background sweeper started with [`TtlCache::start_sweeper`] evicts entries
//! that are never read again, so memory stays bounded. The sweeper is not
//! needed for correctness.
//!
//! Timestamps use [`tokio::time::Instant`], so tests can drive expiry with a
//! paused clock.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A cached value with its insertion time and time-to-live.
#[derive(Clone, Debug)]
pub struct CachedEntry<V> {
    pub value: V,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl<V> CachedEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is expired once its age reaches its ttl.
    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() >= self.ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub sweeper_running: bool,
}

/// String-keyed cache whose entries carry individual TTLs.
///
/// Every operation is atomic per key. Construct one instance per process,
/// share it through an `Arc`, and call [`TtlCache::destroy`] at shutdown.
pub struct TtlCache<V> {
    entries: DashMap<String, CachedEntry<V>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            sweeper: Mutex::new(None),
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries
            .insert(key.into(), CachedEntry::new(value, ttl));
    }

    /// Returns the value if present and unexpired. Expired entries are
    /// removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if !entry.is_expired() {
            return Some(entry.value.clone());
        }

        drop(entry);
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        tracing::trace!(key = %key, "cache entry expired on read");
        None
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes the entry unconditionally. Returns whether an entry existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Removes every key starting with `prefix`. Returns the number removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = !key.starts_with(prefix);
            if !keep {
                removed += 1;
            }
            keep
        });
        tracing::debug!(prefix = %prefix, removed, "cache prefix invalidated");
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts every expired entry. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired();
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            sweeper_running: self.sweeper.lock().is_some(),
        }
    }

    /// Starts the background sweeper on the current tokio runtime.
    ///
    /// The task holds only a weak reference, so it ends on its own when the
    /// cache is dropped. Calling this while a sweeper is running restarts it
    /// with the new interval.
    pub fn start_sweeper(self: &Arc<Self>, interval: Duration) {
        let cache: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.cleanup_expired();
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep evicted expired entries");
                }
            }
        });

        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stops the sweeper and clears all entries. Safe to call more than once.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            tracing::debug!("cache sweeper stopped");
        }
        self.entries.clear();
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_get_until_ttl_elapses() {
        let cache = TtlCache::new();
        cache.set("k", 7u32, Duration::from_secs(10));

        assert_eq!(cache.get("k"), Some(7));
        assert!(cache.has("k"));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        // Lazy expiry removed the entry.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_resets_ttl() {
        let cache = TtlCache::new();
        cache.set("k", "old", Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;

        cache.set("k", "new", Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;

        assert_eq!(cache.get("k"), Some("new"));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));
        cache.set("b", 2, Duration::from_secs(60));

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.get("a"), None);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_prefix() {
        let cache = TtlCache::new();
        cache.set("collaborators:public:1:10", 1, Duration::from_secs(60));
        cache.set("collaborators:public:2:10", 2, Duration::from_secs(60));
        cache.set("innovators:public:1:10", 3, Duration::from_secs(60));

        assert_eq!(cache.delete_prefix("collaborators:"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("innovators:public:1:10"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let cache = TtlCache::new();
        cache.set("short", 1, Duration::from_secs(1));
        cache.set("long", 2, Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_unread_entries() {
        let cache = Arc::new(TtlCache::new());
        cache.start_sweeper(Duration::from_secs(60));
        cache.set("k", 1, Duration::from_secs(30));

        assert!(cache.stats().sweeper_running);
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let cache = Arc::new(TtlCache::new());
        cache.start_sweeper(DEFAULT_SWEEP_INTERVAL);
        cache.set("k", 1, Duration::from_secs(60));

        cache.destroy();
        assert!(cache.is_empty());
        assert!(!cache.stats().sweeper_running);

        cache.destroy();
        assert!(cache.is_empty());
    }
}
