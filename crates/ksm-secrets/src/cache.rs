//! Keyed secret cache with TTL-based expiration
//!
//! Each entry holds a shared handle to a pending or completed lookup, so
//! concurrent requests for the same key wait on a single fetch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::error::SecretError;

/// Shared handle to a pending or resolved secret
pub type SharedSecret = Shared<BoxFuture<'static, Result<String, Arc<SecretError>>>>;

/// A cached lookup with its expiration time
struct CachedSecret {
    value: SharedSecret,
    expires_at: Instant,
}

impl CachedSecret {
    fn new(value: SharedSecret, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Thread-safe in-memory cache of secret lookups
pub struct SecretCache {
    entries: DashMap<String, CachedSecret>,
    ttl: Duration,
}

impl SecretCache {
    /// Create a cache whose entries live for `ttl` after insertion
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live entry for `key`, or start a lookup with `refresh`
    ///
    /// `refresh` runs under the entry lock, so at most one lookup per key is
    /// in flight. It must only start work, never wait for it. Every refresh
    /// also evicts the other expired entries.
    pub fn get_or_refresh<F>(&self, key: &str, refresh: F) -> SharedSecret
    where
        F: FnOnce() -> BoxFuture<'static, Result<String, SecretError>>,
    {
        let value = match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) if !entry.get().is_expired() => {
                tracing::trace!(key, "Secret cache hit");
                return entry.get().value.clone();
            }
            entry => {
                tracing::debug!(key, "Refreshing cached secret");
                let value = refresh().map(|r| r.map_err(Arc::new)).boxed().shared();
                entry.insert(CachedSecret::new(value.clone(), self.ttl));
                value
            }
        };

        // The entry lock is released; retain locks every shard
        self.purge_expired();
        value
    }

    /// Remove the entry for `key`
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove all expired entries
    pub fn purge_expired(&self) {
        self.entries.retain(|_, v| !v.is_expired());
    }

    /// Get the number of cached entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_refresh(
        calls: &Arc<AtomicUsize>,
        value: &'static str,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String, SecretError>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value.to_string()) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_hit_reuses_lookup() {
        let cache = SecretCache::new(Duration::from_secs(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_refresh("a", counting_refresh(&calls, "one"));
        let second = cache.get_or_refresh("a", counting_refresh(&calls, "two"));

        assert_eq!(first.await.unwrap(), "one");
        assert_eq!(second.await.unwrap(), "one");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = SecretCache::new(Duration::from_secs(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.get_or_refresh("a", counting_refresh(&calls, "one"));
        let b = cache.get_or_refresh("A", counting_refresh(&calls, "two"));

        assert_eq!(a.await.unwrap(), "one");
        assert_eq!(b.await.unwrap(), "two");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refreshed() {
        let cache = SecretCache::new(Duration::from_millis(20));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.get_or_refresh("a", counting_refresh(&calls, "one"));
        assert_eq!(first.await.unwrap(), "one");

        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = cache.get_or_refresh("a", counting_refresh(&calls, "two"));
        assert_eq!(second.await.unwrap(), "two");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let cache = SecretCache::new(Duration::from_secs(5));
        let failing = || async { Err::<String, _>(SecretError::Task("boom".to_string())) }.boxed();
        let succeeding = || async { Ok::<_, SecretError>("late".to_string()) }.boxed();

        let first = cache.get_or_refresh("a", failing);
        let second = cache.get_or_refresh("a", succeeding);

        let first = first.await.unwrap_err();
        let second = second.await.unwrap_err();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_refresh_evicts_expired_entries() {
        let cache = SecretCache::new(Duration::from_millis(20));
        assert_eq!(cache.ttl(), Duration::from_millis(20));
        let calls = Arc::new(AtomicUsize::new(0));

        let _ = cache.get_or_refresh("a", counting_refresh(&calls, "one"));
        let _ = cache.get_or_refresh("b", counting_refresh(&calls, "two"));
        assert_eq!(cache.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Looking up another key drops both stale entries
        let c = cache.get_or_refresh("c", counting_refresh(&calls, "three"));
        assert_eq!(c.await.unwrap(), "three");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_purge() {
        let cache = SecretCache::new(Duration::from_millis(10));
        let calls = Arc::new(AtomicUsize::new(0));

        let _ = cache.get_or_refresh("a", counting_refresh(&calls, "one"));
        let _ = cache.get_or_refresh("b", counting_refresh(&calls, "two"));
        cache.invalidate("a");
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.purge_expired();
        assert!(cache.is_empty());
    }
}
