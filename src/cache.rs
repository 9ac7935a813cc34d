//! In-memory object cache engine.
//!
//! The repository layer only sees the byte-oriented [`ObjectCache`] contract.
//! [`MemoryCache`] implements it over an interchangeable backing store:
//! - [`LruMemoryCache`] evicts past a capacity, least recently written first;
//!   reads never refresh an entry, so eviction follows write order
//! - [`UnboundedMemoryCache`] keeps everything until removed
use crate::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key/value contract consumed by the repositories.
///
/// A missing key is `Ok(None)`; `Err` is reserved for engine failures.
#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `data` under `key`, replacing any previous value.
    async fn set(&self, key: &str, data: Vec<u8>) -> Result<()>;
}

/// Storage behind a [`MemoryCache`].
pub trait CacheBackend: Send + Sync {
    /// Look up a value without changing eviction order.
    fn peek(&self, key: &str) -> Option<&[u8]>;

    fn put(&mut self, key: String, data: Vec<u8>);

    fn remove(&mut self, key: &str) -> Option<Vec<u8>>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound on entries, `None` when unbounded.
    fn capacity(&self) -> Option<usize>;
}

impl CacheBackend for LruCache<String, Vec<u8>> {
    fn peek(&self, key: &str) -> Option<&[u8]> {
        LruCache::peek(self, key).map(Vec::as_slice)
    }

    fn put(&mut self, key: String, data: Vec<u8>) {
        LruCache::put(self, key, data);
    }

    fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.pop(key)
    }

    fn clear(&mut self) {
        LruCache::clear(self);
    }

    fn len(&self) -> usize {
        LruCache::len(self)
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.cap().get())
    }
}

impl CacheBackend for HashMap<String, Vec<u8>> {
    fn peek(&self, key: &str) -> Option<&[u8]> {
        self.get(key).map(Vec::as_slice)
    }

    fn put(&mut self, key: String, data: Vec<u8>) {
        self.insert(key, data);
    }

    fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        HashMap::remove(self, key)
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

/// Thread-safe cache handle. Clones share the same storage.
pub struct MemoryCache<B: CacheBackend> {
    inner: Arc<RwLock<B>>,
}

/// Capacity-bounded engine.
///
/// Recency is tracked on writes only: `get` peeks, so the entry written
/// longest ago is evicted first even if it was just read. Re-setting a key
/// moves it to the front.
pub type LruMemoryCache = MemoryCache<LruCache<String, Vec<u8>>>;

/// Engine without eviction.
pub type UnboundedMemoryCache = MemoryCache<HashMap<String, Vec<u8>>>;

impl LruMemoryCache {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    /// Create an LRU engine; a zero capacity is raised to one entry.
    pub fn new_lru(capacity: usize) -> Self {
        let capacity_nz = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::with_backend(LruCache::new(capacity_nz))
    }
}

impl UnboundedMemoryCache {
    pub fn new_unbounded() -> Self {
        Self::with_backend(HashMap::new())
    }
}

impl Default for UnboundedMemoryCache {
    fn default() -> Self {
        Self::new_unbounded()
    }
}

impl<B: CacheBackend> MemoryCache<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            inner: Arc::new(RwLock::new(backend)),
        }
    }

    /// Remove an entry. Uses write lock.
    pub async fn remove(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.write().await.remove(key)
    }

    /// Drop every entry. Uses write lock.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn capacity(&self) -> Option<usize> {
        self.inner.read().await.capacity()
    }

    /// Current entry count and capacity, read under a single lock.
    pub async fn stats(&self) -> (usize, Option<usize>) {
        let backend = self.inner.read().await;
        (backend.len(), backend.capacity())
    }
}

impl<B: CacheBackend> Clone for MemoryCache<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<B: CacheBackend> ObjectCache for MemoryCache<B> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let backend = self.inner.read().await;
        Ok(backend.peek(key).map(<[u8]>::to_vec))
    }

    async fn set(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let mut backend = self.inner.write().await;
        backend.put(key.to_string(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unbounded_cache_get_set() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let cache = UnboundedMemoryCache::new_unbounded();
            assert_eq!(cache.get("1").await.unwrap(), None);

            cache.set("1", b"first".to_vec()).await.unwrap();
            cache.set("1", b"second".to_vec()).await.unwrap();
            assert_eq!(cache.get("1").await.unwrap(), Some(b"second".to_vec()));
            assert_eq!(cache.stats().await, (1, None));

            assert_eq!(cache.remove("1").await, Some(b"second".to_vec()));
            assert!(cache.is_empty().await);
        })
        .await
        .expect("test_unbounded_cache_get_set timed out");
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let cache = UnboundedMemoryCache::default();
            let other = cache.clone();

            other.set("42", vec![4, 2]).await.unwrap();
            assert_eq!(cache.get("42").await.unwrap(), Some(vec![4, 2]));

            cache.clear().await;
            assert_eq!(other.len().await, 0);
        })
        .await
        .expect("test_clones_share_storage timed out");
    }

    #[tokio::test]
    async fn test_lru_cache_eviction() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let cache = LruMemoryCache::new_lru(5);

            for i in 0..5 {
                cache.set(&i.to_string(), vec![i as u8]).await.unwrap();
            }
            assert_eq!(cache.stats().await, (5, Some(5)));

            // One more insert pushes out the oldest key.
            cache.set("5", vec![5]).await.unwrap();
            assert_eq!(cache.len().await, 5);
            assert_eq!(cache.get("0").await.unwrap(), None);
            assert_eq!(cache.get("5").await.unwrap(), Some(vec![5]));
        })
        .await
        .expect("test_lru_cache_eviction timed out");
    }

    #[tokio::test]
    async fn test_lru_eviction_follows_write_order() {
        let cache = LruMemoryCache::new_lru(2);
        cache.set("a", vec![1]).await.unwrap();
        cache.set("b", vec![2]).await.unwrap();

        // Reading "a" does not save it.
        assert_eq!(cache.get("a").await.unwrap(), Some(vec![1]));
        cache.set("c", vec![3]).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);

        // Rewriting "b" does.
        cache.set("b", vec![4]).await.unwrap();
        cache.set("d", vec![5]).await.unwrap();
        assert_eq!(cache.get("b").await.unwrap(), Some(vec![4]));
        assert_eq!(cache.get("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised() {
        let cache = LruMemoryCache::new_lru(0);
        assert_eq!(cache.capacity().await, Some(1));
    }
}
