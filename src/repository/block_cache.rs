//! Read-through/write-through cache of blocks keyed by block number.

use crate::block::{self, Block};
use crate::cache::ObjectCache;
use crate::error::{RepositoryError, Result};
use tracing::{debug, error, warn};

/// Outcome of a single cache lookup before it is collapsed for the caller.
#[derive(Debug)]
enum CacheLookup {
    Hit(Block),
    Miss,
    /// An entry exists but does not decode; it is treated as a miss.
    CorruptIgnored(RepositoryError),
}

/// Caches [`Block`]s in an [`ObjectCache`] under their decimal number.
///
/// The cache only accelerates reads: corrupt or unreadable entries read as
/// absent and never fail the caller.
#[derive(Debug, Clone)]
pub struct BlockCacheRepository<C> {
    cache: C,
}

impl<C: ObjectCache> BlockCacheRepository<C> {
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the cached block with the given number, if one is usable.
    pub async fn fetch(&self, number: u64) -> Option<Block> {
        match self.lookup(number).await {
            CacheLookup::Hit(block) => Some(block),
            CacheLookup::Miss => None,
            CacheLookup::CorruptIgnored(err) => {
                error!(number, "can not decode block data from in-memory cache; {}", err);
                None
            }
        }
    }

    async fn lookup(&self, number: u64) -> CacheLookup {
        let data = match self.cache.get(&block::cache_key(number)).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(number, "block not in cache");
                return CacheLookup::Miss;
            }
            Err(err) => {
                warn!(number, "block cache lookup failed; {}", err);
                return CacheLookup::Miss;
            }
        };

        match Block::unmarshal(&data) {
            Ok(block) => CacheLookup::Hit(block),
            Err(err) => CacheLookup::CorruptIgnored(err),
        }
    }

    /// Writes the block under its number, replacing whatever was stored there.
    pub async fn store(&self, block: Option<&Block>) -> Result<()> {
        let block = block.ok_or_else(|| {
            RepositoryError::Validation("undefined block can not be pushed to the in-memory cache".to_string())
        })?;

        let data = block.marshal().map_err(|err| {
            error!(number = block.number, "can not encode block for the in-memory cache; {}", err);
            err
        })?;

        self.cache.set(&block.cache_key(), data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::sample_block;
    use crate::cache::UnboundedMemoryCache;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Collects formatted log lines written by a test subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Engine whose every operation fails, counting the attempts.
    #[derive(Default)]
    struct BrokenCache {
        sets: AtomicUsize,
    }

    #[async_trait]
    impl ObjectCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(RepositoryError::Cache("engine offline".to_string()))
        }

        async fn set(&self, _key: &str, _data: Vec<u8>) -> Result<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Cache("engine offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let repo = BlockCacheRepository::new(UnboundedMemoryCache::new_unbounded());
            let block = sample_block(12345);

            repo.store(Some(&block)).await.unwrap();
            assert_eq!(repo.fetch(12345).await, Some(block));
            assert!(repo.cache().get("12345").await.unwrap().is_some());
        })
        .await
        .expect("test_store_then_fetch timed out");
    }

    #[tokio::test]
    async fn test_fetch_unknown_number_is_absent() {
        let repo = BlockCacheRepository::new(UnboundedMemoryCache::new_unbounded());
        assert_eq!(repo.fetch(7).await, None);
    }

    #[tokio::test]
    async fn test_store_overwrites_same_number() {
        let repo = BlockCacheRepository::new(UnboundedMemoryCache::new_unbounded());
        let first = sample_block(5);
        let mut second = sample_block(5);
        second.gas_used = 99;

        repo.store(Some(&first)).await.unwrap();
        repo.store(Some(&second)).await.unwrap();
        assert_eq!(repo.fetch(5).await, Some(second));
        assert_eq!(repo.cache().len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_absent() {
        let cache = UnboundedMemoryCache::new_unbounded();
        cache.set("9", b"{\"number\":\"0x9\",".to_vec()).await.unwrap();
        let repo = BlockCacheRepository::new(cache);

        assert!(matches!(repo.lookup(9).await, CacheLookup::CorruptIgnored(RepositoryError::Encoding(_))));
        assert_eq!(repo.fetch(9).await, None);

        // A fresh store repairs the entry.
        repo.store(Some(&sample_block(9))).await.unwrap();
        assert_eq!(repo.fetch(9).await, Some(sample_block(9)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_logs_at_error_level() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let cache = UnboundedMemoryCache::new_unbounded();
        cache.set("11", b"not a block".to_vec()).await.unwrap();
        let repo = BlockCacheRepository::new(cache);
        assert_eq!(repo.fetch(11).await, None);

        let output = logs.contents();
        let line = output
            .lines()
            .find(|line| line.contains("can not decode block data"))
            .unwrap_or_else(|| panic!("no decode failure logged in {:?}", output));
        assert!(line.contains("ERROR"), "{}", line);
        assert!(line.contains("number=11"), "{}", line);

        // A plain miss is not reported as an error.
        assert_eq!(repo.fetch(12).await, None);
        assert_eq!(logs.contents().matches("ERROR").count(), 1);
    }

    #[tokio::test]
    async fn test_store_none_is_rejected_before_cache() {
        let repo = BlockCacheRepository::new(BrokenCache::default());
        let err = repo.store(None).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Validation(_)));
        assert_eq!(repo.cache().sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_failures() {
        let repo = BlockCacheRepository::new(BrokenCache::default());

        assert_eq!(repo.fetch(1).await, None);

        let err = repo.store(Some(&sample_block(1))).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Cache(_)));
        assert_eq!(repo.cache().sets.load(Ordering::SeqCst), 1);
    }
}
