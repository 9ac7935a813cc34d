//! Repository layer between API consumers and the two data sources.
//!
//! Blocks are served cache-first and pushed to the cache after a node fetch;
//! transactions always come fresh from the node.

pub mod block_cache;
pub mod transactions;

pub use block_cache::BlockCacheRepository;
pub use transactions::TransactionAggregator;

use crate::block::Block;
use crate::cache::ObjectCache;
use crate::error::Result;
use crate::rpc::{self, RpcClient};
use crate::transaction::Transaction;
use crate::types::{quantity, Hash};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Remote method returning a block by its number.
pub const GET_BLOCK_BY_NUMBER: &str = "getBlockByNumber";

pub struct Repository<C, R: ?Sized> {
    blocks: BlockCacheRepository<C>,
    transactions: TransactionAggregator<R>,
    rpc: Arc<R>,
}

impl<C: ObjectCache, R: RpcClient + ?Sized> Repository<C, R> {
    pub fn new(cache: C, rpc: Arc<R>) -> Self {
        Self {
            blocks: BlockCacheRepository::new(cache),
            transactions: TransactionAggregator::new(Arc::clone(&rpc)),
            rpc,
        }
    }

    pub fn block_cache(&self) -> &BlockCacheRepository<C> {
        &self.blocks
    }

    pub fn transactions(&self) -> &TransactionAggregator<R> {
        &self.transactions
    }

    /// Returns the block with the given number, `None` when the node does not know it.
    ///
    /// A block loaded from the node is pushed to the cache; failing to do so
    /// only costs the next reader a node round trip.
    pub async fn block_by_number(&self, number: u64) -> Result<Option<Block>> {
        if let Some(block) = self.blocks.fetch(number).await {
            debug!(number, "block served from cache");
            return Ok(Some(block));
        }

        debug!(number, "loading block from node");
        let params = vec![Value::String(quantity::encode(number)), Value::Bool(false)];
        let block: Option<Block> = rpc::call(&*self.rpc, GET_BLOCK_BY_NUMBER, params).await?;

        if let Some(block) = &block {
            if let Err(err) = self.blocks.store(Some(block)).await {
                warn!(number, "can not push block to the in-memory cache; {}", err);
            }
        }

        Ok(block)
    }

    /// Returns the complete transaction with the given hash. Never cached.
    pub async fn transaction(&self, hash: &Hash) -> Result<Transaction> {
        self.transactions.fetch(hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::tests::sample_block;
    use crate::cache::UnboundedMemoryCache;
    use crate::error::RepositoryError;
    use crate::rpc::tests::ScriptedRpc;
    use crate::transaction::tests::record_json;
    use serde_json::json;

    fn repository(responses: Vec<Result<Value>>) -> (Repository<UnboundedMemoryCache, ScriptedRpc>, Arc<ScriptedRpc>) {
        let rpc = Arc::new(ScriptedRpc::new(responses));
        (Repository::new(UnboundedMemoryCache::new_unbounded(), rpc.clone()), rpc)
    }

    #[tokio::test]
    async fn test_block_miss_loads_from_node_and_caches() {
        let block = sample_block(12345);
        let (repo, rpc) = repository(vec![Ok(serde_json::to_value(&block).unwrap())]);

        assert_eq!(repo.block_by_number(12345).await.unwrap(), Some(block.clone()));
        assert_eq!(repo.block_by_number(12345).await.unwrap(), Some(block.clone()));
        assert_eq!(repo.block_cache().fetch(12345).await, Some(block));

        let calls = rpc.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (GET_BLOCK_BY_NUMBER.to_string(), vec![json!("0x3039"), json!(false)]));
    }

    #[tokio::test]
    async fn test_block_cache_hit_skips_node() {
        let (repo, rpc) = repository(vec![]);
        repo.block_cache().store(Some(&sample_block(3))).await.unwrap();

        assert_eq!(repo.block_by_number(3).await.unwrap(), Some(sample_block(3)));
        assert!(rpc.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_block_is_none() {
        let (repo, _) = repository(vec![Ok(Value::Null)]);
        assert_eq!(repo.block_by_number(99).await.unwrap(), None);
        assert!(repo.block_cache().cache().is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back_to_node() {
        let block = sample_block(4);
        let (repo, rpc) = repository(vec![Ok(serde_json::to_value(&block).unwrap())]);
        repo.block_cache().cache().set("4", b"not a block".to_vec()).await.unwrap();

        assert_eq!(repo.block_by_number(4).await.unwrap(), Some(block.clone()));
        assert_eq!(rpc.calls().len(), 1);
        assert_eq!(repo.block_cache().fetch(4).await, Some(block));
    }

    #[tokio::test]
    async fn test_node_failure_is_surfaced() {
        let (repo, _) = repository(vec![Err(RepositoryError::Rpc("unreachable".to_string()))]);
        assert_eq!(
            repo.block_by_number(1).await.unwrap_err(),
            RepositoryError::Rpc("unreachable".to_string())
        );
    }

    #[tokio::test]
    async fn test_transactions_are_not_cached() {
        let hash = Hash::new([0x70; 32]);
        let (repo, rpc) = repository(vec![Ok(record_json(hash, None)), Ok(record_json(hash, None))]);

        repo.transaction(&hash).await.unwrap();
        repo.transaction(&hash).await.unwrap();
        assert_eq!(rpc.calls().len(), 2);
        assert!(repo.block_cache().cache().is_empty().await);
    }
}
