//! Block entity as served by the node and held in the object cache.

use crate::error::{RepositoryError, Result};
use crate::types::{quantity, Address, Hash};
use serde::{Deserialize, Serialize};

/// A ledger block carrying only the hashes of its transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(with = "quantity")]
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub miner: Address,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    #[serde(with = "quantity")]
    pub gas_limit: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(default)]
    pub transactions: Vec<Hash>,
}

impl Block {
    /// Key under which the block lives in the object cache: its number in decimal.
    pub fn cache_key(&self) -> String {
        cache_key(self.number)
    }

    /// Encodes the block for cache persistence.
    pub fn marshal(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RepositoryError::Encoding(format!("Failed to serialize block {}: {}", self.number, e)))
    }

    /// Decodes a block from cache bytes. Any malformed input yields an
    /// `Encoding` error; a block is never partially decoded.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|e| RepositoryError::Encoding(format!("Failed to deserialize block: {}", e)))
    }
}

/// Cache key for the block with the given number.
pub fn cache_key(number: u64) -> String {
    number.to_string()
}
