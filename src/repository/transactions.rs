//! Builds complete transactions from the node's transaction and receipt records.

use crate::error::{RepositoryError, Result};
use crate::rpc::{self, RpcClient};
use crate::transaction::{ReceiptDetails, Transaction, TransactionRecord};
use crate::types::Hash;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Remote method returning the base transaction record.
pub const GET_TRANSACTION_BY_HASH: &str = "getTransactionByHash";

/// Remote method returning the execution receipt of a mined transaction.
pub const GET_TRANSACTION_RECEIPT: &str = "getTransactionReceipt";

/// Progress of one aggregation.
///
/// Only `ReceiptMerged` carries a receipt group; a failed receipt call drops
/// the whole value, so no half-merged transaction can escape.
#[derive(Debug)]
enum Aggregation {
    BaseFetched(Transaction),
    ReceiptMerged(Transaction),
}

impl Aggregation {
    fn into_transaction(self) -> Transaction {
        match self {
            Aggregation::BaseFetched(tx) | Aggregation::ReceiptMerged(tx) => tx,
        }
    }
}

/// Loads transactions straight from the node; results are never cached.
pub struct TransactionAggregator<R: ?Sized> {
    rpc: Arc<R>,
}

impl<R: ?Sized> Clone for TransactionAggregator<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl<R: RpcClient + ?Sized> TransactionAggregator<R> {
    pub fn new(rpc: Arc<R>) -> Self {
        Self { rpc }
    }

    /// Fetches the transaction and, once it is mined, its receipt.
    ///
    /// Pending transactions come back after a single call with no receipt
    /// group. Any failed call fails the whole fetch.
    pub async fn fetch(&self, hash: &Hash) -> Result<Transaction> {
        debug!(%hash, "loading transaction");

        let base = self.fetch_base(hash).await?;
        let state = self.advance(Aggregation::BaseFetched(base), hash).await?;

        debug!(%hash, "transaction loaded");
        Ok(state.into_transaction())
    }

    async fn advance(&self, state: Aggregation, hash: &Hash) -> Result<Aggregation> {
        match state {
            Aggregation::BaseFetched(mut tx) if !tx.is_pending() => {
                let receipt = self.fetch_receipt(hash).await?;
                tx.merge_receipt(receipt);
                Ok(Aggregation::ReceiptMerged(tx))
            }
            other => Ok(other),
        }
    }

    async fn fetch_base(&self, hash: &Hash) -> Result<Transaction> {
        let record: Option<TransactionRecord> =
            rpc::call(&*self.rpc, GET_TRANSACTION_BY_HASH, hash_params(hash))
                .await
                .map_err(|err| {
                    error!(%hash, "transaction could not be extracted; {}", err);
                    err
                })?;

        record
            .map(Transaction::from)
            .ok_or_else(|| RepositoryError::Rpc(format!("transaction {} not found", hash)))
    }

    async fn fetch_receipt(&self, hash: &Hash) -> Result<ReceiptDetails> {
        let receipt: Option<ReceiptDetails> =
            rpc::call(&*self.rpc, GET_TRANSACTION_RECEIPT, hash_params(hash))
                .await
                .map_err(|err| {
                    error!(%hash, "can not get receipt for transaction; {}", err);
                    err
                })?;

        receipt.ok_or_else(|| {
            RepositoryError::Rpc(format!("receipt for transaction {} is not available", hash))
        })
    }
}

fn hash_params(hash: &Hash) -> Vec<Value> {
    vec![Value::String(hash.to_hex())]
}
