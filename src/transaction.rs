//! Transaction entity assembled from the node's transaction and receipt records.

use crate::types::{hex_bytes, quantity, Address, Hash};
use serde::{Deserialize, Serialize};

/// Execution details of a confirmed transaction.
///
/// Decoded from the node's receipt record, which holds far more than these
/// five values; the rest is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDetails {
    #[serde(rename = "transactionIndex", with = "quantity")]
    pub index: u64,
    #[serde(with = "quantity")]
    pub cumulative_gas_used: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(with = "quantity")]
    pub status: u64,
}

/// A ledger transaction.
///
/// The receipt group is either entirely present or entirely absent. It is
/// only ever filled by [`Transaction::merge_receipt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: Hash,
    #[serde(default)]
    pub block_hash: Option<Hash>,
    #[serde(default, with = "quantity::opt")]
    pub block_number: Option<u64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(with = "quantity")]
    pub gas: u64,
    #[serde(with = "quantity::big")]
    pub gas_price: u128,
    #[serde(with = "quantity::big")]
    pub value: u128,
    #[serde(with = "hex_bytes")]
    pub input: Vec<u8>,
    #[serde(flatten)]
    receipt: Option<ReceiptDetails>,
}

/// Base transaction record exactly as `getTransactionByHash` returns it.
///
/// Receipt-like keys the node may include are deliberately not read here so
/// the receipt group can only come from the receipt call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionRecord {
    hash: Hash,
    #[serde(default)]
    block_hash: Option<Hash>,
    #[serde(default, with = "quantity::opt")]
    block_number: Option<u64>,
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    #[serde(with = "quantity")]
    nonce: u64,
    #[serde(with = "quantity")]
    gas: u64,
    #[serde(with = "quantity::big")]
    gas_price: u128,
    #[serde(with = "quantity::big")]
    value: u128,
    #[serde(with = "hex_bytes")]
    input: Vec<u8>,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Transaction {
            hash: record.hash,
            block_hash: record.block_hash,
            block_number: record.block_number,
            from: record.from,
            to: record.to,
            nonce: record.nonce,
            gas: record.gas,
            gas_price: record.gas_price,
            value: record.value,
            input: record.input,
            receipt: None,
        }
    }
}

impl Transaction {
    /// A transaction not yet included in a block has no block number.
    pub fn is_pending(&self) -> bool {
        self.block_number.is_none()
    }

    /// Copies the receipt group onto the transaction, replacing any previous group.
    pub fn merge_receipt(&mut self, receipt: ReceiptDetails) {
        self.receipt = Some(receipt);
    }

    pub fn receipt(&self) -> Option<&ReceiptDetails> {
        self.receipt.as_ref()
    }

    /// Position of the transaction inside its block.
    pub fn index(&self) -> Option<u64> {
        self.receipt.map(|r| r.index)
    }

    pub fn cumulative_gas_used(&self) -> Option<u64> {
        self.receipt.map(|r| r.cumulative_gas_used)
    }

    pub fn gas_used(&self) -> Option<u64> {
        self.receipt.map(|r| r.gas_used)
    }

    /// Address of the created contract; only contract-creation transactions have one.
    pub fn contract_address(&self) -> Option<Address> {
        self.receipt.and_then(|r| r.contract_address)
    }

    pub fn status(&self) -> Option<u64> {
        self.receipt.map(|r| r.status)
    }
}
