//! LedgerBridge - repository layer between ledger API consumers and a ledger node
//!
//! # Architecture
//!
//! ## Entities
//! - [`types`] - Fixed-length hashes and addresses, hex quantity codecs
//! - [`block`] - Block entity and its cache codec
//! - [`transaction`] - Transaction entity and its receipt group
//!
//! ## Data Sources
//! - [`cache`] - In-memory object cache engine
//! - [`rpc`] - Node procedure-call client
//!
//! ## Repositories
//! - [`repository`] - Block cache, transaction aggregation and the combined facade
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Entities
// ============================================================================
pub mod block;
pub mod transaction;
pub mod types;

// ============================================================================
// Data Sources
// ============================================================================
pub mod cache;
pub mod rpc;

// ============================================================================
// Repositories
// ============================================================================
pub mod repository;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use error::{RepositoryError, Result};
pub use repository::{BlockCacheRepository, Repository, TransactionAggregator};
