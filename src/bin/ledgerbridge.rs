#![forbid(unsafe_code)]
//! Query blocks and transactions through the LedgerBridge repository layer.

use clap::{Parser, Subcommand};
use ledgerbridge::cache::LruMemoryCache;
use ledgerbridge::config::{load_config, load_config_from};
use ledgerbridge::rpc::HttpRpcClient;
use ledgerbridge::types::Hash;
use ledgerbridge::Repository;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; defaults to ./config.toml when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints a block by its number
    Block {
        /// Block number in decimal
        number: u64,
    },
    /// Prints a transaction with its receipt details
    Tx {
        /// 0x-prefixed transaction hash
        hash: Hash,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rpc = Arc::new(HttpRpcClient::from_config(&config.rpc)?);
    info!(url = rpc.url(), "using ledger node");
    let repository = Repository::new(LruMemoryCache::new_lru(config.cache.capacity), rpc);

    match cli.command {
        Commands::Block { number } => match repository.block_by_number(number).await? {
            Some(block) => println!("{}", serde_json::to_string_pretty(&block)?),
            None => return Err(format!("block {} not found", number).into()),
        },
        Commands::Tx { hash } => {
            let tx = repository.transaction(&hash).await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
    }

    Ok(())
}
