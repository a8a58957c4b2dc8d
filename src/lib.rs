//! Microchain: a minimal proof-of-work blockchain in Rust
//!
//! This crate implements a single-ledger blockchain featuring:
//! - Proof of work with per-block difficulty retargeting
//! - ECDSA-signed output-map transactions (secp256k1)
//! - Longest-valid-chain fork resolution with full transaction auditing
//! - A transaction pool feeding a reward-paying miner
//! - Chain and transaction broadcast plus a REST API for node operations
//!
//! # Example
//!
//! ```rust
//! use microchain::core::Blockchain;
//! use microchain::mining::{mine_pending_transactions, TransactionPool};
//! use microchain::wallet::Wallet;
//!
//! let mut blockchain = Blockchain::new();
//! let mut pool = TransactionPool::new();
//! let mut wallet = Wallet::new();
//!
//! // Issue a transfer and pool it
//! let transaction = wallet
//!     .create_transaction("recipient-public-key", 40, Some(&blockchain.chain))
//!     .unwrap();
//! pool.set_transaction(transaction);
//!
//! // Confirm it by mining, earning the reward along the way
//! let (block, _stats) = mine_pending_transactions(&mut blockchain, &mut pool, &wallet);
//! assert_eq!(block.data.len(), 2);
//!
//! let balance = Wallet::calculate_balance(&blockchain.chain, &wallet.public_key());
//! assert_eq!(balance, 1000 - 40 + 50);
//! ```

pub mod api;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;
pub mod wallet;

// Re-export commonly used types
pub use crate::api::{create_router, ApiState};
pub use crate::core::{
    Block, Blockchain, ChainError, Transaction, TransactionError, TransactionInput,
    INITIAL_DIFFICULTY, MINE_RATE, MINING_REWARD,
};
pub use crate::crypto::KeyPair;
pub use crate::mining::{mine_pending_transactions, MiningStats, TransactionPool};
pub use crate::network::PubSub;
pub use crate::wallet::{Wallet, STARTING_BALANCE};
