//! Core blockchain components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (signed output maps plus mining rewards)
//! - Blocks (proof of work with per-block difficulty retargeting)
//! - Blockchain (chain validation and longest-chain replacement)

pub mod block;
pub mod blockchain;
pub mod transaction;

pub use block::{Block, INITIAL_DIFFICULTY, MINE_RATE};
pub use blockchain::{Blockchain, ChainError};
pub use transaction::{Transaction, TransactionError, TransactionInput, MINING_REWARD};
