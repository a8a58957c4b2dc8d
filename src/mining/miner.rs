//! Mining of pending transactions
//!
//! Bridges the mempool and the ledger: takes every currently valid pooled
//! transaction, appends the miner's reward, mines the block, and clears the
//! pool. Broadcasting the grown chain is left to the caller.

use crate::core::block::Block;
use crate::core::blockchain::Blockchain;
use crate::core::transaction::Transaction;
use crate::mining::mempool::TransactionPool;
use crate::wallet::Wallet;
use log::info;
use std::time::Instant;

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Wall-clock time spent mining, in milliseconds
    pub time_ms: u128,
    /// Number of transactions confirmed, reward included
    pub transactions: usize,
    /// Difficulty the block was mined at
    pub difficulty: u32,
}

/// Mine all valid pooled transactions plus a reward for `wallet`.
///
/// Must not run concurrently with a chain replacement against the same
/// ledger; callers serialize both through one critical section.
pub fn mine_pending_transactions(
    blockchain: &mut Blockchain,
    pool: &mut TransactionPool,
    wallet: &Wallet,
) -> (Block, MiningStats) {
    let start = Instant::now();

    let mut transactions = pool.valid_transactions();
    transactions.push(Transaction::reward(wallet));
    let count = transactions.len();

    let block = blockchain.add_block(transactions).clone();
    pool.clear();

    let stats = MiningStats {
        time_ms: start.elapsed().as_millis(),
        transactions: count,
        difficulty: block.difficulty,
    };
    info!(
        "mined block {} with {} transactions in {}ms at difficulty {}",
        blockchain.len() - 1,
        stats.transactions,
        stats.time_ms,
        stats.difficulty
    );

    (block, stats)
}
