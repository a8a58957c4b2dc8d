//! Transaction pool (mempool) for pending transactions
//!
//! Holds transactions that have been issued or received but not yet
//! confirmed by a block, keyed by transaction id. Re-inserting an id
//! overwrites the previous entry, which is how a sender replaces its own
//! pending transaction after an update.

use crate::core::block::Block;
use crate::core::transaction::Transaction;
use log::warn;
use std::collections::HashMap;

/// Pending transactions keyed by id
#[derive(Debug, Default)]
pub struct TransactionPool {
    transactions: HashMap<String, Transaction>,
}

impl TransactionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a transaction by id
    pub fn set_transaction(&mut self, transaction: Transaction) {
        self.transactions.insert(transaction.id.clone(), transaction);
    }

    /// Find a pooled transaction sent by `address`, if any.
    ///
    /// Lets a sender keep amending a single pending transaction instead of
    /// issuing a new one per transfer.
    pub fn existing_transaction(&self, address: &str) -> Option<&Transaction> {
        self.transactions
            .values()
            .find(|transaction| transaction.sender_address() == Some(address))
    }

    /// Snapshot of every pooled transaction that passes verification.
    ///
    /// Invalid entries are excluded and logged but stay in the pool; they
    /// are only evicted on confirmation.
    pub fn valid_transactions(&self) -> Vec<Transaction> {
        self.transactions
            .values()
            .filter(|transaction| match transaction.verify() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(
                        "excluding invalid pooled transaction {}: {}",
                        transaction.id, reason
                    );
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// Empty the pool, after a locally mined block confirms its contents
    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    /// Drop every transaction already confirmed by a block of `chain`.
    ///
    /// Called after a chain replacement so transactions confirmed by the
    /// remote chain are not mined again locally.
    pub fn prune_confirmed(&mut self, chain: &[Block]) {
        for block in chain.iter().skip(1) {
            for transaction in &block.data {
                self.transactions.remove(&transaction.id);
            }
        }
    }

    /// The pooled transactions, keyed by id
    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
