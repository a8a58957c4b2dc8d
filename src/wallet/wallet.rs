//! Wallet implementation
//!
//! A wallet holds a key pair and a cached balance and is the
//! transaction-issuing client of the ledger. The cached balance is a
//! convenience snapshot; the authoritative balance is always recomputed
//! from the chain by [`Wallet::calculate_balance`].

use crate::core::block::Block;
use crate::core::transaction::{Transaction, TransactionError, TransactionInput};
use crate::crypto::{crypto_hash, KeyError, KeyPair};
use serde::Serialize;
use serde_json::json;

/// Balance granted to every address with no transaction history
pub const STARTING_BALANCE: u64 = 1000;

/// A key pair plus a cached view of its balance
#[derive(Debug)]
pub struct Wallet {
    key_pair: KeyPair,
    /// Snapshot of the last computed balance; never authoritative
    pub balance: u64,
}

impl Wallet {
    /// Create a wallet with a fresh key pair and the starting balance
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            balance: STARTING_BALANCE,
        }
    }

    /// The wallet's address: its hex-encoded compressed public key
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Sign arbitrary data by signing its digest
    pub fn sign<T: Serialize>(&self, data: &T) -> Result<String, KeyError> {
        self.key_pair.sign_digest(&crypto_hash(&[json!(data)]))
    }

    /// Create a transaction sending `amount` to `recipient`.
    ///
    /// When a chain is supplied the cached balance is refreshed from it
    /// first, so the transaction's declared input amount matches the
    /// ledger.
    pub fn create_transaction(
        &mut self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction, TransactionError> {
        if let Some(chain) = chain {
            self.balance = Self::calculate_balance(chain, &self.public_key());
        }

        Transaction::new(self, recipient, amount)
    }

    /// Compute the balance of `address` by replaying the chain.
    ///
    /// Scans from the tip backward, summing every output addressed to
    /// `address`. The scan stops after the most recent block in which the
    /// address itself sent a transaction: the change output recorded there
    /// already folds in its whole earlier history. Only if the address
    /// never sent anything does the starting balance apply.
    pub fn calculate_balance(chain: &[Block], address: &str) -> u64 {
        let mut outputs_total = 0u64;
        let mut has_conducted_transaction = false;

        for block in chain.iter().rev() {
            for transaction in &block.data {
                if let TransactionInput::Regular {
                    address: sender, ..
                } = &transaction.input
                {
                    if sender == address {
                        has_conducted_transaction = true;
                    }
                }

                outputs_total += transaction.output_map.get(address).copied().unwrap_or(0);
            }

            if has_conducted_transaction {
                break;
            }
        }

        if has_conducted_transaction {
            outputs_total
        } else {
            STARTING_BALANCE + outputs_total
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
