//! Blockchain implementation
//!
//! An append-only, hash-linked sequence of blocks owned by a single node
//! process. The chain is only ever mutated two ways: mining a block onto
//! the tip, or swapping the whole chain for a longer, fully valid
//! replacement. Validation runs to completion before any mutation, so a
//! rejected candidate leaves local state untouched.

use crate::core::block::Block;
use crate::core::transaction::{Transaction, TransactionError, TransactionInput, MINING_REWARD};
use crate::wallet::Wallet;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a chain or its transaction data fails validation.
///
/// These are rejections, not faults: `replace_chain` reports them and leaves
/// state unchanged. A rejected chain will not become valid on retry.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Incoming chain must be longer than the current chain")]
    ChainTooShort,
    #[error("Chain does not start with the genesis block")]
    GenesisMismatch,
    #[error("Broken hash link at block {height}")]
    BrokenLink { height: usize },
    #[error("Difficulty changed by more than one at block {height}")]
    DifficultyJump { height: usize },
    #[error("Stored hash does not match contents of block {height}")]
    HashMismatch { height: usize },
    #[error("More than one reward transaction in block {height}")]
    MultipleRewards { height: usize },
    #[error("Reward transaction in block {height} does not pay exactly {MINING_REWARD}")]
    InvalidRewardAmount { height: usize },
    #[error("Invalid transaction in block {height}: {source}")]
    Transaction {
        height: usize,
        source: TransactionError,
    },
    #[error("Input amount for {address} in block {height} does not match its balance")]
    InvalidInputAmount { height: usize, address: String },
    #[error("Duplicate transaction in block {height}")]
    DuplicateTransaction { height: usize },
}

/// The node's ledger: an ordered sequence of blocks starting at genesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blockchain {
    pub chain: Vec<Block>,
}

impl Blockchain {
    /// Create a new blockchain holding only the genesis block
    pub fn new() -> Self {
        Self {
            chain: vec![Block::genesis()],
        }
    }

    /// The current tip of the chain
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always holds at least the genesis block")
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Mine a block holding `data` onto the tip and append it.
    ///
    /// Cannot fail, but blocks the calling thread until the proof-of-work
    /// search finishes; see [`Block::mine`].
    pub fn add_block(&mut self, data: Vec<Transaction>) -> &Block {
        let block = Block::mine(self.last_block(), data);
        self.chain.push(block);
        self.last_block()
    }

    /// Structural validation of a candidate chain.
    ///
    /// The candidate must start with the fixed genesis block, every block
    /// must link to its predecessor's hash, adjacent difficulties must
    /// differ by exactly one, and every non-genesis block's stored hash
    /// must recompute from its contents.
    pub fn validate_chain(chain: &[Block]) -> Result<(), ChainError> {
        if chain.first() != Some(&Block::genesis()) {
            return Err(ChainError::GenesisMismatch);
        }

        for height in 1..chain.len() {
            let block = &chain[height];
            let last_block = &chain[height - 1];

            if block.last_hash != last_block.hash {
                return Err(ChainError::BrokenLink { height });
            }
            if last_block.difficulty.abs_diff(block.difficulty) != 1 {
                return Err(ChainError::DifficultyJump { height });
            }
            if !block.is_hash_valid() {
                return Err(ChainError::HashMismatch { height });
            }
        }

        Ok(())
    }

    /// Validate the transaction contents of a candidate chain.
    ///
    /// Per non-genesis block: at most one reward transaction, paying
    /// exactly [`MINING_REWARD`]; every regular transaction must verify and
    /// declare an input amount equal to the sender's balance on the
    /// *current* chain (the one this candidate would replace); and no two
    /// transactions in a block may be identical.
    pub fn validate_transaction_data(&self, candidate: &[Block]) -> Result<(), ChainError> {
        for (height, block) in candidate.iter().enumerate().skip(1) {
            let mut seen: Vec<&Transaction> = Vec::new();
            let mut reward_count = 0u32;

            for transaction in &block.data {
                match &transaction.input {
                    TransactionInput::Reward => {
                        reward_count += 1;
                        if reward_count > 1 {
                            return Err(ChainError::MultipleRewards { height });
                        }
                        if transaction.output_map.len() != 1
                            || transaction.output_map.values().next() != Some(&MINING_REWARD)
                        {
                            return Err(ChainError::InvalidRewardAmount { height });
                        }
                    }
                    TransactionInput::Regular {
                        amount, address, ..
                    } => {
                        transaction
                            .verify()
                            .map_err(|source| ChainError::Transaction { height, source })?;

                        let true_balance = Wallet::calculate_balance(&self.chain, address);
                        if *amount != true_balance {
                            return Err(ChainError::InvalidInputAmount {
                                height,
                                address: address.clone(),
                            });
                        }
                    }
                }

                if seen.contains(&transaction) {
                    return Err(ChainError::DuplicateTransaction { height });
                }
                seen.push(transaction);
            }
        }

        Ok(())
    }

    /// Replace the local chain with `candidate` if it is longer and valid.
    ///
    /// This is the fork-choice rule: longest fully valid chain wins, with
    /// equal length always rejected. On success the caller is responsible
    /// for pruning the mempool of the transactions the new chain confirms.
    pub fn replace_chain(
        &mut self,
        candidate: Vec<Block>,
        validate_transactions: bool,
    ) -> Result<(), ChainError> {
        if candidate.len() <= self.chain.len() {
            return Err(ChainError::ChainTooShort);
        }
        Self::validate_chain(&candidate)?;
        if validate_transactions {
            self.validate_transaction_data(&candidate)?;
        }

        info!(
            "replacing chain of {} blocks with {} blocks",
            self.chain.len(),
            candidate.len()
        );
        self.chain = candidate;
        Ok(())
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction_fixture() -> (Wallet, Transaction, Transaction) {
        let mut wallet = Wallet::new();
        let chain = Blockchain::new();
        let transaction = wallet
            .create_transaction("recipient-public-key", 40, Some(&chain.chain))
            .unwrap();
        let reward = Transaction::reward(&wallet);
        (wallet, transaction, reward)
    }

    #[test]
    fn test_starts_with_genesis() {
        let blockchain = Blockchain::new();
        assert_eq!(blockchain.chain[0], Block::genesis());
    }

    #[test]
    fn test_add_block_appends_data() {
        let mut blockchain = Blockchain::new();
        let (_, transaction, _) = transaction_fixture();

        blockchain.add_block(vec![transaction.clone()]);

        assert_eq!(blockchain.last_block().data, vec![transaction]);
        assert_eq!(blockchain.len(), 2);
    }

    #[test]
    fn test_validate_chain_rejects_wrong_genesis() {
        let mut blockchain = Blockchain::new();
        blockchain.chain[0].nonce = 99;
        assert!(matches!(
            Blockchain::validate_chain(&blockchain.chain),
            Err(ChainError::GenesisMismatch)
        ));
    }

    #[test]
    fn test_validate_chain_rejects_broken_last_hash() {
        let mut blockchain = Blockchain::new();
        blockchain.add_block(vec![]);
        blockchain.add_block(vec![]);

        blockchain.chain[2].last_hash = String::from("broken");

        assert!(Blockchain::validate_chain(&blockchain.chain).is_err());
    }

    #[test]
    fn test_validate_chain_rejects_tampered_block() {
        let mut blockchain = Blockchain::new();
        let (_, transaction, _) = transaction_fixture();
        blockchain.add_block(vec![]);
        blockchain.add_block(vec![]);

        blockchain.chain[2].data = vec![transaction];

        assert!(matches!(
            Blockchain::validate_chain(&blockchain.chain),
            Err(ChainError::HashMismatch { height: 2 })
        ));
    }

    #[test]
    fn test_validate_chain_rejects_difficulty_jump() {
        let mut blockchain = Blockchain::new();
        blockchain.add_block(vec![]);
        blockchain.add_block(vec![]);

        let last_block = blockchain.last_block();
        let timestamp = last_block.timestamp + 1;
        let difficulty = last_block.difficulty + 2;
        let hash = Block::hash_fields(timestamp, &last_block.hash, &[], 0, difficulty);
        let jumped = Block {
            timestamp,
            hash,
            last_hash: last_block.hash.clone(),
            data: vec![],
            nonce: 0,
            difficulty,
        };
        blockchain.chain.push(jumped);

        assert!(matches!(
            Blockchain::validate_chain(&blockchain.chain),
            Err(ChainError::DifficultyJump { height: 3 })
        ));
    }

    #[test]
    fn test_validate_chain_accepts_valid_chain() {
        let mut blockchain = Blockchain::new();
        blockchain.add_block(vec![]);
        blockchain.add_block(vec![]);
        blockchain.add_block(vec![]);

        assert!(Blockchain::validate_chain(&blockchain.chain).is_ok());
    }

    #[test]
    fn test_replace_chain_rejects_shorter_or_equal() {
        let mut blockchain = Blockchain::new();
        let original = blockchain.chain.clone();
        let incoming = Blockchain::new();

        let result = blockchain.replace_chain(incoming.chain, false);

        assert!(matches!(result, Err(ChainError::ChainTooShort)));
        assert_eq!(blockchain.chain, original);
    }

    #[test]
    fn test_replace_chain_rejects_invalid_chain() {
        let mut blockchain = Blockchain::new();
        let original = blockchain.chain.clone();

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![]);
        incoming.add_block(vec![]);
        incoming.chain[2].hash = String::from("forged");

        let result = blockchain.replace_chain(incoming.chain, false);

        assert!(result.is_err());
        assert_eq!(blockchain.chain, original);
    }

    #[test]
    fn test_replace_chain_accepts_longer_valid_chain() {
        let mut blockchain = Blockchain::new();
        let mut incoming = Blockchain::new();
        incoming.add_block(vec![]);
        incoming.add_block(vec![]);

        blockchain.replace_chain(incoming.chain.clone(), false).unwrap();

        assert_eq!(blockchain.chain, incoming.chain);
    }

    #[test]
    fn test_transaction_data_accepts_valid_block() {
        let blockchain = Blockchain::new();
        let (_, transaction, reward) = transaction_fixture();

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![transaction, reward]);

        assert!(blockchain.validate_transaction_data(&incoming.chain).is_ok());
    }

    #[test]
    fn test_transaction_data_rejects_multiple_rewards() {
        let blockchain = Blockchain::new();
        let (_, transaction, reward) = transaction_fixture();

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![transaction, reward.clone(), reward]);

        assert!(matches!(
            blockchain.validate_transaction_data(&incoming.chain),
            Err(ChainError::MultipleRewards { .. })
        ));
    }

    #[test]
    fn test_transaction_data_rejects_malformed_output_map() {
        let blockchain = Blockchain::new();
        let (wallet, mut transaction, reward) = transaction_fixture();
        transaction.output_map.insert(wallet.public_key(), 999_999);

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![transaction, reward]);

        assert!(matches!(
            blockchain.validate_transaction_data(&incoming.chain),
            Err(ChainError::Transaction { .. })
        ));
    }

    #[test]
    fn test_transaction_data_rejects_wrong_reward_amount() {
        let blockchain = Blockchain::new();
        let (wallet, transaction, mut reward) = transaction_fixture();
        reward.output_map.insert(wallet.public_key(), MINING_REWARD + 1);

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![transaction, reward]);

        assert!(matches!(
            blockchain.validate_transaction_data(&incoming.chain),
            Err(ChainError::InvalidRewardAmount { .. })
        ));
    }

    #[test]
    fn test_transaction_data_rejects_forged_input_amount() {
        let blockchain = Blockchain::new();
        let (_, _, reward) = transaction_fixture();

        // A sender claiming a balance the ledger does not back
        let mut evil_wallet = Wallet::new();
        evil_wallet.balance = 9000;
        let evil_transaction = Transaction::new(&evil_wallet, "foo-recipient", 100).unwrap();

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![evil_transaction, reward]);

        assert!(matches!(
            blockchain.validate_transaction_data(&incoming.chain),
            Err(ChainError::InvalidInputAmount { .. })
        ));
    }

    #[test]
    fn test_transaction_data_rejects_duplicate_transactions() {
        let blockchain = Blockchain::new();
        let (_, transaction, reward) = transaction_fixture();

        let mut incoming = Blockchain::new();
        incoming.add_block(vec![transaction.clone(), reward, transaction.clone(), transaction]);

        assert!(matches!(
            blockchain.validate_transaction_data(&incoming.chain),
            Err(ChainError::DuplicateTransaction { .. })
        ));
    }
}
