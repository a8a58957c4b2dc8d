//! Block implementation
//!
//! A block records a list of transactions, a link to its predecessor, and
//! the proof-of-work fields (nonce, difficulty). Blocks are immutable once
//! mined; the only way to create one is [`Block::mine`] or the fixed
//! genesis constant shared by every node.

use crate::core::transaction::Transaction;
use crate::crypto::{crypto_hash, meets_difficulty};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Target milliseconds between blocks; drives difficulty retargeting
pub const MINE_RATE: i64 = 1000;

/// Difficulty of the genesis block
pub const INITIAL_DIFFICULTY: u32 = 3;

/// A block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Creation time in unix milliseconds
    pub timestamp: i64,
    /// Hash over all other fields, in lowercase hex
    pub hash: String,
    /// Hash of the preceding block
    pub last_hash: String,
    /// The transactions confirmed by this block
    pub data: Vec<Transaction>,
    /// Proof-of-work counter
    pub nonce: u64,
    /// Required leading zero bits in `hash`
    pub difficulty: u32,
}

impl Block {
    /// The fixed genesis block, identical across all nodes.
    ///
    /// Its hash fields are placeholders, not real digests, which is why
    /// chain validation compares the genesis block structurally instead of
    /// recomputing its hash.
    pub fn genesis() -> Self {
        Self {
            timestamp: 1,
            hash: String::from("hash"),
            last_hash: String::from("last"),
            data: Vec::new(),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
        }
    }

    /// Mine a block on top of `last_block`.
    ///
    /// Retries nonces until the hash has at least `difficulty` leading zero
    /// bits. The timestamp and difficulty are recomputed on every attempt,
    /// so the difficulty a block is mined at reflects how long this attempt
    /// has actually been running. Unbounded CPU-bound work with no
    /// cancellation; callers are responsible for keeping it off any thread
    /// that must stay responsive.
    pub fn mine(last_block: &Block, data: Vec<Transaction>) -> Self {
        let last_hash = last_block.hash.clone();
        let mut nonce = 0u64;

        loop {
            nonce += 1;
            let timestamp = Utc::now().timestamp_millis();
            let difficulty = Self::adjust_difficulty(last_block, timestamp);
            let hash = Self::hash_fields(timestamp, &last_hash, &data, nonce, difficulty);

            if meets_difficulty(&hex::decode(&hash).unwrap_or_default(), difficulty) {
                return Self {
                    timestamp,
                    hash,
                    last_hash,
                    data,
                    nonce,
                    difficulty,
                };
            }
        }
    }

    /// Difficulty for a block mined at `timestamp` on top of `last_block`.
    ///
    /// Moves one step down when the elapsed time exceeds [`MINE_RATE`] and
    /// one step up otherwise, with a floor of 1.
    pub fn adjust_difficulty(last_block: &Block, timestamp: i64) -> u32 {
        let difficulty = last_block.difficulty;
        if difficulty < 1 {
            return 1;
        }

        if timestamp - last_block.timestamp > MINE_RATE {
            difficulty - 1
        } else {
            difficulty + 1
        }
    }

    /// Digest of the given block fields
    pub fn hash_fields(
        timestamp: i64,
        last_hash: &str,
        data: &[Transaction],
        nonce: u64,
        difficulty: u32,
    ) -> String {
        crypto_hash(&[
            json!(timestamp),
            json!(last_hash),
            json!(data),
            json!(nonce),
            json!(difficulty),
        ])
    }

    /// Recompute this block's hash from its fields
    pub fn compute_hash(&self) -> String {
        Self::hash_fields(
            self.timestamp,
            &self.last_hash,
            &self.data,
            self.nonce,
            self.difficulty,
        )
    }

    /// Whether the stored hash matches the block's contents
    pub fn is_hash_valid(&self) -> bool {
        self.hash == self.compute_hash()
    }
}
