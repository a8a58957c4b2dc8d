//! Transaction handling for the blockchain
//!
//! A transaction is a signed output map: a mapping of recipient addresses to
//! amounts, covered by a single input that records the sender's address,
//! declared balance, and a signature over the output map. Mining rewards are
//! a distinct input variant with no signature, so the two validation paths
//! are exhaustive instead of hinging on a sentinel address.

use crate::crypto::{crypto_hash, verify_signature, KeyError};
use crate::wallet::Wallet;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Amount credited to the miner by each block's reward transaction
pub const MINING_REWARD: u64 = 50;

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Amount {amount} exceeds balance {balance}")]
    InsufficientBalance { amount: u64, balance: u64 },
    #[error("Output total {output_total} does not match input amount {input_amount}")]
    AmountMismatch {
        input_amount: u64,
        output_total: u64,
    },
    #[error("Invalid signature for sender {address}")]
    BadSignature { address: String },
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

/// The funding side of a transaction.
///
/// `Regular` inputs carry the sender's declared balance and a signature over
/// the output map. `Reward` inputs fund mining rewards; they have no signer
/// and are validated at the ledger level instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransactionInput {
    Regular {
        /// Creation time in unix milliseconds
        timestamp: i64,
        /// The sender's full balance at signing time
        amount: u64,
        /// Hex-encoded public key of the sender
        address: String,
        /// Hex compact ECDSA signature over the output map
        signature: String,
    },
    Reward,
}

/// A signed value transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier; stable across client-side updates
    pub id: String,
    /// Recipient address to amount. The sender's change rides in here too.
    pub output_map: BTreeMap<String, u64>,
    pub input: TransactionInput,
}

impl Transaction {
    /// Create a transaction sending `amount` from `sender` to `recipient`.
    ///
    /// The output map carries the recipient's amount and the sender's
    /// remaining balance as change.
    pub fn new(sender: &Wallet, recipient: &str, amount: u64) -> Result<Self, TransactionError> {
        if amount > sender.balance {
            return Err(TransactionError::InsufficientBalance {
                amount,
                balance: sender.balance,
            });
        }

        let mut output_map = BTreeMap::new();
        output_map.insert(recipient.to_string(), amount);
        output_map.insert(sender.public_key(), sender.balance - amount);

        let input = Self::signed_input(sender, &output_map)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            output_map,
            input,
        })
    }

    /// Create the reward transaction crediting `miner` with [`MINING_REWARD`]
    pub fn reward(miner: &Wallet) -> Self {
        let mut output_map = BTreeMap::new();
        output_map.insert(miner.public_key(), MINING_REWARD);

        Self {
            id: Uuid::new_v4().to_string(),
            output_map,
            input: TransactionInput::Reward,
        }
    }

    /// Fold another transfer into a not-yet-confirmed transaction.
    ///
    /// Adds `amount` to the recipient's output (accumulating across repeat
    /// sends), deducts it from the sender's change, and re-signs with a
    /// fresh input. Fails without mutating anything if the sender's change
    /// cannot cover the amount.
    pub fn update(
        &mut self,
        sender: &Wallet,
        recipient: &str,
        amount: u64,
    ) -> Result<(), TransactionError> {
        let sender_address = sender.public_key();
        let remaining = self
            .output_map
            .get(&sender_address)
            .copied()
            .unwrap_or_default();
        if amount > remaining {
            return Err(TransactionError::InsufficientBalance {
                amount,
                balance: remaining,
            });
        }

        let mut updated = self.output_map.clone();
        *updated.entry(recipient.to_string()).or_insert(0) += amount;
        if let Some(change) = updated.get_mut(&sender_address) {
            *change -= amount;
        }

        let input = Self::signed_input(sender, &updated)?;
        self.output_map = updated;
        self.input = input;
        Ok(())
    }

    /// Check output conservation and the input signature.
    ///
    /// Pure: diagnostics are returned, not logged. Reward transactions have
    /// no signature and pass; their reward-specific rules are enforced
    /// during chain validation.
    pub fn verify(&self) -> Result<(), TransactionError> {
        let TransactionInput::Regular {
            amount,
            address,
            signature,
            ..
        } = &self.input
        else {
            return Ok(());
        };

        let output_total: u64 = self.output_map.values().sum();
        if output_total != *amount {
            return Err(TransactionError::AmountMismatch {
                input_amount: *amount,
                output_total,
            });
        }

        let digest = crypto_hash(&[json!(self.output_map)]);
        if !verify_signature(address, &digest, signature) {
            return Err(TransactionError::BadSignature {
                address: address.clone(),
            });
        }

        Ok(())
    }

    /// Whether this is a mining reward transaction
    pub fn is_reward(&self) -> bool {
        matches!(self.input, TransactionInput::Reward)
    }

    /// The sender's address, if this is a regular transaction
    pub fn sender_address(&self) -> Option<&str> {
        match &self.input {
            TransactionInput::Regular { address, .. } => Some(address),
            TransactionInput::Reward => None,
        }
    }

    fn signed_input(
        sender: &Wallet,
        output_map: &BTreeMap<String, u64>,
    ) -> Result<TransactionInput, TransactionError> {
        Ok(TransactionInput::Regular {
            timestamp: Utc::now().timestamp_millis(),
            amount: sender.balance,
            address: sender.public_key(),
            signature: sender.sign(output_map)?,
        })
    }
}
