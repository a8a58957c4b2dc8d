//! Publish/subscribe dissemination of chains and transactions
//!
//! Every local chain change is published as the full serialized chain, and
//! every locally created transaction as a serialized transaction. Receivers
//! feed incoming payloads to [`PubSub::handle_message`], which applies them
//! to the ledger and pool. Payloads travel over a `tokio` broadcast channel
//! as opaque JSON strings; [`PubSub::subscribe`] is the seam where a real
//! network transport attaches.

use crate::core::block::Block;
use crate::core::blockchain::Blockchain;
use crate::core::transaction::Transaction;
use crate::mining::mempool::TransactionPool;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Buffered payloads per subscriber before lagging receivers drop messages
const CHANNEL_CAPACITY: usize = 64;

/// A payload on the wire, tagged by channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload", rename_all = "UPPERCASE")]
pub enum Message {
    Blockchain(Vec<Block>),
    Transaction(Transaction),
}

/// The node's broadcast endpoint
pub struct PubSub {
    blockchain: Arc<RwLock<Blockchain>>,
    pool: Arc<RwLock<TransactionPool>>,
    sender: broadcast::Sender<String>,
}

impl PubSub {
    pub fn new(blockchain: Arc<RwLock<Blockchain>>, pool: Arc<RwLock<TransactionPool>>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            blockchain,
            pool,
            sender,
        }
    }

    /// Subscribe to the serialized payloads this node publishes
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Publish the full local chain
    pub async fn broadcast_chain(&self) {
        let chain = self.blockchain.read().await.chain.clone();
        self.publish(&Message::Blockchain(chain));
    }

    /// Publish a locally created transaction
    pub async fn broadcast_transaction(&self, transaction: &Transaction) {
        self.publish(&Message::Transaction(transaction.clone()));
    }

    /// Apply an incoming serialized payload.
    ///
    /// Chain payloads go through the replacement rule; on success the pool
    /// is pruned of the transactions the new chain confirms. Rejections are
    /// logged and leave all state unchanged. Transaction payloads are
    /// upserted into the pool.
    pub async fn handle_message(&self, payload: &str) {
        let message: Message = match serde_json::from_str(payload) {
            Ok(message) => message,
            Err(reason) => {
                warn!("discarding undecodable payload: {reason}");
                return;
            }
        };

        match message {
            Message::Blockchain(candidate) => {
                let mut blockchain = self.blockchain.write().await;
                match blockchain.replace_chain(candidate, true) {
                    Ok(()) => {
                        let mut pool = self.pool.write().await;
                        pool.prune_confirmed(&blockchain.chain);
                        info!("accepted replacement chain of {} blocks", blockchain.len());
                    }
                    Err(reason) => warn!("rejected incoming chain: {reason}"),
                }
            }
            Message::Transaction(transaction) => {
                self.pool.write().await.set_transaction(transaction);
            }
        }
    }

    fn publish(&self, message: &Message) {
        match serde_json::to_string(message) {
            // Send only fails when nobody is subscribed, which is fine
            Ok(payload) => {
                let _ = self.sender.send(payload);
            }
            Err(reason) => error!("failed to serialize outgoing message: {reason}"),
        }
    }
}
