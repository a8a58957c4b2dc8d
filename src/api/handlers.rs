//! REST API handlers for node operations

use crate::core::block::Block;
use crate::core::blockchain::Blockchain;
use crate::core::transaction::{Transaction, TransactionError};
use crate::mining::mempool::TransactionPool;
use crate::mining::miner::{mine_pending_transactions, MiningStats};
use crate::network::pubsub::PubSub;
use crate::wallet::Wallet;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub pool: Arc<RwLock<TransactionPool>>,
    pub wallet: Arc<RwLock<Wallet>>,
    pub pubsub: Arc<PubSub>,
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize, Debug)]
pub struct ApiError {
    pub error: String,
}

#[derive(Serialize)]
pub struct WalletInfo {
    pub address: String,
    pub balance: u64,
}

#[derive(Deserialize)]
pub struct TransactRequest {
    pub recipient: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub block: Block,
    pub transactions: usize,
    pub time_ms: u128,
}

impl MineResponse {
    fn new(block: Block, stats: MiningStats) -> Self {
        Self {
            block,
            transactions: stats.transactions,
            time_ms: stats.time_ms,
        }
    }
}

fn bad_request(reason: TransactionError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: reason.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api/blocks - The full chain
pub async fn get_blocks(State(state): State<ApiState>) -> Json<Vec<Block>> {
    Json(state.blockchain.read().await.chain.clone())
}

/// GET /api/transaction-pool - Pending transactions keyed by id
pub async fn get_transaction_pool(
    State(state): State<ApiState>,
) -> Json<HashMap<String, Transaction>> {
    Json(state.pool.read().await.transactions().clone())
}

/// GET /api/wallet-info - The node wallet's address and ledger balance
pub async fn get_wallet_info(State(state): State<ApiState>) -> Json<WalletInfo> {
    let blockchain = state.blockchain.read().await;
    let wallet = state.wallet.read().await;

    let address = wallet.public_key();
    let balance = Wallet::calculate_balance(&blockchain.chain, &address);
    Json(WalletInfo { address, balance })
}

/// POST /api/transact - Create or amend the node wallet's pending transaction
///
/// If the wallet already has a transaction in the pool, the transfer is
/// folded into it; otherwise a fresh transaction is created against the
/// current chain. Either way the result is pooled and broadcast.
pub async fn transact(
    State(state): State<ApiState>,
    Json(request): Json<TransactRequest>,
) -> Result<Json<Transaction>, (StatusCode, Json<ApiError>)> {
    let transaction = {
        let blockchain = state.blockchain.read().await;
        let mut wallet = state.wallet.write().await;
        let mut pool = state.pool.write().await;

        let existing = pool.existing_transaction(&wallet.public_key()).cloned();
        let transaction = match existing {
            Some(mut transaction) => {
                transaction
                    .update(&wallet, &request.recipient, request.amount)
                    .map_err(bad_request)?;
                transaction
            }
            None => wallet
                .create_transaction(&request.recipient, request.amount, Some(&blockchain.chain))
                .map_err(bad_request)?,
        };

        pool.set_transaction(transaction.clone());
        transaction
    };

    state.pubsub.broadcast_transaction(&transaction).await;
    Ok(Json(transaction))
}

/// POST /api/mine-transactions - Mine all valid pooled transactions
///
/// Mining is CPU-bound and unbounded, so it runs on a blocking thread with
/// the chain and pool write guards moved into it; holding both guards for
/// the duration keeps it from interleaving with a chain replacement.
pub async fn mine_transactions(
    State(state): State<ApiState>,
) -> Result<Json<MineResponse>, (StatusCode, Json<ApiError>)> {
    let blockchain = state.blockchain.clone().write_owned().await;
    let pool = state.pool.clone().write_owned().await;
    let wallet = state.wallet.clone().read_owned().await;

    let mined = tokio::task::spawn_blocking(move || {
        let mut blockchain = blockchain;
        let mut pool = pool;
        mine_pending_transactions(&mut blockchain, &mut pool, &wallet)
    })
    .await;

    let (block, stats) = match mined {
        Ok(result) => result,
        Err(reason) => {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: format!("Mining task failed: {reason}"),
                }),
            ));
        }
    };

    state.pubsub.broadcast_chain().await;
    Ok(Json(MineResponse::new(block, stats)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::MINING_REWARD;

    fn state() -> ApiState {
        let blockchain = Arc::new(RwLock::new(Blockchain::new()));
        let pool = Arc::new(RwLock::new(TransactionPool::new()));
        let pubsub = Arc::new(PubSub::new(blockchain.clone(), pool.clone()));
        ApiState {
            blockchain,
            pool,
            wallet: Arc::new(RwLock::new(Wallet::new())),
            pubsub,
        }
    }

    #[tokio::test]
    async fn test_transact_pools_and_returns_transaction() {
        let state = state();

        let Json(transaction) = transact(
            State(state.clone()),
            Json(TransactRequest {
                recipient: String::from("some-recipient"),
                amount: 100,
            }),
        )
        .await
        .unwrap();

        assert_eq!(transaction.output_map["some-recipient"], 100);
        assert_eq!(
            state.pool.read().await.transactions()[&transaction.id],
            transaction
        );
    }

    #[tokio::test]
    async fn test_transact_amends_existing_transaction() {
        let state = state();

        let Json(first) = transact(
            State(state.clone()),
            Json(TransactRequest {
                recipient: String::from("some-recipient"),
                amount: 100,
            }),
        )
        .await
        .unwrap();

        let Json(second) = transact(
            State(state.clone()),
            Json(TransactRequest {
                recipient: String::from("some-recipient"),
                amount: 50,
            }),
        )
        .await
        .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.output_map["some-recipient"], 150);
        assert_eq!(state.pool.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_transact_rejects_excessive_amount() {
        let state = state();

        let result = transact(
            State(state),
            Json(TransactRequest {
                recipient: String::from("some-recipient"),
                amount: 999_999,
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mine_transactions_confirms_pool_and_pays_reward() {
        let state = state();

        transact(
            State(state.clone()),
            Json(TransactRequest {
                recipient: String::from("some-recipient"),
                amount: 100,
            }),
        )
        .await
        .unwrap();

        let Json(response) = mine_transactions(State(state.clone())).await.unwrap();

        assert_eq!(response.transactions, 2);
        assert_eq!(state.blockchain.read().await.len(), 2);
        assert!(state.pool.read().await.is_empty());

        let Json(info) = get_wallet_info(State(state)).await;
        // 1000 starting - 100 sent + 50 mining reward
        assert_eq!(info.balance, 1000 - 100 + MINING_REWARD);
    }
}
