//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/blocks", get(handlers::get_blocks))
        .route("/api/transaction-pool", get(handlers::get_transaction_pool))
        .route("/api/wallet-info", get(handlers::get_wallet_info))
        .route("/api/transact", post(handlers::transact))
        .route("/api/mine-transactions", post(handlers::mine_transactions))
        .with_state(state)
        .layer(cors)
}
