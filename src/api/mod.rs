//! REST API module
//!
//! HTTP surface of a node.
//!
//! # Endpoints
//!
//! - `GET  /health` - Liveness check
//! - `GET  /api/blocks` - The full chain
//! - `GET  /api/transaction-pool` - Pending transactions
//! - `GET  /api/wallet-info` - Node wallet address and balance
//! - `POST /api/transact` - Create or amend a pending transaction
//! - `POST /api/mine-transactions` - Mine all valid pooled transactions

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;
