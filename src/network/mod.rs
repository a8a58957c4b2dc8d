//! Broadcast layer for chains and transactions

pub mod pubsub;

pub use pubsub::{Message, PubSub};
