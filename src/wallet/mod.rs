//! Wallet module for key management and balance computation

pub mod wallet;

pub use wallet::{Wallet, STARTING_BALANCE};
