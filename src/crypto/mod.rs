//! Cryptographic utilities for the blockchain
//!
//! This module provides:
//! - The order-independent SHA-256 digest used for block hashes and
//!   transaction signatures
//! - ECDSA key management (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{crypto_hash, meets_difficulty, sha256_hex};
pub use keys::{verify_signature, KeyError, KeyPair};
