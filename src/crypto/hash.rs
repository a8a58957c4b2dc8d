//! Cryptographic hashing for blocks and transactions
//!
//! The ledger hashes heterogeneous value lists (timestamps, hashes,
//! transaction lists, integers). Each value is serialized to compact JSON,
//! the serialized strings are sorted and joined with a single space, and the
//! result is SHA-256 hashed. Sorting makes the digest independent of
//! argument order, so all nodes agree on a hash regardless of how the
//! inputs were assembled.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Computes SHA-256 of the input data and returns it as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Order-independent digest over a list of JSON values.
///
/// `crypto_hash(&[a, b]) == crypto_hash(&[b, a])` for all `a`, `b`. Struct
/// fields serialize in declaration order and maps in key order, so the
/// digest is stable across processes.
pub fn crypto_hash(inputs: &[Value]) -> String {
    let mut parts: Vec<String> = inputs.iter().map(Value::to_string).collect();
    parts.sort();
    sha256_hex(parts.join(" ").as_bytes())
}

/// Checks that a hash has at least `difficulty` leading zero bits
pub fn meets_difficulty(hash: &[u8], difficulty: u32) -> bool {
    let full_zero_bytes = difficulty as usize / 8;
    let remaining_bits = difficulty as usize % 8;

    if hash.len() < full_zero_bytes {
        return false;
    }

    for byte in hash.iter().take(full_zero_bytes) {
        if *byte != 0 {
            return false;
        }
    }

    if remaining_bits > 0 {
        match hash.get(full_zero_bytes) {
            Some(byte) => {
                let mask = 0xFFu8 << (8 - remaining_bits);
                if byte & mask != 0 {
                    return false;
                }
            }
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_crypto_hash_known_value() {
        assert_eq!(
            crypto_hash(&[json!("test")]),
            "4d967a30111bf29f0eba01c448b375c1629b2fed01cdfcc3aed91f1b57d5dd5e"
        );
    }

    #[test]
    fn test_crypto_hash_is_order_independent() {
        let forward = crypto_hash(&[json!("one"), json!("two"), json!("three")]);
        let shuffled = crypto_hash(&[json!("two"), json!("one"), json!("three")]);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_crypto_hash_changes_with_properties() {
        let before = crypto_hash(&[json!({})]);
        let after = crypto_hash(&[json!({"a": "a"})]);
        assert_ne!(before, after);
    }

    #[test]
    fn test_meets_difficulty() {
        let hash = [0x00, 0x00, 0x0F, 0xFF, 0xFF, 0xFF];
        assert!(meets_difficulty(&hash, 16));
        assert!(meets_difficulty(&hash, 20));
        assert!(!meets_difficulty(&hash, 21));
    }
}
