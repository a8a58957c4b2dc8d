//! ECDSA key management
//!
//! Key pair generation, signing, and verification on the secp256k1 curve.
//! A wallet address is the hex encoding of its compressed public key;
//! signatures are hex-encoded compact ECDSA over a 32-byte digest.

use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid digest")]
    InvalidDigest,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Sign a hex-encoded 32-byte digest, returning a hex compact signature
    pub fn sign_digest(&self, digest_hex: &str) -> Result<String, KeyError> {
        let bytes = hex::decode(digest_hex).map_err(|_| KeyError::InvalidDigest)?;
        let message = Message::from_digest_slice(&bytes)?;
        let secp = Secp256k1::new();
        let signature = secp.sign_ecdsa(&message, &self.secret_key);
        Ok(hex::encode(signature.serialize_compact()))
    }
}

/// Verify a hex compact signature over a hex digest against a hex public key.
///
/// Never errors: malformed keys, digests, or signatures verify as false.
pub fn verify_signature(public_key_hex: &str, digest_hex: &str, signature_hex: &str) -> bool {
    let Ok(key_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_slice(&key_bytes) else {
        return false;
    };
    let Ok(digest_bytes) = hex::decode(digest_hex) else {
        return false;
    };
    let Ok(message) = Message::from_digest_slice(&digest_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_compact(&sig_bytes) else {
        return false;
    };

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
}
