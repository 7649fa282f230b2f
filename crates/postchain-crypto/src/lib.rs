//! Crypto primitives consumed by the GTX signing protocol.
//!
//! Thin wrappers only: SHA-256 from `sha2`, secp256k1 ECDSA from `k256`.
//! Signatures are produced over an already-hashed 32-byte digest.

pub mod ecdsa;

pub use ecdsa::{
    public_key_from_private, public_key_matches, sign_digest, uncompressed_public_key_from_private,
    verify_digest, KeyPair,
};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a digest produced by [`sha256`].
pub const DIGEST_LEN: usize = 32;
/// Length of a compressed SEC1 public key.
pub const PUBLIC_KEY_LEN: usize = 33;
/// Length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;
/// Length of a raw private key scalar.
pub const PRIVATE_KEY_LEN: usize = 32;
/// Length of a compact `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
