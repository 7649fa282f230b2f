//! secp256k1 ECDSA over prehashed digests.
//!
//! Signing is deterministic (RFC 6979) and always yields the low-S form, so
//! the same key and digest give the same 64 bytes on every run.

use crate::{
    CryptoError, DIGEST_LEN, PRIVATE_KEY_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN,
    UNCOMPRESSED_PUBLIC_KEY_LEN,
};
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

/// A secp256k1 key pair.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Load a key pair from a raw 32-byte private scalar.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            signing_key: signing_key(private_key)?,
        })
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        compressed(self.signing_key.verifying_key())
    }

    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.signing_key.to_bytes().into()
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; DIGEST_LEN]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
        sign_with(&self.signing_key, digest)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

fn signing_key(private_key: &[u8]) -> Result<SigningKey, CryptoError> {
    if private_key.len() != PRIVATE_KEY_LEN {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "expected {} bytes, got {}",
            PRIVATE_KEY_LEN,
            private_key.len()
        )));
    }
    SigningKey::from_slice(private_key)
        .map_err(|e| CryptoError::InvalidPrivateKey(format!("not a secp256k1 scalar: {}", e)))
}

fn compressed(key: &VerifyingKey) -> [u8; PUBLIC_KEY_LEN] {
    let point = key.to_encoded_point(true);
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out.copy_from_slice(point.as_bytes());
    out
}

fn sign_with(key: &SigningKey, digest: &[u8; DIGEST_LEN]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let sig: Signature = key
        .sign_prehash(digest)
        .map_err(|e| CryptoError::Signing(format!("ECDSA signing failed: {}", e)))?;
    let sig = sig.normalize_s().unwrap_or(sig);

    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&sig.to_bytes());
    Ok(out)
}

/// Derive the compressed public key for a raw private key.
pub fn public_key_from_private(private_key: &[u8]) -> Result<[u8; PUBLIC_KEY_LEN], CryptoError> {
    Ok(compressed(signing_key(private_key)?.verifying_key()))
}

/// Derive the uncompressed (`0x04 || x || y`) public key for a raw private key.
pub fn uncompressed_public_key_from_private(
    private_key: &[u8],
) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], CryptoError> {
    let key = signing_key(private_key)?;
    let point = key.verifying_key().to_encoded_point(false);
    let mut out = [0u8; UNCOMPRESSED_PUBLIC_KEY_LEN];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Whether `public_key`, in either SEC1 encoding, belongs to `private_key`.
///
/// Points are compared, not bytes. A key that does not parse fails with
/// [`CryptoError::InvalidPublicKey`].
pub fn public_key_matches(private_key: &[u8], public_key: &[u8]) -> Result<bool, CryptoError> {
    let derived = signing_key(private_key)?;
    let given = VerifyingKey::from_sec1_bytes(public_key).map_err(|e| {
        CryptoError::InvalidPublicKey(format!("{} is not a SEC1 key: {}", hex::encode(public_key), e))
    })?;
    Ok(derived.verifying_key() == &given)
}

/// Sign a 32-byte digest with a raw private key.
pub fn sign_digest(
    digest: &[u8; DIGEST_LEN],
    private_key: &[u8],
) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    sign_with(&signing_key(private_key)?, digest)
}

/// Check a compact signature over `digest` against a SEC1 public key.
///
/// Malformed keys or signatures verify as `false`.
pub fn verify_digest(digest: &[u8; DIGEST_LEN], signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify_prehash(digest, &sig).is_ok()
}
