//! GTX transaction assembly and signing.
//!
//! A [`Gtx`] collects operations and signer public keys, hashes a
//! signature-independent body, and gathers one signature slot per signer.
//! Because the digest never covers the signatures, parties can sign in any
//! order, on separate machines, and exchange the serialized payload in
//! between (see [`Gtx::deserialize`]).

pub mod gtx;
pub mod operation;
pub mod payload;

pub use gtx::{Gtx, SigningState};
pub use operation::Operation;

use postchain_crypto::CryptoError;
use postchain_gtv::GtvError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    /// Mutation attempted after signing began.
    #[error("invalid state: {0}")]
    State(String),

    #[error("mismatching signers and signatures: {signers} signers, {signatures} signature slots")]
    Consistency { signers: usize, signatures: usize },

    #[error("no such signer {0}, register it with add_signer before attaching a signature")]
    SignerNotFound(String),

    #[error("signer {0} is already registered")]
    DuplicateSigner(String),

    #[error("invalid blockchain RID: {0}")]
    InvalidBlockchainRid(String),

    #[error("malformed transaction: {0}")]
    Malformed(String),

    #[error("signature of signer {0} does not verify")]
    InvalidSignature(String),

    #[error("GTV error: {0}")]
    Gtv(#[from] GtvError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}
