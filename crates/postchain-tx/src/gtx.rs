//! The GTX transaction and its signing protocol.
//!
//! Lifecycle: `Building` (operations and signers may be appended) →
//! `PartiallySigned` (first signature attached, contents locked) →
//! `FullySigned` (every slot filled). Serialization is allowed in every
//! state.

use crate::operation::Operation;
use crate::TxError;
use log::{debug, trace};
use postchain_crypto::{self as crypto, KeyPair, DIGEST_LEN};
use postchain_gtv::{Gtv, GtvError};
use serde_json::Value as Json;

/// Where a transaction is in its signing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    Building,
    PartiallySigned,
    FullySigned,
}

/// A GTX transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gtx {
    blockchain_rid: Vec<u8>,
    operations: Vec<Operation>,
    signers: Vec<Vec<u8>>,
    /// `None` until the first signature; then exactly one slot per signer.
    signatures: Option<Vec<Option<Vec<u8>>>>,
}

impl Gtx {
    /// Start a transaction for the chain with the given hex RID.
    pub fn new(blockchain_rid: &str) -> Result<Self, TxError> {
        let rid = hex::decode(blockchain_rid).map_err(|e| {
            TxError::InvalidBlockchainRid(format!("'{}' is not hex: {}", blockchain_rid, e))
        })?;
        Ok(Self::from_rid_bytes(rid))
    }

    /// Start a transaction for the chain with the given raw RID.
    pub fn from_rid_bytes(blockchain_rid: impl Into<Vec<u8>>) -> Self {
        Self {
            blockchain_rid: blockchain_rid.into(),
            operations: Vec::new(),
            signers: Vec::new(),
            signatures: None,
        }
    }

    pub(crate) fn from_parts(
        blockchain_rid: Vec<u8>,
        operations: Vec<Operation>,
        signers: Vec<Vec<u8>>,
        signatures: Option<Vec<Option<Vec<u8>>>>,
    ) -> Self {
        Self {
            blockchain_rid,
            operations,
            signers,
            signatures,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    /// Blockchain RID as lowercase hex.
    pub fn blockchain_rid(&self) -> String {
        hex::encode(&self.blockchain_rid)
    }

    /// Raw blockchain RID.
    pub fn blockchain_rid_bytes(&self) -> &[u8] {
        &self.blockchain_rid
    }

    /// Operations in call order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Signer public keys; index `i` owns signature slot `i`.
    pub fn signers(&self) -> &[Vec<u8>] {
        &self.signers
    }

    /// Signature slots aligned with [`Gtx::signers`], absent before signing.
    pub fn signatures(&self) -> Option<&[Option<Vec<u8>>]> {
        self.signatures.as_deref()
    }

    /// Signature attached for `public_key`, if any.
    pub fn signature_for(&self, public_key: &[u8]) -> Option<&[u8]> {
        let index = self.signer_index(public_key)?;
        self.signatures.as_ref()?.get(index)?.as_deref()
    }

    /// Current lifecycle state.
    pub fn signing_state(&self) -> SigningState {
        match &self.signatures {
            None => SigningState::Building,
            Some(slots) if slots.iter().all(Option::is_some) => SigningState::FullySigned,
            Some(_) => SigningState::PartiallySigned,
        }
    }

    /// True once the first signature is attached.
    pub fn is_signed(&self) -> bool {
        self.signatures.is_some()
    }

    /// True when every signer's slot is filled.
    pub fn is_fully_signed(&self) -> bool {
        self.signing_state() == SigningState::FullySigned
    }

    /// Registered signers whose slot is still empty, in signer order.
    pub fn missing_signers(&self) -> Vec<&[u8]> {
        self.signers
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                self.signatures
                    .as_ref()
                    .map_or(true, |slots| slots.get(*i).map_or(true, Option::is_none))
            })
            .map(|(_, signer)| signer.as_slice())
            .collect()
    }

    fn signer_index(&self, public_key: &[u8]) -> Option<usize> {
        self.signers.iter().position(|s| s.as_slice() == public_key)
    }

    fn ensure_unsigned(&self, action: &str) -> Result<(), TxError> {
        if self.signatures.is_some() {
            return Err(TxError::State(format!(
                "cannot {} to an already signed transaction",
                action
            )));
        }
        Ok(())
    }

    // ─── Building ───────────────────────────────────────────────────────────

    /// Append an operation call.
    pub fn add_operation(
        &mut self,
        name: impl Into<String>,
        args: Vec<Gtv>,
    ) -> Result<&mut Self, TxError> {
        self.ensure_unsigned("add operations")?;
        self.operations.push(Operation::new(name, args));
        Ok(self)
    }

    /// Append an operation whose arguments are a dynamic JSON array.
    ///
    /// The arguments are converted before anything is appended, so a
    /// conversion failure leaves the transaction unchanged.
    pub fn add_operation_json(
        &mut self,
        name: impl Into<String>,
        args: &Json,
    ) -> Result<&mut Self, TxError> {
        self.ensure_unsigned("add operations")?;
        let args = match Gtv::from_json(args)? {
            Gtv::List(items) => items,
            other => {
                return Err(GtvError::Conversion {
                    type_name: other.kind_name().to_string(),
                    reason: "operation arguments must be an array".into(),
                }
                .into())
            }
        };
        self.add_operation(name, args)
    }

    /// Register a signer. Its position is its signature slot.
    ///
    /// Any number of signers may be registered while no signature exists.
    pub fn add_signer(&mut self, public_key: impl Into<Vec<u8>>) -> Result<&mut Self, TxError> {
        self.ensure_unsigned("add signers")?;
        let public_key = public_key.into();
        if self.signer_index(&public_key).is_some() {
            return Err(TxError::DuplicateSigner(hex::encode(&public_key)));
        }
        self.signers.push(public_key);
        Ok(self)
    }

    // ─── Digest & signing ───────────────────────────────────────────────────

    /// `[blockchain_rid, operations, signers]`, the part every signer signs.
    pub fn body(&self) -> Gtv {
        Gtv::List(vec![
            Gtv::Bytes(self.blockchain_rid.clone()),
            Gtv::List(self.operations.iter().map(Operation::to_gtv).collect()),
            Gtv::List(self.signers.iter().cloned().map(Gtv::Bytes).collect()),
        ])
    }

    /// Digest of the encoded body. Never depends on attached signatures.
    pub fn digest_to_sign(&self) -> [u8; DIGEST_LEN] {
        let encoded = self.body().encode();
        trace!("hashing {} byte transaction body", encoded.len());
        crypto::sha256(&encoded)
    }

    /// Transaction identifier: the digest as hex.
    pub fn tx_rid(&self) -> String {
        hex::encode(self.digest_to_sign())
    }

    /// Sign with a raw private key and attach the signature.
    ///
    /// When `public_key` is given it must belong to the private key (in
    /// either SEC1 encoding) and the signature lands in the slot registered
    /// under exactly those bytes. When `None`, the slot is looked up under
    /// the compressed and then the uncompressed encoding of the derived key.
    pub fn sign(
        &mut self,
        private_key: &[u8],
        public_key: Option<&[u8]>,
    ) -> Result<&mut Self, TxError> {
        let signer = match public_key {
            Some(pk) => {
                if !crypto::public_key_matches(private_key, pk)? {
                    return Err(crypto::CryptoError::InvalidPublicKey(format!(
                        "{} does not belong to the private key",
                        hex::encode(pk)
                    ))
                    .into());
                }
                pk.to_vec()
            }
            None => self.registered_key_for(private_key)?,
        };
        // Checked before signing so an unknown key fails without ECDSA work.
        if self.signer_index(&signer).is_none() {
            return Err(TxError::SignerNotFound(hex::encode(&signer)));
        }

        let signature = crypto::sign_digest(&self.digest_to_sign(), private_key)?;
        self.attach_signature(&signer, signature.to_vec())
    }

    /// The registered encoding (compressed or uncompressed) of the public key
    /// belonging to `private_key`.
    fn registered_key_for(&self, private_key: &[u8]) -> Result<Vec<u8>, TxError> {
        let compressed = crypto::public_key_from_private(private_key)?;
        let uncompressed = crypto::uncompressed_public_key_from_private(private_key)?;
        let found = [compressed.as_slice(), uncompressed.as_slice()]
            .into_iter()
            .find(|key| self.signer_index(key).is_some())
            .map(<[u8]>::to_vec);
        found.ok_or_else(|| TxError::SignerNotFound(hex::encode(&compressed)))
    }

    /// Sign with a key pair, whichever encoding of its public key was registered.
    pub fn sign_with(&mut self, keypair: &KeyPair) -> Result<&mut Self, TxError> {
        self.sign(&keypair.private_key(), None)
    }

    /// Put `signature` into the slot of the signer with key `public_key`.
    ///
    /// The first attachment creates one empty slot per signer and locks the
    /// operations and signers. Re-attaching for the same signer overwrites
    /// the previous signature.
    pub fn attach_signature(
        &mut self,
        public_key: &[u8],
        signature: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, TxError> {
        let index = self
            .signer_index(public_key)
            .ok_or_else(|| TxError::SignerNotFound(hex::encode(public_key)))?;

        let signer_count = self.signers.len();
        let slots = self
            .signatures
            .get_or_insert_with(|| vec![None; signer_count]);
        if slots.len() != signer_count {
            return Err(TxError::Consistency {
                signers: signer_count,
                signatures: slots.len(),
            });
        }

        slots[index] = Some(signature.into());
        debug!(
            "attached signature for signer {} of {} ({})",
            index + 1,
            signer_count,
            hex::encode(public_key)
        );
        Ok(self)
    }

    /// Check every attached signature against the digest.
    ///
    /// Empty slots are not an error; see [`Gtx::missing_signers`].
    pub fn verify_signatures(&self) -> Result<(), TxError> {
        let Some(slots) = &self.signatures else {
            return Ok(());
        };
        let digest = self.digest_to_sign();
        for (signer, slot) in self.signers.iter().zip(slots) {
            if let Some(signature) = slot {
                if !crypto::verify_digest(&digest, signature, signer) {
                    return Err(TxError::InvalidSignature(hex::encode(signer)));
                }
            }
        }
        Ok(())
    }

    // ─── Serialization ──────────────────────────────────────────────────────

    /// `[body, signatures]`, with empty slots as `Null`.
    pub fn to_gtv(&self) -> Gtv {
        let signatures = self
            .signatures
            .iter()
            .flatten()
            .map(|slot| slot.clone().map_or(Gtv::Null, Gtv::Bytes))
            .collect();
        Gtv::List(vec![self.body(), Gtv::List(signatures)])
    }

    /// Wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        self.to_gtv().encode()
    }

    /// Wire payload as lowercase hex, the form the node's `tx` field takes.
    pub fn serialize(&self) -> String {
        hex::encode(self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(b: u8) -> Vec<u8> {
        vec![b; 33]
    }

    fn sample() -> Gtx {
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_operation("transfer", vec![Gtv::Integer(1000), Gtv::from("alice")])
            .unwrap()
            .add_signer(pk(2))
            .unwrap();
        tx
    }

    #[test]
    fn test_new_rejects_bad_hex() {
        assert!(matches!(
            Gtx::new("not-hex"),
            Err(TxError::InvalidBlockchainRid(_))
        ));
    }

    #[test]
    fn test_rid_roundtrip() {
        let tx = Gtx::new("0A0b").unwrap();
        assert_eq!(tx.blockchain_rid(), "0a0b");
        assert_eq!(tx.blockchain_rid_bytes(), &[0x0a, 0x0b]);
    }

    #[test]
    fn test_unsigned_serialization_vector() {
        assert_eq!(
            sample().serialize(),
            concat!(
                "a560305ea5583056a10404020102a5253023a521301fa20a0c087472616e73666572",
                "a511300fa304020203e8a2070c05616c696365a5273025a12304210202020202020202",
                "02020202020202020202020202020202020202020202020202a5023000"
            )
        );
    }

    #[test]
    fn test_digest_vector() {
        assert_eq!(
            sample().tx_rid(),
            "f6f0a0f325bbce05b56b5420b328d5b6d813f6a1767fb1cab8370ebcfa785107"
        );
    }

    #[test]
    fn test_multiple_signers_before_signing() {
        let mut tx = sample();
        tx.add_signer(pk(3)).unwrap().add_signer(pk(4)).unwrap();
        assert_eq!(tx.signers().len(), 3);
        assert_eq!(tx.signing_state(), SigningState::Building);
    }

    #[test]
    fn test_duplicate_signer_rejected() {
        let mut tx = sample();
        assert!(matches!(tx.add_signer(pk(2)), Err(TxError::DuplicateSigner(_))));
        assert_eq!(tx.signers().len(), 1);
    }

    #[test]
    fn test_add_signer_after_signature_is_state_error() {
        let mut tx = sample();
        tx.attach_signature(&pk(2), vec![0xaa; 64]).unwrap();
        assert!(matches!(tx.add_signer(pk(3)), Err(TxError::State(_))));
    }

    #[test]
    fn test_add_operation_after_signature_is_state_error() {
        let mut tx = sample();
        tx.attach_signature(&pk(2), vec![0xaa; 64]).unwrap();
        let err = tx.add_operation("nop", vec![]).unwrap_err();
        assert!(matches!(err, TxError::State(_)));
        assert_eq!(tx.operations().len(), 1);
    }

    #[test]
    fn test_attach_unknown_signer_leaves_state_untouched() {
        let mut tx = sample();
        let err = tx.attach_signature(&pk(9), vec![0xaa; 64]).unwrap_err();
        assert!(matches!(err, TxError::SignerNotFound(_)));
        assert!(!tx.is_signed());
        // Still buildable.
        tx.add_operation("nop", vec![]).unwrap();
    }

    #[test]
    fn test_attach_with_no_signers() {
        let mut tx = Gtx::new("01").unwrap();
        assert!(tx.attach_signature(&pk(2), vec![1]).is_err());
        assert_eq!(tx.signatures(), None);
    }

    #[test]
    fn test_lazy_slots_and_states() {
        let mut tx = sample();
        tx.add_signer(pk(3)).unwrap();

        tx.attach_signature(&pk(3), vec![0xbb; 64]).unwrap();
        assert_eq!(tx.signing_state(), SigningState::PartiallySigned);
        assert_eq!(tx.signatures().unwrap(), &[None, Some(vec![0xbb; 64])]);
        assert_eq!(tx.missing_signers(), vec![pk(2).as_slice()]);

        tx.attach_signature(&pk(2), vec![0xaa; 64]).unwrap();
        assert!(tx.is_fully_signed());
        assert!(tx.missing_signers().is_empty());
    }

    #[test]
    fn test_consistency_error_on_mismatched_slots() {
        let tx = sample();
        let mut broken = Gtx::from_parts(
            tx.blockchain_rid_bytes().to_vec(),
            tx.operations().to_vec(),
            tx.signers().to_vec(),
            Some(vec![None, None]),
        );
        let err = broken.attach_signature(&pk(2), vec![1]).unwrap_err();
        assert!(matches!(
            err,
            TxError::Consistency {
                signers: 1,
                signatures: 2
            }
        ));
    }

    #[test]
    fn test_overwrite_last_write_wins() {
        let mut tx = sample();
        tx.attach_signature(&pk(2), vec![0x01; 64]).unwrap();
        tx.attach_signature(&pk(2), vec![0x02; 64]).unwrap();
        assert_eq!(tx.signature_for(&pk(2)), Some(&[0x02; 64][..]));
    }

    #[test]
    fn test_empty_slot_serializes_as_null() {
        let mut tx = sample();
        tx.add_signer(pk(3)).unwrap();
        tx.attach_signature(&pk(2), vec![0xaa; 64]).unwrap();
        let sigs = tx.to_gtv().into_list().unwrap().pop().unwrap();
        assert_eq!(sigs, Gtv::list(vec![Gtv::Bytes(vec![0xaa; 64]), Gtv::Null]));
    }

    #[test]
    fn test_add_operation_json() {
        let mut tx = Gtx::new("01").unwrap();
        tx.add_operation_json("transfer", &serde_json::json!([1000, "alice"]))
            .unwrap();
        assert_eq!(
            tx.operations()[0],
            Operation::new("transfer", vec![Gtv::Integer(1000), Gtv::from("alice")])
        );
    }

    #[test]
    fn test_add_operation_json_conversion_error_appends_nothing() {
        let mut tx = Gtx::new("01").unwrap();
        let err = tx
            .add_operation_json("transfer", &serde_json::json!([1000, 1.5]))
            .unwrap_err();
        assert!(matches!(err, TxError::Gtv(GtvError::Conversion { .. })));
        assert!(tx.operations().is_empty());

        let err = tx
            .add_operation_json("transfer", &serde_json::json!("alice"))
            .unwrap_err();
        assert!(matches!(err, TxError::Gtv(GtvError::Conversion { .. })));
    }

    #[test]
    fn test_sign_derives_public_key() {
        let kp = KeyPair::generate();
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(kp.public_key().to_vec()).unwrap();
        tx.sign(&kp.private_key(), None).unwrap();
        assert!(tx.is_fully_signed());
        tx.verify_signatures().unwrap();
    }

    #[test]
    fn test_sign_rejects_foreign_public_key() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(kp.public_key().to_vec()).unwrap();
        let err = tx
            .sign(&kp.private_key(), Some(other.public_key().as_slice()))
            .unwrap_err();
        assert!(matches!(err, TxError::Crypto(_)));
        assert!(!tx.is_signed());
    }

    #[test]
    fn test_sign_for_uncompressed_signer() {
        let kp = KeyPair::generate();
        let uncompressed =
            crypto::uncompressed_public_key_from_private(&kp.private_key()).unwrap();

        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(uncompressed.to_vec()).unwrap();
        tx.sign(&kp.private_key(), Some(uncompressed.as_slice()))
            .unwrap();
        assert!(tx.is_fully_signed());
        assert!(tx.signature_for(&uncompressed).is_some());
        tx.verify_signatures().unwrap();

        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(uncompressed.to_vec()).unwrap();
        tx.sign_with(&kp).unwrap();
        assert!(tx.is_fully_signed());
    }

    #[test]
    fn test_sign_compressed_key_for_uncompressed_slot() {
        let kp = KeyPair::generate();
        let uncompressed =
            crypto::uncompressed_public_key_from_private(&kp.private_key()).unwrap();
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(uncompressed.to_vec()).unwrap();

        // Same point, but no slot is registered under the compressed bytes.
        let err = tx
            .sign(&kp.private_key(), Some(kp.public_key().as_slice()))
            .unwrap_err();
        assert!(matches!(err, TxError::SignerNotFound(_)));
        assert!(!tx.is_signed());
    }

    #[test]
    fn test_sign_unregistered_key() {
        let kp = KeyPair::generate();
        let mut tx = sample();
        assert!(matches!(
            tx.sign_with(&kp),
            Err(TxError::SignerNotFound(_))
        ));
    }

    #[test]
    fn test_verify_flags_bad_signature() {
        let kp = KeyPair::generate();
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_signer(kp.public_key().to_vec()).unwrap();
        tx.attach_signature(&kp.public_key(), vec![0x11; 64]).unwrap();
        assert!(matches!(
            tx.verify_signatures(),
            Err(TxError::InvalidSignature(_))
        ));
    }
}
