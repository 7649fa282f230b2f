//! Rebuilding a [`Gtx`] from its wire payload.
//!
//! Another party receives the serialized hex, decodes it, attaches its own
//! signature and serializes again. The decoded transaction keeps the slot
//! layout it was sent with, so a payload that already carries signatures
//! stays locked against new operations and signers.

use crate::gtx::Gtx;
use crate::operation::Operation;
use crate::TxError;
use postchain_gtv::Gtv;

/// Split a list into exactly `N` elements.
fn fields<const N: usize>(value: Gtv, what: &str) -> Result<[Gtv; N], TxError> {
    let kind = value.kind_name();
    let items = value
        .into_list()
        .ok_or_else(|| TxError::Malformed(format!("{} must be an array, got {}", what, kind)))?;
    let len = items.len();
    <[Gtv; N]>::try_from(items).map_err(|_| {
        TxError::Malformed(format!("{} must have {} elements, got {}", what, N, len))
    })
}

fn bytes(value: Gtv, what: &str) -> Result<Vec<u8>, TxError> {
    match value {
        Gtv::Bytes(b) => Ok(b),
        other => Err(TxError::Malformed(format!(
            "{} must be a byte array, got {}",
            what,
            other.kind_name()
        ))),
    }
}

fn list(value: Gtv, what: &str) -> Result<Vec<Gtv>, TxError> {
    let kind = value.kind_name();
    value
        .into_list()
        .ok_or_else(|| TxError::Malformed(format!("{} must be an array, got {}", what, kind)))
}

impl Gtx {
    /// Decode a wire payload `[[rid, operations, signers], signatures]`.
    pub fn decode(data: &[u8]) -> Result<Self, TxError> {
        let [body, signatures] = fields::<2>(Gtv::decode(data)?, "transaction")?;
        let [rid, operations, signers] = fields::<3>(body, "transaction body")?;

        let blockchain_rid = bytes(rid, "blockchain RID")?;
        let operations = list(operations, "operations")?
            .iter()
            .map(Operation::from_gtv)
            .collect::<Result<Vec<_>, _>>()?;
        let signers = list(signers, "signers")?
            .into_iter()
            .map(|s| bytes(s, "signer"))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, signer) in signers.iter().enumerate() {
            if signers[..i].contains(signer) {
                return Err(TxError::DuplicateSigner(hex::encode(signer)));
            }
        }

        let slots = list(signatures, "signatures")?;
        let signatures = if slots.is_empty() {
            None
        } else {
            if slots.len() != signers.len() {
                return Err(TxError::Consistency {
                    signers: signers.len(),
                    signatures: slots.len(),
                });
            }
            let slots = slots
                .into_iter()
                .map(|slot| match slot {
                    Gtv::Null => Ok(None),
                    Gtv::Bytes(sig) => Ok(Some(sig)),
                    other => Err(TxError::Malformed(format!(
                        "signature must be a byte array or null, got {}",
                        other.kind_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(slots)
        };

        Ok(Gtx::from_parts(blockchain_rid, operations, signers, signatures))
    }

    /// Decode the hex form produced by [`Gtx::serialize`].
    pub fn deserialize(payload: &str) -> Result<Self, TxError> {
        let data = hex::decode(payload.trim())
            .map_err(|e| TxError::Malformed(format!("payload is not hex: {}", e)))?;
        Self::decode(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SigningState;
    use postchain_gtv::GtvError;

    fn two_signer_tx() -> Gtx {
        let mut tx = Gtx::new("0102").unwrap();
        tx.add_operation("transfer", vec![Gtv::Integer(1000), Gtv::from("alice")])
            .unwrap()
            .add_signer(vec![0x02; 33])
            .unwrap()
            .add_signer(vec![0x03; 33])
            .unwrap();
        tx
    }

    #[test]
    fn test_unsigned_roundtrip() {
        let tx = two_signer_tx();
        let back = Gtx::deserialize(&tx.serialize()).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.signing_state(), SigningState::Building);
    }

    #[test]
    fn test_partial_roundtrip_keeps_null_slot() {
        let mut tx = two_signer_tx();
        tx.attach_signature(&[0x02; 33], vec![0xaa; 64]).unwrap();
        let hex = tx.serialize();
        assert!(hex.starts_with("a581ce3081cba57d307b"), "{}", hex);
        assert!(hex.ends_with("a0020500"), "{}", hex);

        let back = Gtx::deserialize(&hex).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.missing_signers(), vec![&[0x03u8; 33][..]]);
    }

    #[test]
    fn test_decoded_signed_tx_is_locked() {
        let mut tx = two_signer_tx();
        tx.attach_signature(&[0x03; 33], vec![0xbb; 64]).unwrap();
        let mut back = Gtx::decode(&tx.encode()).unwrap();
        assert!(matches!(
            back.add_operation("nop", vec![]),
            Err(TxError::State(_))
        ));
    }

    #[test]
    fn test_all_null_slots_stay_signed() {
        let tx = two_signer_tx();
        let wire = Gtv::list(vec![tx.body(), Gtv::list(vec![Gtv::Null, Gtv::Null])]);
        let back = Gtx::decode(&wire.encode()).unwrap();
        assert_eq!(back.signing_state(), SigningState::PartiallySigned);
        assert_eq!(back.missing_signers().len(), 2);
    }

    #[test]
    fn test_slot_count_mismatch() {
        let tx = two_signer_tx();
        let wire = Gtv::list(vec![tx.body(), Gtv::list(vec![Gtv::Bytes(vec![1])])]);
        assert!(matches!(
            Gtx::decode(&wire.encode()),
            Err(TxError::Consistency {
                signers: 2,
                signatures: 1
            })
        ));
    }

    #[test]
    fn test_shape_violations() {
        let cases = vec![
            Gtv::Integer(1),
            Gtv::list(vec![Gtv::list(Vec::<Gtv>::new())]),
            Gtv::list(vec![
                Gtv::list(vec![Gtv::from("0102"), Gtv::list(Vec::<Gtv>::new()), Gtv::list(Vec::<Gtv>::new())]),
                Gtv::list(Vec::<Gtv>::new()),
            ]),
            Gtv::list(vec![
                Gtv::list(vec![
                    Gtv::Bytes(vec![1]),
                    Gtv::list(Vec::<Gtv>::new()),
                    Gtv::list(vec![Gtv::Integer(2)]),
                ]),
                Gtv::list(Vec::<Gtv>::new()),
            ]),
        ];
        for case in cases {
            let err = Gtx::decode(&case.encode()).unwrap_err();
            assert!(matches!(err, TxError::Malformed(_)), "{} -> {}", case, err);
        }
    }

    #[test]
    fn test_duplicate_signers_rejected() {
        let pk = Gtv::Bytes(vec![0x02; 33]);
        let body = Gtv::list(vec![
            Gtv::Bytes(vec![0x01, 0x02]),
            Gtv::list(Vec::<Gtv>::new()),
            Gtv::list(vec![pk.clone(), Gtv::Bytes(vec![0x03; 33]), pk]),
        ]);
        let wire = Gtv::list(vec![body, Gtv::list(Vec::<Gtv>::new())]);
        assert!(matches!(
            Gtx::decode(&wire.encode()),
            Err(TxError::DuplicateSigner(ref key)) if *key == hex::encode([0x02u8; 33])
        ));
    }

    #[test]
    fn test_bad_signature_slot_kind() {
        let tx = two_signer_tx();
        let wire = Gtv::list(vec![
            tx.body(),
            Gtv::list(vec![Gtv::Bytes(vec![1]), Gtv::from("sig")]),
        ]);
        assert!(matches!(
            Gtx::decode(&wire.encode()),
            Err(TxError::Malformed(_))
        ));
    }

    #[test]
    fn test_codec_errors_propagate() {
        assert!(matches!(
            Gtx::decode(&[0x50, 0x00]),
            Err(TxError::Gtv(GtvError::Format(_)))
        ));
        assert!(matches!(
            Gtx::deserialize("zz"),
            Err(TxError::Malformed(_))
        ));
    }
}
