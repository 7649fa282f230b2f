//! Multi-party signing flows over the public API.

use postchain_crypto::{sign_digest, verify_digest, KeyPair};
use postchain_gtv::Gtv;
use postchain_tx::{Gtx, SigningState, TxError};

fn transfer_tx(signers: &[&KeyPair]) -> Gtx {
    let mut tx = Gtx::new("0102").unwrap();
    tx.add_operation("transfer", vec![Gtv::Integer(1000), Gtv::from("alice")])
        .unwrap();
    for kp in signers {
        tx.add_signer(kp.public_key().to_vec()).unwrap();
    }
    tx
}

#[test]
fn end_to_end_external_signature() {
    let a = KeyPair::generate();
    let mut tx = transfer_tx(&[&a]);

    let digest = tx.digest_to_sign();
    let sig_a = sign_digest(&digest, &a.private_key()).unwrap();
    tx.attach_signature(&a.public_key(), sig_a.to_vec()).unwrap();

    let payload = tx.serialize();
    assert_eq!(payload, tx.serialize());

    let decoded = Gtv::decode(&hex::decode(&payload).unwrap()).unwrap();
    let expected = Gtv::list(vec![
        Gtv::list(vec![
            Gtv::Bytes(vec![0x01, 0x02]),
            Gtv::list(vec![Gtv::list(vec![
                Gtv::from("transfer"),
                Gtv::list(vec![Gtv::Integer(1000), Gtv::from("alice")]),
            ])]),
            Gtv::list(vec![Gtv::from(a.public_key())]),
        ]),
        Gtv::list(vec![Gtv::from(sig_a)]),
    ]);
    assert_eq!(decoded, expected);
    assert!(verify_digest(&digest, &sig_a, &a.public_key()));
}

#[test]
fn digest_ignores_signatures() {
    let a = KeyPair::generate();
    let b = KeyPair::generate();
    let mut tx = transfer_tx(&[&a, &b]);

    let before = tx.digest_to_sign();
    tx.sign_with(&a).unwrap();
    assert_eq!(tx.digest_to_sign(), before);
    tx.sign_with(&b).unwrap();
    assert_eq!(tx.digest_to_sign(), before);
    assert_eq!(tx.tx_rid(), hex::encode(before));
}

#[test]
fn slots_align_in_any_order() {
    let keys: Vec<KeyPair> = (0..4).map(|_| KeyPair::generate()).collect();
    let refs: Vec<&KeyPair> = keys.iter().collect();

    for order in [[3, 1, 0, 2], [0, 1, 2, 3], [2, 3, 1, 0]] {
        let mut tx = transfer_tx(&refs);
        for &i in &order {
            tx.sign_with(&keys[i]).unwrap();
        }
        assert!(tx.is_fully_signed());
        let slots = tx.signatures().unwrap();
        for (i, kp) in keys.iter().enumerate() {
            let sig = slots[i].as_deref().unwrap();
            assert!(verify_digest(&tx.digest_to_sign(), sig, &kp.public_key()));
        }
        tx.verify_signatures().unwrap();
    }
}

#[test]
fn overwrite_keeps_last_signature() {
    let a = KeyPair::generate();
    let mut tx = transfer_tx(&[&a]);
    tx.attach_signature(&a.public_key(), vec![0x01; 64]).unwrap();
    tx.attach_signature(&a.public_key(), vec![0x02; 64]).unwrap();
    assert_eq!(tx.signatures().unwrap(), &[Some(vec![0x02; 64])]);
}

#[test]
fn mutation_after_signing_fails() {
    let a = KeyPair::generate();
    let mut tx = transfer_tx(&[&a]);
    tx.sign_with(&a).unwrap();

    let snapshot = tx.clone();
    assert!(matches!(
        tx.add_operation("nop", vec![]),
        Err(TxError::State(_))
    ));
    assert!(matches!(
        tx.add_signer(KeyPair::generate().public_key().to_vec()),
        Err(TxError::State(_))
    ));
    assert_eq!(tx, snapshot);
}

#[test]
fn unknown_signer_is_rejected() {
    let a = KeyPair::generate();
    let stranger = KeyPair::generate();
    let mut tx = transfer_tx(&[&a]);
    assert!(matches!(
        tx.attach_signature(&stranger.public_key(), vec![0; 64]),
        Err(TxError::SignerNotFound(_))
    ));
    assert_eq!(tx.signing_state(), SigningState::Building);
}

#[test]
fn two_parties_exchange_payload() {
    let a = KeyPair::generate();
    let b = KeyPair::generate();

    // Party A builds, signs and ships the partially signed payload.
    let mut tx = transfer_tx(&[&a, &b]);
    tx.sign_with(&a).unwrap();
    assert_eq!(tx.signing_state(), SigningState::PartiallySigned);
    let wire = tx.serialize();

    // Party B picks it up, checks what it signs and adds its signature.
    let mut received = Gtx::deserialize(&wire).unwrap();
    assert_eq!(received.tx_rid(), tx.tx_rid());
    assert_eq!(received.missing_signers(), vec![&b.public_key()[..]]);
    received.verify_signatures().unwrap();
    received.sign_with(&b).unwrap();

    let complete = Gtx::deserialize(&received.serialize()).unwrap();
    assert!(complete.is_fully_signed());
    complete.verify_signatures().unwrap();
    assert_eq!(complete.signature_for(&a.public_key()), tx.signature_for(&a.public_key()));
}
