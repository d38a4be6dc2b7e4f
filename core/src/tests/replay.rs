use mixer_ring::{KeySet, MixerEvent, RingId, RingMessage};

use super::mock_ledger;
use crate::ledger::{RingError, RingLedger, RingState};
use crate::signer::{MockSigner, SignerVerifier};

/// Deposit every key and return the ring message
fn fill(ledger: &mut RingLedger, keys: &KeySet, token: u64) -> (RingId, RingMessage) {
    let mut ring = None;
    let mut message = None;
    for pk in &keys.pubkeys {
        let out = ledger.deposit(1, token, pk.clone(), 1).unwrap();
        ring = Some(out.ring_id);
        for e in out.events {
            if let MixerEvent::Ready { message: m, .. } = e {
                message = Some(m);
            }
        }
    }
    (ring.unwrap(), message.unwrap())
}

#[tokio::test]
async fn signature_for_one_ring_fails_on_another() {
    let mut ledger = mock_ledger(3);
    let signer = MockSigner::default();
    let keys = signer.generate_keys(3).await.unwrap();

    // same members in two rings
    let (ring_a, msg_a) = fill(&mut ledger, &keys, 0);
    let (ring_b, msg_b) = fill(&mut ledger, &keys, 0);
    assert_ne!(ring_a, ring_b);
    assert_ne!(msg_a, msg_b);

    let sigs_a = signer.derive_inputs(&keys, 3, &msg_a).await.unwrap();
    let sig = &sigs_a.signatures[0];

    assert_eq!(
        ledger.withdraw(ring_b, &sig.tag(), &sig.ctlist),
        Err(RingError::InvalidSignature(ring_b))
    );
    assert_eq!(
        ledger.ring(ring_b).unwrap().state(),
        RingState::Ready,
        "rejected withdrawal must not touch the ring"
    );

    // the proper ring accepts it, and ring B still takes its own signatures
    ledger.withdraw(ring_a, &sig.tag(), &sig.ctlist).unwrap();
    let sigs_b = signer.derive_inputs(&keys, 3, &msg_b).await.unwrap();
    let sig_b = &sigs_b.signatures[0];
    ledger.withdraw(ring_b, &sig_b.tag(), &sig_b.ctlist).unwrap();
}

#[tokio::test]
async fn replays_never_release_value() {
    let mut ledger = mock_ledger(2);
    let signer = MockSigner::default();
    let keys = signer.generate_keys(2).await.unwrap();
    let (ring, msg) = fill(&mut ledger, &keys, 0);
    let sigs = signer.derive_inputs(&keys, 2, &msg).await.unwrap();
    let sig = &sigs.signatures[1];

    ledger.withdraw(ring, &sig.tag(), &sig.ctlist).unwrap();
    for _ in 0..3 {
        assert_eq!(
            ledger.withdraw(ring, &sig.tag(), &sig.ctlist),
            Err(RingError::DuplicateWithdrawal(ring))
        );
    }

    let r = ledger.ring(ring).unwrap();
    assert_eq!(r.remaining(), 1);
    assert_eq!(r.released(), 1);
    assert_eq!(r.spent_tags().len(), 1);
}

#[tokio::test]
async fn forged_payload_is_invalid_signature() {
    let mut ledger = mock_ledger(2);
    let signer = MockSigner::default();
    let keys = signer.generate_keys(2).await.unwrap();
    let (ring, msg) = fill(&mut ledger, &keys, 7);
    let sigs = signer.derive_inputs(&keys, 2, &msg).await.unwrap();

    let mut payload = sigs.signatures[0].ctlist.clone();
    payload[1] += 1u32;
    assert_eq!(
        ledger.withdraw(ring, &sigs.signatures[0].tag(), &payload),
        Err(RingError::InvalidSignature(ring))
    );
    assert!(ledger.ring(ring).unwrap().spent_tags().is_empty());
}
