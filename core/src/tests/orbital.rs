//! End-to-end against the real `orbital` binary. Skipped when it is not
//! installed.

use std::sync::Arc;

use mixer_ring::{MixerEvent, RingId};

use crate::ledger::{RingError, RingLedger, RingState, reject_identity};
use crate::signer::{OrbitalSigner, OrbitalTool, OrbitalVerifier, SignerVerifier};

fn orbital() -> Option<OrbitalTool> {
    let tool = OrbitalTool::locate("orbital", None);
    if tool.is_none() {
        eprintln!("orbital not found, skipping");
    }
    tool
}

#[tokio::test]
async fn integrates_with_orbital() {
    let Some(tool) = orbital() else {
        return;
    };
    let signer = OrbitalSigner::new(tool.clone());
    let mut ledger = RingLedger::new(
        4,
        Arc::new(reject_identity),
        Arc::new(OrbitalVerifier::new(tool)),
    );

    let keys = signer.generate_keys(4).await.unwrap();
    let mut message = None;
    for pk in &keys.pubkeys {
        let out = ledger.deposit(1, 0, pk.clone(), 1).unwrap();
        for e in out.events {
            if let MixerEvent::Ready { message: m, .. } = e {
                message = Some(m);
            }
        }
    }
    let message = message.unwrap();
    assert_eq!(ledger.total_escrow(), 4);

    let inputs = signer.derive_inputs(&keys, 4, &message).await.unwrap();
    assert!(signer.verify_offline(&inputs, &message).await.unwrap());

    let mut last = None;
    for sig in &inputs.signatures {
        let out = ledger.withdraw(RingId(0), &sig.tag(), &sig.ctlist).unwrap();
        assert!(matches!(
            ledger.withdraw(RingId(0), &sig.tag(), &sig.ctlist),
            Err(RingError::DuplicateWithdrawal(_)) | Err(RingError::RingNotReady(_))
        ));
        last = Some(out);
    }

    assert!(last.unwrap().killed());
    assert_eq!(ledger.ring(RingId(0)).unwrap().state(), RingState::Dead);
    assert_eq!(ledger.total_escrow(), 0);
}
