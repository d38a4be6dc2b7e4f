mod orbital;
mod replay;

use std::sync::Arc;

use crate::ledger::{RingLedger, reject_identity};
use crate::signer::MockVerifier;

/// Ledger wired to the mock signer's verifier
fn mock_ledger(capacity: usize) -> RingLedger {
    RingLedger::new(capacity, Arc::new(reject_identity), Arc::new(MockVerifier))
}
