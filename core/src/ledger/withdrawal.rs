//! Withdrawal validation.
//!
//! Checks run cheapest first: state gate, spent-tag lookup, then the external
//! ring signature verifier. The verifier sees the ring message, so a signature
//! made for one ring never verifies against another even when the two rings
//! share members.

use std::sync::Arc;

use mixer_ring::{LinkTag, PublicKey, RingMessage};
use num_bigint::BigUint;

use super::errors::{Result, RingError};
use super::ring::Ring;

/// Linkable ring signature verification.
///
/// `payload` is the signature's challenge/response list, opaque to the ledger.
pub trait RingVerifier: Send + Sync {
    fn verify(
        &self,
        participants: &[PublicKey],
        message: &RingMessage,
        tag: &LinkTag,
        payload: &[BigUint],
    ) -> bool;
}

/// Verifier used when no backend is configured: every withdrawal fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl RingVerifier for RejectAll {
    fn verify(&self, _: &[PublicKey], _: &RingMessage, _: &LinkTag, _: &[BigUint]) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct WithdrawalValidator {
    verifier: Arc<dyn RingVerifier>,
}

impl WithdrawalValidator {
    pub fn new(verifier: Arc<dyn RingVerifier>) -> Self {
        Self { verifier }
    }

    pub fn validate(&self, ring: &Ring, tag: &LinkTag, payload: &[BigUint]) -> Result<()> {
        let message = match ring.message() {
            Some(message) if ring.state().accepts_withdrawals() => message,
            _ => return Err(RingError::RingNotReady(ring.id())),
        };

        if ring.is_tag_spent(tag) {
            return Err(RingError::DuplicateWithdrawal(ring.id()));
        }

        if !self
            .verifier
            .verify(ring.participants(), message, tag, payload)
        {
            return Err(RingError::InvalidSignature(ring.id()));
        }

        Ok(())
    }
}

impl Default for WithdrawalValidator {
    fn default() -> Self {
        Self::new(Arc::new(RejectAll))
    }
}

impl std::fmt::Debug for WithdrawalValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithdrawalValidator").finish_non_exhaustive()
    }
}
