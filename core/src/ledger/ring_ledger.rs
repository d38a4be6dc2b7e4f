//! Ring Ledger
//!
//! Owns every ring, composes the deposit and withdrawal validators and emits
//! lifecycle events.
//!
//! ```text
//! deposit(denom, token, pk, value)
//!   └─ target = earliest Open ring for (denom, token), else a new ring
//!      └─ DepositValidator ─ ok ─> admit pk ─> [Deposit] (+ [Ready] when full)
//!
//! withdraw(ring_id, tag, payload)
//!   └─ WithdrawalValidator ─ ok ─> spend tag ─> [Withdraw] (+ [Dead] at zero)
//! ```
//!
//! All checks run before the first mutation, so a rejected call leaves the
//! ledger untouched and can simply be retried.

use std::sync::Arc;

use log::{debug, info, warn};
use mixer_ring::{LinkTag, MixerEvent, PublicKey, RingId, TokenId};
use num_bigint::BigUint;

use super::deposit::{DepositValidator, KeyCheck};
use super::errors::{Result, RingError};
use super::message::{Blake3Message, MessageDeriver};
use super::ring::{Ring, RingState};
use super::withdrawal::{RingVerifier, WithdrawalValidator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    pub ring_id: RingId,
    pub position: usize,
    pub events: Vec<MixerEvent>,
}

impl DepositOutcome {
    /// True if this deposit filled the ring
    pub fn sealed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, MixerEvent::Ready { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub ring_id: RingId,
    pub remaining: usize,
    pub events: Vec<MixerEvent>,
}

impl WithdrawOutcome {
    /// True if this withdrawal emptied the ring
    pub fn killed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, MixerEvent::Dead { .. }))
    }
}

pub struct RingLedger {
    capacity: usize,
    /// Indexed by `RingId`; rings are never removed
    rings: Vec<Ring>,
    deposits: DepositValidator,
    withdrawals: WithdrawalValidator,
    deriver: Arc<dyn MessageDeriver>,
    /// Value held by the control transactions, outside any ring
    benchmark_escrow: u128,
}

impl RingLedger {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(
        capacity: usize,
        key_check: Arc<dyn KeyCheck>,
        verifier: Arc<dyn RingVerifier>,
    ) -> Self {
        Self::with_deriver(capacity, key_check, verifier, Arc::new(Blake3Message))
    }

    /// [`new`](Self::new) with a custom ring message deriver.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_deriver(
        capacity: usize,
        key_check: Arc<dyn KeyCheck>,
        verifier: Arc<dyn RingVerifier>,
        deriver: Arc<dyn MessageDeriver>,
    ) -> Self {
        assert!(capacity > 0, "ring capacity must be at least 1");
        Self {
            capacity,
            rings: Vec::new(),
            deposits: DepositValidator::new(key_check),
            withdrawals: WithdrawalValidator::new(verifier),
            deriver,
            benchmark_escrow: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ring(&self, id: RingId) -> Option<&Ring> {
        usize::try_from(id.0).ok().and_then(|i| self.rings.get(i))
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// The ring the next matching deposit would join, if one exists
    pub fn open_ring(&self, denomination: u64, token: TokenId) -> Option<&Ring> {
        self.open_index(denomination, token).map(|i| &self.rings[i])
    }

    /// Value held across all rings and the control pool
    pub fn total_escrow(&self) -> u128 {
        self.rings.iter().map(Ring::escrow).sum::<u128>() + self.benchmark_escrow
    }

    pub fn benchmark_escrow(&self) -> u128 {
        self.benchmark_escrow
    }

    fn open_index(&self, denomination: u64, token: TokenId) -> Option<usize> {
        // Vec order is creation order, so the first hit is the oldest
        self.rings.iter().position(|r| {
            r.state() == RingState::Open && r.matches(denomination, token) && !r.is_full()
        })
    }

    // ========================================================================
    // Ring protocol
    // ========================================================================

    pub fn deposit(
        &mut self,
        denomination: u64,
        token: TokenId,
        pubkey: PublicKey,
        value: u64,
    ) -> Result<DepositOutcome> {
        let target = self.open_index(denomination, token);

        if let Err(e) = self.deposits.validate(
            target.map(|i| &self.rings[i]),
            &pubkey,
            value,
            denomination,
        ) {
            warn!("Deposit rejected: {e}");
            return Err(e);
        }

        let index = match target {
            Some(i) => i,
            None => {
                let id = RingId(self.rings.len() as u64);
                self.rings
                    .push(Ring::new(id, denomination, token, self.capacity));
                info!(
                    "Created {id} (denomination={denomination}, token={token}, capacity={})",
                    self.capacity
                );
                self.rings.len() - 1
            }
        };

        let ring = &mut self.rings[index];
        let ring_id = ring.id();
        let key_fp = pubkey.fingerprint();
        let position = ring.admit(pubkey, value);
        debug!("Deposit into {ring_id} at position {position} (key {key_fp})");

        let mut events = vec![MixerEvent::Deposit { ring_id, position }];

        if ring.is_full() {
            let message = self.deriver.derive(ring_id, ring.participants());
            ring.mark_ready(message);
            info!("{ring_id} is ready, message {message}");
            events.push(MixerEvent::Ready { ring_id, message });
        }

        Ok(DepositOutcome {
            ring_id,
            position,
            events,
        })
    }

    pub fn withdraw(
        &mut self,
        ring_id: RingId,
        tag: &LinkTag,
        payload: &[BigUint],
    ) -> Result<WithdrawOutcome> {
        let index = usize::try_from(ring_id.0)
            .ok()
            .filter(|i| *i < self.rings.len())
            .ok_or(RingError::RingNotFound(ring_id))
            .inspect_err(|e| warn!("Withdrawal rejected: {e}"))?;

        let ring = &self.rings[index];
        if let Err(e) = self.withdrawals.validate(ring, tag, payload) {
            warn!("Withdrawal rejected: {e}");
            return Err(e);
        }

        if ring.remaining() == 1 {
            let released = ring.released() + ring.denomination() as u128;
            if released != ring.deposited() {
                let err = RingError::EscrowMismatch {
                    ring_id,
                    deposited: ring.deposited(),
                    released,
                };
                warn!("Withdrawal rejected: {err}");
                return Err(err);
            }
        }

        let ring = &mut self.rings[index];
        let dead = ring.record_withdrawal(tag.clone());
        let remaining = ring.remaining();
        debug!("Withdrawal from {ring_id} with {tag}, {remaining} remaining");

        let mut events = vec![MixerEvent::Withdraw {
            ring_id,
            tag: tag.clone(),
        }];
        if dead {
            info!("{ring_id} is dead");
            events.push(MixerEvent::Dead { ring_id });
        }

        Ok(WithdrawOutcome {
            ring_id,
            remaining,
            events,
        })
    }

    // ========================================================================
    // Control transactions
    // ========================================================================

    /// Value check and escrow credit only; no ring is touched
    pub fn benchmark_deposit(&mut self, denomination: u64, value: u64) -> Result<MixerEvent> {
        if value != denomination {
            return Err(RingError::WrongValue {
                expected: denomination,
                got: value,
            });
        }
        self.benchmark_escrow += value as u128;
        Ok(MixerEvent::Benchmark { value })
    }

    /// Releases `denomination` from the control pool
    pub fn benchmark_withdraw(&mut self, denomination: u64) -> Result<MixerEvent> {
        if self.benchmark_escrow < denomination as u128 {
            return Err(RingError::InsufficientEscrow {
                requested: denomination,
                available: self.benchmark_escrow,
            });
        }
        self.benchmark_escrow -= denomination as u128;
        Ok(MixerEvent::Benchmark {
            value: denomination,
        })
    }
}

impl std::fmt::Debug for RingLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingLedger")
            .field("capacity", &self.capacity)
            .field("rings", &self.rings.len())
            .field("benchmark_escrow", &self.benchmark_escrow)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::deposit::reject_identity;
    use crate::ledger::withdrawal::RejectAll;
    use mixer_ring::Point;

    fn ledger(capacity: usize) -> RingLedger {
        RingLedger::new(capacity, Arc::new(reject_identity), Arc::new(RejectAll))
    }

    fn key(i: u32) -> PublicKey {
        Point::new(i, i * 7 + 1)
    }

    #[test]
    #[should_panic(expected = "ring capacity must be at least 1")]
    fn test_zero_capacity_is_refused() {
        ledger(0);
    }

    #[test]
    fn test_single_member_rings_stay_bounded() {
        let mut ledger = ledger(1);
        for i in 1..=3 {
            let out = ledger.deposit(1, 0, key(i), 1).unwrap();
            assert_eq!(out.position, 0);
            assert!(out.sealed());
        }
        assert_eq!(ledger.rings().len(), 3);
        assert!(ledger.rings().iter().all(|r| r.participants().len() == 1));
    }

    #[test]
    fn test_fifo_fill_and_new_ring_when_full() {
        let mut ledger = ledger(2);
        let a = ledger.deposit(1, 0, key(1), 1).unwrap();
        let b = ledger.deposit(1, 0, key(2), 1).unwrap();
        let c = ledger.deposit(1, 0, key(3), 1).unwrap();

        assert_eq!(a.ring_id, RingId(0));
        assert_eq!(b.ring_id, RingId(0));
        assert!(b.sealed());
        assert_eq!(c.ring_id, RingId(1));
        assert_eq!(c.position, 0);
    }

    #[test]
    fn test_rings_are_per_denomination_and_token() {
        let mut ledger = ledger(3);
        let a = ledger.deposit(1, 0, key(1), 1).unwrap();
        let b = ledger.deposit(2, 0, key(2), 2).unwrap();
        let c = ledger.deposit(1, 9, key(3), 1).unwrap();
        let d = ledger.deposit(1, 0, key(4), 1).unwrap();

        assert_eq!(a.ring_id, RingId(0));
        assert_eq!(b.ring_id, RingId(1));
        assert_eq!(c.ring_id, RingId(2));
        assert_eq!(d.ring_id, RingId(0));
        assert_eq!(ledger.open_ring(1, 0).map(Ring::id), Some(RingId(0)));
    }

    #[test]
    fn test_rejected_deposit_mutates_nothing() {
        let mut ledger = ledger(2);
        ledger.deposit(1, 0, key(1), 1).unwrap();

        assert_eq!(
            ledger.deposit(1, 0, key(1), 1),
            Err(RingError::DuplicateKey(RingId(0)))
        );
        assert!(matches!(
            ledger.deposit(1, 0, key(2), 5),
            Err(RingError::WrongValue { .. })
        ));
        assert_eq!(
            ledger.deposit(1, 0, Point::new(0u32, 0u32), 1),
            Err(RingError::InvalidKey)
        );

        let ring = ledger.ring(RingId(0)).unwrap();
        assert_eq!(ring.participants().len(), 1);
        assert_eq!(ring.deposited(), 1);
        assert_eq!(ledger.rings().len(), 1);
    }

    #[test]
    fn test_same_key_may_join_another_ring() {
        let mut ledger = ledger(2);
        ledger.deposit(1, 0, key(1), 1).unwrap();
        ledger.deposit(1, 0, key(2), 1).unwrap();
        let again = ledger.deposit(1, 0, key(1), 1).unwrap();
        assert_eq!(again.ring_id, RingId(1));
    }

    #[test]
    fn test_withdraw_unknown_ring() {
        let mut ledger = ledger(2);
        let tag = LinkTag(key(9));
        assert_eq!(
            ledger.withdraw(RingId(3), &tag, &[]),
            Err(RingError::RingNotFound(RingId(3)))
        );
    }

    #[test]
    fn test_benchmark_controls_balance() {
        let mut ledger = ledger(2);
        assert_eq!(
            ledger.benchmark_deposit(1, 1),
            Ok(MixerEvent::Benchmark { value: 1 })
        );
        assert_eq!(ledger.benchmark_escrow(), 1);
        assert!(ledger.benchmark_withdraw(1).is_ok());
        assert_eq!(
            ledger.benchmark_withdraw(1),
            Err(RingError::InsufficientEscrow {
                requested: 1,
                available: 0
            })
        );
        assert_eq!(ledger.total_escrow(), 0);
        assert!(ledger.rings().is_empty());
    }
}
