//! Transaction executor.
//!
//! The harness talks to the ledger through [`Ledger`]: submit one transaction,
//! await its receipt. [`LocalLedger`] is the in-process implementation; it
//! runs every transaction atomically against a [`RingLedger`] and meters it
//! with a fixed [`CostSchedule`], so costs are reproducible across runs.

use log::debug;
use mixer_ring::{MixerEvent, PublicKey, RingId, RingSignature, TokenId};
use thiserror::Error;

use super::errors::RingError;
use super::ring_ledger::RingLedger;

#[derive(Debug, Clone)]
pub enum MixerTx {
    Deposit {
        denomination: u64,
        token: TokenId,
        pubkey: PublicKey,
        value: u64,
    },
    Withdraw {
        ring_id: RingId,
        signature: RingSignature,
    },
    /// Control: value check only
    BenchmarkDeposit { denomination: u64, value: u64 },
    /// Control: escrow release only
    BenchmarkWithdraw { denomination: u64 },
}

impl MixerTx {
    pub fn kind(&self) -> &'static str {
        match self {
            MixerTx::Deposit { .. } => "deposit",
            MixerTx::Withdraw { .. } => "withdraw",
            MixerTx::BenchmarkDeposit { .. } => "benchmark_deposit",
            MixerTx::BenchmarkWithdraw { .. } => "benchmark_withdraw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub events: Vec<MixerEvent>,
    /// Metered cost units
    pub cost: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The protocol refused the transaction; nothing changed
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] RingError),

    /// The executor itself failed
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

impl LedgerError {
    pub fn ring_error(&self) -> Option<&RingError> {
        match self {
            LedgerError::Rejected(e) => Some(e),
            LedgerError::Transaction(_) => None,
        }
    }
}

/// A strictly ordered, atomic transaction executor.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Number of participants each ring holds
    fn ring_capacity(&self) -> usize;

    /// Execute `tx` and return its receipt.
    ///
    /// # Blocking
    ///
    /// Implementations may do synchronous work before the future resolves.
    /// [`LocalLedger`] executes in place, and with an
    /// [`OrbitalVerifier`](crate::signer::OrbitalVerifier) every withdrawal
    /// waits on a `verify` subprocess on the calling thread. Callers that
    /// share the runtime with other tasks should submit from a blocking-safe
    /// context.
    async fn submit(&mut self, tx: MixerTx) -> Result<Receipt, LedgerError>;
}

/// Cost units charged per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    pub base: u64,
    pub storage_write: u64,
    pub event: u64,
    /// Signature verification, per ring member
    pub verify_per_member: u64,
}

impl Default for CostSchedule {
    fn default() -> Self {
        Self {
            base: 21_000,
            storage_write: 20_000,
            event: 1_500,
            verify_per_member: 6_000,
        }
    }
}

pub struct LocalLedger {
    ledger: RingLedger,
    costs: CostSchedule,
}

impl LocalLedger {
    pub fn new(ledger: RingLedger) -> Self {
        Self::with_costs(ledger, CostSchedule::default())
    }

    pub fn with_costs(ledger: RingLedger, costs: CostSchedule) -> Self {
        Self { ledger, costs }
    }

    pub fn inner(&self) -> &RingLedger {
        &self.ledger
    }

    pub fn costs(&self) -> CostSchedule {
        self.costs
    }

    /// Execute synchronously; the async `submit` delegates here
    pub fn execute(&mut self, tx: MixerTx) -> Result<Receipt, LedgerError> {
        let c = self.costs;
        let kind = tx.kind();

        let (events, writes, verified) = match tx {
            MixerTx::Deposit {
                denomination,
                token,
                pubkey,
                value,
            } => {
                let out = self.ledger.deposit(denomination, token, pubkey, value)?;
                // participant + escrow, plus message and state when sealing
                let writes = if out.sealed() { 4 } else { 2 };
                (out.events, writes, 0)
            }
            MixerTx::Withdraw { ring_id, signature } => {
                let members = self
                    .ledger
                    .ring(ring_id)
                    .map(|r| r.participants().len())
                    .unwrap_or(0);
                let tag = signature.tag();
                let out = self.ledger.withdraw(ring_id, &tag, &signature.ctlist)?;
                // spent tag, remaining, state
                (out.events, 3, members as u64)
            }
            MixerTx::BenchmarkDeposit {
                denomination,
                value,
            } => {
                let event = self.ledger.benchmark_deposit(denomination, value)?;
                (vec![event], 1, 0)
            }
            MixerTx::BenchmarkWithdraw { denomination } => {
                let event = self.ledger.benchmark_withdraw(denomination)?;
                (vec![event], 1, 0)
            }
        };

        let cost = c.base
            + writes * c.storage_write
            + events.len() as u64 * c.event
            + verified * c.verify_per_member;
        debug!("{kind}: {} event(s), cost {cost}", events.len());

        Ok(Receipt { events, cost })
    }
}

impl Ledger for LocalLedger {
    fn ring_capacity(&self) -> usize {
        self.ledger.capacity()
    }

    async fn submit(&mut self, tx: MixerTx) -> Result<Receipt, LedgerError> {
        self.execute(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::deposit::reject_identity;
    use crate::ledger::withdrawal::RejectAll;
    use mixer_ring::Point;
    use std::sync::Arc;

    fn local(capacity: usize) -> LocalLedger {
        LocalLedger::new(RingLedger::new(
            capacity,
            Arc::new(reject_identity),
            Arc::new(RejectAll),
        ))
    }

    fn deposit(i: u32) -> MixerTx {
        MixerTx::Deposit {
            denomination: 1,
            token: 0,
            pubkey: Point::new(i, i + 1),
            value: 1,
        }
    }

    #[test]
    fn test_sealing_deposit_costs_more() {
        let mut ledger = local(2);
        let first = ledger.execute(deposit(1)).unwrap();
        let last = ledger.execute(deposit(2)).unwrap();

        let c = CostSchedule::default();
        assert_eq!(first.cost, c.base + 2 * c.storage_write + c.event);
        assert_eq!(last.cost, c.base + 4 * c.storage_write + 2 * c.event);
        assert_eq!(last.events.len(), 2);
    }

    #[test]
    fn test_rejection_is_typed() {
        let mut ledger = local(2);
        let err = ledger
            .execute(MixerTx::BenchmarkWithdraw { denomination: 1 })
            .unwrap_err();
        assert!(matches!(
            err.ring_error(),
            Some(RingError::InsufficientEscrow { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_matches_execute() {
        let mut ledger = local(3);
        assert_eq!(ledger.ring_capacity(), 3);
        let receipt = ledger
            .submit(MixerTx::BenchmarkDeposit {
                denomination: 1,
                value: 1,
            })
            .await
            .unwrap();
        assert_eq!(receipt.events, vec![MixerEvent::Benchmark { value: 1 }]);
        let c = ledger.costs();
        assert_eq!(receipt.cost, c.base + c.storage_write + c.event);
    }
}
