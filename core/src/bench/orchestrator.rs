//! Benchmark Orchestrator
//!
//! Drives repeated trials against a [`Ledger`], strictly one operation at a
//! time, and returns a [`BenchmarkReport`].
//!
//! ```text
//! run
//!  ├─ control deposits   x control_trials   (BenchmarkDeposit)
//!  ├─ control withdraws  x control_trials   (BenchmarkWithdraw)
//!  ├─ deposit trials     x number_of_trials
//!  │    generate N keys ─> N timed deposits ─> row
//!  └─ withdrawal trials  x number_of_trials
//!       generate N keys ─> fill ring ─> derive + verify_offline
//!       ─> N timed withdrawals (each followed by an untimed replay probe) ─> row
//! ```
//!
//! A failing operation aborts its trial only; the trial contributes no row.
//! A ring an aborted trial left Open is topped up with untimed deposits before
//! the next trial starts, so every trial fills a ring of its own.

use std::time::Instant;

use anyhow::{Result, bail};
use log::{debug, info, warn};
use mixer_config::MixerConfig;
use mixer_ring::{
    KeySet, MixerEvent, PublicKey, RingId, RingMessage, RingSignature, TokenId,
};
use thiserror::Error;

use super::report::BenchmarkReport;
use super::sample::{Average, BenchmarkMatrix, BenchmarkSample};
use crate::ledger::{Ledger, LedgerError, MixerTx, Receipt, RingError};
use crate::signer::{AdapterError, SignerVerifier};

/// Why a trial was abandoned
#[derive(Error, Debug)]
pub enum TrialError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Protocol violation: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkParams {
    pub ring_size: usize,
    pub trials: usize,
    pub control_trials: usize,
    pub denomination: u64,
    pub token: TokenId,
}

impl BenchmarkParams {
    pub fn from_config(config: &MixerConfig) -> Self {
        Self {
            ring_size: config.protocol.ring_size,
            trials: config.benchmark.number_of_trials,
            control_trials: config.benchmark.control_trials,
            denomination: config.protocol.denomination,
            token: config.protocol.token_id,
        }
    }
}

impl Default for BenchmarkParams {
    fn default() -> Self {
        Self::from_config(&MixerConfig::default())
    }
}

/// A ring filled by one trial
struct FilledRing {
    ring_id: RingId,
    message: RingMessage,
    samples: Vec<BenchmarkSample>,
}

pub struct BenchmarkOrchestrator<L, S> {
    ledger: L,
    signer: Option<S>,
    params: BenchmarkParams,
    /// Ring we deposited into that has not reported Ready yet
    unsealed: Option<RingId>,
}

impl<L: Ledger, S: SignerVerifier> BenchmarkOrchestrator<L, S> {
    pub fn new(ledger: L, signer: Option<S>, params: BenchmarkParams) -> Self {
        Self {
            ledger,
            signer,
            params,
            unsealed: None,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn params(&self) -> &BenchmarkParams {
        &self.params
    }

    pub async fn run(&mut self) -> Result<BenchmarkReport> {
        let capacity = self.ledger.ring_capacity();
        if self.params.ring_size != capacity {
            bail!(
                "ring_size {} does not match ledger ring capacity {capacity}",
                self.params.ring_size
            );
        }
        if self.params.ring_size < 2 {
            bail!("ring_size must be at least 2");
        }

        let mut report = BenchmarkReport {
            ring_size: self.params.ring_size,
            signer_available: self.signer.is_some(),
            ..Default::default()
        };

        report.control_deposit = self.control_deposits().await;
        report.control_withdraw = self.control_withdraws().await;

        if self.signer.is_none() {
            let err = AdapterError::Unavailable("no signer backend".to_string());
            warn!("{err}; skipping deposit and withdrawal trials");
            return Ok(report);
        }

        let (rows, aborted) = self.deposit_trials().await;
        report.deposits = rows;
        report.aborted_deposit_trials = aborted;

        let (rows, aborted) = self.withdraw_trials().await;
        report.withdrawals = rows;
        report.aborted_withdraw_trials = aborted;

        Ok(report)
    }

    // ========================================================================
    // Controls
    // ========================================================================

    async fn control_deposits(&mut self) -> Option<Average> {
        let p = self.params;
        let mut samples = Vec::with_capacity(p.control_trials);
        for i in 0..p.control_trials {
            let tx = MixerTx::BenchmarkDeposit {
                denomination: p.denomination,
                value: p.denomination,
            };
            match self.timed(tx).await {
                Ok((_, sample)) => samples.push(sample),
                Err(e) => warn!("Control deposit {} failed: {e}", i + 1),
            }
        }
        summarize("benchmark deposit", &samples)
    }

    async fn control_withdraws(&mut self) -> Option<Average> {
        let p = self.params;
        let mut samples = Vec::with_capacity(p.control_trials);
        for i in 0..p.control_trials {
            let tx = MixerTx::BenchmarkWithdraw {
                denomination: p.denomination,
            };
            match self.timed(tx).await {
                Ok((_, sample)) => samples.push(sample),
                Err(e) => warn!("Control withdrawal {} failed: {e}", i + 1),
            }
        }
        summarize("benchmark withdrawal", &samples)
    }

    // ========================================================================
    // Trials
    // ========================================================================

    async fn deposit_trials(&mut self) -> (BenchmarkMatrix, usize) {
        let mut matrix = BenchmarkMatrix::new();
        let mut aborted = 0;
        for trial in 1..=self.params.trials {
            info!("Starting deposit benchmark for ring number {trial}");
            match self.deposit_trial().await {
                Ok(row) => matrix.push_row(row),
                Err(e) => {
                    warn!("Deposit trial {trial} aborted: {e}");
                    aborted += 1;
                }
            }
        }
        (matrix, aborted)
    }

    async fn withdraw_trials(&mut self) -> (BenchmarkMatrix, usize) {
        let mut matrix = BenchmarkMatrix::new();
        let mut aborted = 0;
        for trial in 1..=self.params.trials {
            info!("Starting withdraw benchmark for ring number {trial}");
            match self.withdraw_trial().await {
                Ok(row) => matrix.push_row(row),
                Err(e) => {
                    warn!("Withdrawal trial {trial} aborted: {e}");
                    aborted += 1;
                }
            }
        }
        (matrix, aborted)
    }

    async fn deposit_trial(&mut self) -> std::result::Result<Vec<BenchmarkSample>, TrialError> {
        let keys = self.generate_keys().await?;
        let filled = self.fill_ring(&keys).await?;
        info!("{} filled, message {}", filled.ring_id, filled.message);
        Ok(filled.samples)
    }

    async fn withdraw_trial(&mut self) -> std::result::Result<Vec<BenchmarkSample>, TrialError> {
        let n = self.params.ring_size;
        let keys = self.generate_keys().await?;
        let FilledRing {
            ring_id, message, ..
        } = self.fill_ring(&keys).await?;

        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable("no signer backend".to_string()))?;
        let inputs = signer.derive_inputs(&keys, n, &message).await?;
        if !signer.verify_offline(&inputs, &message).await? {
            return Err(AdapterError::VerificationFailed(format!(
                "{} rejected its own signatures for {ring_id}",
                signer.name()
            ))
            .into());
        }
        if inputs.len() != n {
            return Err(TrialError::Protocol(format!(
                "expected {n} signatures, got {}",
                inputs.len()
            )));
        }

        let mut row = Vec::with_capacity(n);
        let mut dead_events = 0;
        for (i, signature) in inputs.signatures.into_iter().enumerate() {
            let tx = MixerTx::Withdraw {
                ring_id,
                signature: signature.clone(),
            };
            let (receipt, sample) = self.timed(tx).await?;
            let dead_here = count(&receipt, |e| matches!(e, MixerEvent::Dead { .. }));
            dead_events += dead_here;

            if count(&receipt, |e| matches!(e, MixerEvent::Withdraw { .. })) != 1 {
                return Err(TrialError::Protocol(format!(
                    "withdrawal {} did not emit a Withdraw event",
                    i + 1
                )));
            }
            if dead_here > 0 && i + 1 != n {
                return Err(TrialError::Protocol(format!(
                    "{ring_id} died after {} of {n} withdrawals",
                    i + 1
                )));
            }
            row.push(sample);

            self.replay_probe(ring_id, signature, dead_here > 0).await?;
        }

        if dead_events != 1 {
            return Err(TrialError::Protocol(format!(
                "expected one Dead event for {ring_id}, saw {dead_events}"
            )));
        }
        Ok(row)
    }

    /// Resubmit a spent signature; the ledger must refuse it.
    async fn replay_probe(
        &mut self,
        ring_id: RingId,
        signature: RingSignature,
        dead: bool,
    ) -> std::result::Result<(), TrialError> {
        match self
            .ledger
            .submit(MixerTx::Withdraw { ring_id, signature })
            .await
        {
            Err(LedgerError::Rejected(RingError::DuplicateWithdrawal(_))) => Ok(()),
            // a dead ring refuses everything before looking at the tag
            Err(LedgerError::Rejected(RingError::RingNotReady(_))) if dead => Ok(()),
            Err(e) => Err(TrialError::Protocol(format!(
                "replay on {ring_id} failed for the wrong reason: {e}"
            ))),
            Ok(_) => Err(TrialError::Protocol(format!(
                "replayed signature accepted by {ring_id}"
            ))),
        }
    }

    async fn generate_keys(&self) -> std::result::Result<KeySet, TrialError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| AdapterError::Unavailable("no signer backend".to_string()))?;
        Ok(signer.generate_keys(self.params.ring_size).await?)
    }

    /// N timed deposits that must land, in order, in one fresh ring
    async fn fill_ring(&mut self, keys: &KeySet) -> std::result::Result<FilledRing, TrialError> {
        self.top_up().await?;

        let n = self.params.ring_size;
        let mut samples = Vec::with_capacity(n);
        let mut ring_id = None;
        let mut message = None;

        for (k, pubkey) in keys.pubkeys.iter().take(n).enumerate() {
            let tx = self.deposit_tx(pubkey);
            let (receipt, sample) = self.timed(tx).await?;
            self.track(&receipt);
            samples.push(sample);

            for event in &receipt.events {
                match event {
                    MixerEvent::Deposit {
                        ring_id: id,
                        position,
                    } => {
                        if *position != k || ring_id.is_some_and(|r| r != *id) {
                            return Err(TrialError::Protocol(format!(
                                "deposit {} landed at {id} position {position}",
                                k + 1
                            )));
                        }
                        ring_id = Some(*id);
                    }
                    MixerEvent::Ready {
                        ring_id: id,
                        message: m,
                    } => {
                        if k + 1 != n {
                            return Err(TrialError::Protocol(format!(
                                "{id} became ready after {} of {n} deposits",
                                k + 1
                            )));
                        }
                        message = Some(*m);
                    }
                    _ => {}
                }
            }
        }

        match (ring_id, message) {
            (Some(ring_id), Some(message)) => Ok(FilledRing {
                ring_id,
                message,
                samples,
            }),
            _ => Err(TrialError::Protocol(format!(
                "ring not ready after {} deposits",
                samples.len()
            ))),
        }
    }

    /// Seal the ring an aborted trial left Open. Untimed.
    async fn top_up(&mut self) -> std::result::Result<(), TrialError> {
        let Some(ring_id) = self.unsealed else {
            return Ok(());
        };
        info!("Topping up {ring_id}, left open by an aborted trial");

        let keys = self.generate_keys().await?;
        for pubkey in &keys.pubkeys {
            let tx = self.deposit_tx(pubkey);
            let receipt = self.ledger.submit(tx).await?;
            self.track(&receipt);
            if self.unsealed.is_none() {
                return Ok(());
            }
        }
        Err(TrialError::Protocol(format!(
            "{ring_id} still open after {} filler deposits",
            keys.len()
        )))
    }

    fn track(&mut self, receipt: &Receipt) {
        for event in &receipt.events {
            match event {
                MixerEvent::Deposit { ring_id, .. } => self.unsealed = Some(*ring_id),
                MixerEvent::Ready { .. } => self.unsealed = None,
                _ => {}
            }
        }
    }

    fn deposit_tx(&self, pubkey: &PublicKey) -> MixerTx {
        let p = self.params;
        MixerTx::Deposit {
            denomination: p.denomination,
            token: p.token,
            pubkey: pubkey.clone(),
            value: p.denomination,
        }
    }

    async fn timed(
        &mut self,
        tx: MixerTx,
    ) -> std::result::Result<(Receipt, BenchmarkSample), LedgerError> {
        let kind = tx.kind();
        let start = Instant::now();
        let receipt = self.ledger.submit(tx).await?;
        let latency_us = start.elapsed().as_micros() as u64;

        for event in &receipt.events {
            debug!("Handled {} event", event.name());
        }
        debug!("{kind}: TIME taken {latency_us}us, COST {}", receipt.cost);

        let sample = BenchmarkSample::new(latency_us, receipt.cost);
        Ok((receipt, sample))
    }
}

fn count(receipt: &Receipt, pred: impl Fn(&MixerEvent) -> bool) -> usize {
    receipt.events.iter().filter(|e| pred(e)).count()
}

fn summarize(label: &str, samples: &[BenchmarkSample]) -> Option<Average> {
    match Average::of(samples) {
        Ok(avg) => {
            info!(
                "Stats of a {label}: average time {}us, average cost {}",
                avg.time, avg.cost
            );
            Some(avg)
        }
        Err(e) => {
            warn!("No {label} samples: {e}");
            None
        }
    }
}
