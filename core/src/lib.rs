//! Ring Mixer Core
//!
//! ```text
//!                ┌───────────────────────────┐
//!  MixerTx ────> │ LocalLedger (metering)    │ ──> Receipt { events, cost }
//!                │   └─ RingLedger           │
//!                │        ├─ DepositValidator│ <── KeyCheck (injected)
//!                │        └─ WithdrawalVal.  │ <── RingVerifier (injected)
//!                └───────────────────────────┘
//!                              ^
//!                              │ sequential submits
//!                ┌───────────────────────────┐
//!                │ BenchmarkOrchestrator     │ <── SignerVerifier (orbital | mock)
//!                └───────────────────────────┘
//!                              │ BenchmarkReport
//!                              v
//!                     stats ─> BenchmarkRecord (JSON)
//! ```

pub mod bench;
pub mod ledger;
pub mod signer;
pub mod stats;

#[cfg(test)]
mod tests;
