pub mod deposit;
pub mod errors;
pub mod executor;
pub mod message;
pub mod ring;
pub mod ring_ledger;
pub mod withdrawal;

pub use deposit::{DepositValidator, KeyCheck, reject_identity};
pub use errors::RingError;
pub use executor::{CostSchedule, Ledger, LedgerError, LocalLedger, MixerTx, Receipt};
pub use message::{Blake3Message, MessageDeriver};
pub use ring::{Ring, RingState};
pub use ring_ledger::{DepositOutcome, RingLedger, WithdrawOutcome};
pub use withdrawal::{RejectAll, RingVerifier, WithdrawalValidator};
