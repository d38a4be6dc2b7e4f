//! Protocol errors for ring deposits and withdrawals.
//!
//! Every variant is raised before the ledger mutates anything, so a rejected
//! transaction leaves all rings exactly as they were.
use mixer_ring::RingId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// Deposit value does not equal the ring denomination
    #[error("Wrong deposit value: expected {expected}, got {got}")]
    WrongValue { expected: u64, got: u64 },

    /// The curve-membership predicate rejected the public key
    #[error("Public key is not a valid curve point")]
    InvalidKey,

    /// The key is already a participant of the target ring
    #[error("Public key already deposited in {0}")]
    DuplicateKey(RingId),

    #[error("Unknown ring {0}")]
    RingNotFound(RingId),

    /// Ring is still Open or already Dead
    #[error("{0} does not accept withdrawals in its current state")]
    RingNotReady(RingId),

    /// Linking tag already spent on this ring
    #[error("Linking tag already used to withdraw from {0}")]
    DuplicateWithdrawal(RingId),

    #[error("Ring signature rejected for {0}")]
    InvalidSignature(RingId),

    /// Released value would not match deposited value when the ring dies
    #[error("Escrow mismatch on {ring_id}: deposited {deposited}, released {released}")]
    EscrowMismatch {
        ring_id: RingId,
        deposited: u128,
        released: u128,
    },

    /// Control withdrawal asked for more than the benchmark pool holds
    #[error("Insufficient benchmark escrow: requested {requested}, available {available}")]
    InsufficientEscrow { requested: u64, available: u128 },
}

pub type Result<T> = std::result::Result<T, RingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = RingError::WrongValue {
            expected: 1,
            got: 2,
        };
        assert_eq!(err.to_string(), "Wrong deposit value: expected 1, got 2");

        let err = RingError::DuplicateWithdrawal(RingId(7));
        assert_eq!(
            err.to_string(),
            "Linking tag already used to withdraw from ring#7"
        );
    }
}
