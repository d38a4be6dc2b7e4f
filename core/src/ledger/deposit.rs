//! Deposit validation.

use std::sync::Arc;

use mixer_ring::PublicKey;

use super::errors::{Result, RingError};
use super::ring::Ring;

/// Curve-membership predicate for depositor keys.
///
/// The mixer does no curve arithmetic; whoever embeds the ledger decides what
/// a valid key is.
pub trait KeyCheck: Send + Sync {
    fn is_valid(&self, key: &PublicKey) -> bool;
}

impl<F> KeyCheck for F
where
    F: Fn(&PublicKey) -> bool + Send + Sync,
{
    fn is_valid(&self, key: &PublicKey) -> bool {
        self(key)
    }
}

/// Accepts anything but the point at infinity
pub fn reject_identity(key: &PublicKey) -> bool {
    !key.is_identity()
}

#[derive(Clone)]
pub struct DepositValidator {
    key_check: Arc<dyn KeyCheck>,
}

impl DepositValidator {
    pub fn new(key_check: Arc<dyn KeyCheck>) -> Self {
        Self { key_check }
    }

    /// Check a deposit against the ring it would join.
    ///
    /// `ring` is `None` when no Open ring matches and a fresh one would be
    /// created, in which case no duplicate is possible.
    pub fn validate(
        &self,
        ring: Option<&Ring>,
        pubkey: &PublicKey,
        value: u64,
        denomination: u64,
    ) -> Result<()> {
        if value != denomination {
            return Err(RingError::WrongValue {
                expected: denomination,
                got: value,
            });
        }

        if !self.key_check.is_valid(pubkey) {
            return Err(RingError::InvalidKey);
        }

        if let Some(ring) = ring {
            if ring.contains(pubkey) {
                return Err(RingError::DuplicateKey(ring.id()));
            }
        }

        Ok(())
    }
}

impl Default for DepositValidator {
    fn default() -> Self {
        Self::new(Arc::new(reject_identity))
    }
}

impl std::fmt::Debug for DepositValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixer_ring::{Point, RingId};

    fn ring_with(keys: &[PublicKey]) -> Ring {
        let mut ring = Ring::new(RingId(4), 1, 0, 4);
        for k in keys {
            ring.admit(k.clone(), 1);
        }
        ring
    }

    #[test]
    fn test_wrong_value_checked_first() {
        let validator = DepositValidator::new(Arc::new(|_: &PublicKey| false));
        let err = validator
            .validate(None, &Point::new(1u32, 1u32), 2, 1)
            .unwrap_err();
        assert_eq!(
            err,
            RingError::WrongValue {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn test_invalid_key_before_duplicate() {
        let key = Point::new(0u32, 0u32);
        let ring = ring_with(&[key.clone()]);
        let validator = DepositValidator::default();
        assert_eq!(
            validator.validate(Some(&ring), &key, 1, 1),
            Err(RingError::InvalidKey)
        );
    }

    #[test]
    fn test_duplicate_key_in_target_ring() {
        let key = Point::new(5u32, 6u32);
        let ring = ring_with(&[key.clone()]);
        let validator = DepositValidator::default();
        assert_eq!(
            validator.validate(Some(&ring), &key, 1, 1),
            Err(RingError::DuplicateKey(RingId(4)))
        );
        assert!(validator
            .validate(Some(&ring), &Point::new(7u32, 8u32), 1, 1)
            .is_ok());
        assert!(validator.validate(None, &key, 1, 1).is_ok());
    }
}
