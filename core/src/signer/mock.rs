//! Mock signer
//!
//! Deterministic blake3 stand-in for the external tool, used in tests and
//! `backend = "mock"` dry runs. Signatures carry the signer's ring index in
//! the clear and anyone can forge them: this is NOT a ring signature scheme.
//!
//! ```text
//! ring_hash = H(participants)
//! tau       = H("tag", pk_i, ring_hash)               (same for every use on a ring)
//! ctlist    = [i, H("sig", ring_hash, message, tau, i)]
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mixer_ring::{
    KeySet, LinkTag, Point, PublicKey, RingMessage, RingSignature, SignatureSet,
};
use num_bigint::BigUint;

use super::{AdapterError, Result, SignerVerifier};
use crate::ledger::RingVerifier;

const DOMAIN: &str = "mixer-mock-signer-v1";

fn hasher(label: &[u8]) -> blake3::Hasher {
    let mut h = blake3::Hasher::new_derive_key(DOMAIN);
    h.update(&(label.len() as u32).to_le_bytes());
    h.update(label);
    h
}

fn point_from(h: &blake3::Hasher) -> Point {
    let mut out = [0u8; 64];
    h.finalize_xof().fill(&mut out);
    Point::new(
        BigUint::from_bytes_be(&out[..32]),
        BigUint::from_bytes_be(&out[32..]),
    )
}

fn scalar_from(h: &blake3::Hasher) -> BigUint {
    BigUint::from_bytes_be(h.finalize().as_bytes())
}

fn ring_hash(participants: &[PublicKey]) -> [u8; 32] {
    let mut h = hasher(b"ring");
    h.update(&(participants.len() as u64).to_le_bytes());
    for pk in participants {
        pk.absorb(&mut h);
    }
    *h.finalize().as_bytes()
}

fn public_key(sk: &BigUint) -> PublicKey {
    let mut h = hasher(b"pk");
    h.update(&sk.to_bytes_be());
    point_from(&h)
}

fn tag_for(pk: &PublicKey, ring: &[u8; 32]) -> Point {
    let mut h = hasher(b"tag");
    pk.absorb(&mut h);
    h.update(ring);
    point_from(&h)
}

fn mac(ring: &[u8; 32], message: &RingMessage, tau: &Point, index: u64) -> BigUint {
    let mut h = hasher(b"sig");
    h.update(ring);
    h.update(message.as_bytes());
    tau.absorb(&mut h);
    h.update(&index.to_le_bytes());
    scalar_from(&h)
}

fn check(
    participants: &[PublicKey],
    message: &RingMessage,
    tau: &Point,
    payload: &[BigUint],
) -> bool {
    let [index, sig] = payload else {
        return false;
    };
    let Ok(index) = u64::try_from(index) else {
        return false;
    };
    let Some(member) = usize::try_from(index).ok().and_then(|i| participants.get(i)) else {
        return false;
    };
    let ring = ring_hash(participants);
    tag_for(member, &ring) == *tau && mac(&ring, message, tau, index) == *sig
}

#[derive(Debug, Clone, Default)]
pub struct MockSigner {
    seed: u64,
    /// Shared across clones so keys never repeat
    issued: Arc<AtomicU64>,
}

impl MockSigner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            issued: Arc::new(AtomicU64::new(0)),
        }
    }

    fn secret(&self, index: u64) -> BigUint {
        let mut h = hasher(b"sk");
        h.update(&self.seed.to_le_bytes());
        h.update(&index.to_le_bytes());
        scalar_from(&h)
    }
}

impl SignerVerifier for MockSigner {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_keys(&self, n: usize) -> Result<KeySet> {
        let start = self.issued.fetch_add(n as u64, Ordering::Relaxed);
        let privkeys: Vec<BigUint> = (start..start + n as u64).map(|i| self.secret(i)).collect();
        let pubkeys = privkeys.iter().map(public_key).collect();
        Ok(KeySet { pubkeys, privkeys })
    }

    async fn derive_inputs(
        &self,
        keys: &KeySet,
        ring_size: usize,
        message: &RingMessage,
    ) -> Result<SignatureSet> {
        if keys.len() != ring_size || keys.privkeys.len() != ring_size {
            return Err(AdapterError::UnexpectedOutput(format!(
                "ring of {ring_size} needs {ring_size} keypairs, got {}",
                keys.len()
            )));
        }
        for (sk, pk) in keys.privkeys.iter().zip(&keys.pubkeys) {
            if public_key(sk) != *pk {
                return Err(AdapterError::UnexpectedOutput(
                    "private key does not match its public key".to_string(),
                ));
            }
        }

        let ring = ring_hash(&keys.pubkeys);
        let signatures = keys
            .pubkeys
            .iter()
            .enumerate()
            .map(|(i, pk)| {
                let tau = tag_for(pk, &ring);
                let sig = mac(&ring, message, &tau, i as u64);
                RingSignature {
                    tau,
                    ctlist: vec![BigUint::from(i), sig],
                }
            })
            .collect();

        Ok(SignatureSet {
            ring: keys.pubkeys.clone(),
            signatures,
        })
    }

    async fn verify_offline(
        &self,
        signatures: &SignatureSet,
        message: &RingMessage,
    ) -> Result<bool> {
        if signatures.ring.is_empty() || signatures.is_empty() {
            return Ok(false);
        }
        Ok(signatures
            .signatures
            .iter()
            .all(|s| check(&signatures.ring, message, &s.tau, &s.ctlist)))
    }
}

/// Ledger-side counterpart of [`MockSigner`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MockVerifier;

impl RingVerifier for MockVerifier {
    fn verify(
        &self,
        participants: &[PublicKey],
        message: &RingMessage,
        tag: &LinkTag,
        payload: &[BigUint],
    ) -> bool {
        check(participants, message, tag.point(), payload)
    }
}
