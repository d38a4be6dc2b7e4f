//! Ring identifiers, curve points, linking tags and ring messages.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::serde_utils::decimal;

/// Asset class a ring accepts (0 = native value)
pub type TokenId = u64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid hex: {0}")]
    Hex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },
}

// ============================================================================
// Points
// ============================================================================

/// Affine curve point as produced by the signer tool.
///
/// The mixer never does arithmetic on points; it only compares, stores and
/// hashes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    #[serde(with = "decimal")]
    pub x: BigUint,
    #[serde(with = "decimal")]
    pub y: BigUint,
}

impl Point {
    pub fn new(x: impl Into<BigUint>, y: impl Into<BigUint>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }

    /// The encoding of the point at infinity used by the tool
    pub fn is_identity(&self) -> bool {
        self.x == BigUint::ZERO && self.y == BigUint::ZERO
    }

    /// Length-prefixed big-endian encoding, unambiguous for hashing
    pub fn absorb(&self, hasher: &mut blake3::Hasher) {
        for coord in [&self.x, &self.y] {
            let bytes = coord.to_bytes_be();
            hasher.update(&(bytes.len() as u32).to_le_bytes());
            hasher.update(&bytes);
        }
    }

    /// Short hex digest for logs
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        self.absorb(&mut hasher);
        hex::encode(&hasher.finalize().as_bytes()[..8])
    }
}

/// A depositor's public key
pub type PublicKey = Point;

/// Linking tag ("key image"): identical for every signature a member produces
/// on the same ring, so it identifies repeated withdrawals without revealing
/// the member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkTag(pub Point);

impl LinkTag {
    pub fn point(&self) -> &Point {
        &self.0
    }
}

impl From<Point> for LinkTag {
    fn from(p: Point) -> Self {
        Self(p)
    }
}

impl fmt::Display for LinkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag:{}", self.0.fingerprint())
    }
}

// ============================================================================
// Ring identity
// ============================================================================

/// Ring identifier, assigned in creation order and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RingId(pub u64);

impl RingId {
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ring#{}", self.0)
    }
}

/// The value every withdrawal signature on a ring is bound to.
///
/// Set once, when the ring fills; the signer tool takes it as bare hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RingMessage(pub [u8; 32]);

impl RingMessage {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex without `0x` prefix, the form the signer tool expects
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Accepts hex with or without `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, ParseError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ParseError::Hex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseError::Length {
                expected: 32,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for RingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for RingMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RingMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_message_hex_roundtrip_with_prefix() {
        let msg = RingMessage([0xab; 32]);
        let shown = msg.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(RingMessage::from_hex(&shown).unwrap(), msg);
        assert_eq!(RingMessage::from_hex(&msg.to_hex()).unwrap(), msg);
    }

    #[test]
    fn test_ring_message_rejects_short_input() {
        let err = RingMessage::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            ParseError::Length {
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn test_point_fingerprint_distinguishes_coordinates() {
        // (1, 23) and (12, 3) share decimal digits but must hash differently
        let a = Point::new(1u32, 23u32);
        let b = Point::new(12u32, 3u32);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(Point::new(0u32, 0u32).is_identity());
        assert!(!a.is_identity());
    }
}
