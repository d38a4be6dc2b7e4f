//! Key and signature sets exchanged with the signer tool.
//!
//! Field names follow the tool's JSON output:
//!
//! ```text
//! generate -> { "pubkeys": [{x, y}, ..], "privkeys": [k, ..] }
//! inputs   -> { "signatures": [{ "tau": {x, y}, "ctlist": [c, s, ..] }, ..] }
//! ```

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::serde_utils::decimal_vec;
use crate::types::{LinkTag, Point, PublicKey};

/// Fresh keypairs; `pubkeys[i]` belongs to `privkeys[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    pub pubkeys: Vec<PublicKey>,
    #[serde(with = "decimal_vec")]
    pub privkeys: Vec<BigUint>,
}

impl KeySet {
    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }
}

/// One linkable ring signature.
///
/// `tau` is the linking tag; `ctlist` is the opaque challenge/response list
/// that only the verifier interprets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingSignature {
    pub tau: Point,
    #[serde(with = "decimal_vec")]
    pub ctlist: Vec<BigUint>,
}

impl RingSignature {
    pub fn tag(&self) -> LinkTag {
        LinkTag(self.tau.clone())
    }
}

/// One signature per ring member, all bound to the same ring message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSet {
    /// Ring the tool signed over, when it reports one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ring: Vec<PublicKey>,
    pub signatures: Vec<RingSignature>,
}

impl SignatureSet {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_key_output() {
        let json = r#"{
            "pubkeys": [
                {"x": 1368015179489954701390400359078579693043519447331113978918064868415326638035,
                 "y": 9918110051302171585080402603319702774565515993150576347155970296011118125764}
            ],
            "privkeys": [2]
        }"#;
        let keys: KeySet = serde_json::from_str(json).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys.privkeys[0], BigUint::from(2u32));
    }

    #[test]
    fn test_parse_tool_signature_output() {
        let json = r#"{
            "signatures": [
                {"tau": {"x": 5, "y": 6}, "ctlist": [1, 2, 3, 4]},
                {"tau": {"x": 7, "y": 8}, "ctlist": [9, 10, 11, 12]}
            ]
        }"#;
        let set: SignatureSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.ring.is_empty());
        assert_eq!(set.signatures[1].tag(), LinkTag(Point::new(7u32, 8u32)));
        assert_eq!(set.signatures[0].ctlist.len(), 4);
    }
}
