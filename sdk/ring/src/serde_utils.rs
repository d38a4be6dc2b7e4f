//! Serialization helpers for big-integer coordinates.
//!
//! The signer tool emits curve coordinates as bare JSON integers that do not
//! fit in any primitive type, while hand-written fixtures tend to quote them.
//! Both forms are accepted on input; output always uses bare integers so the
//! tool can read files we write back to it.

use num_bigint::BigUint;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Parse a decimal (or `0x`-prefixed hex) integer string
pub fn parse_integer(text: &str) -> Result<BigUint, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => BigUint::parse_bytes(hex.as_bytes(), 16),
        None => BigUint::parse_bytes(text.as_bytes(), 10),
    };
    parsed.ok_or_else(|| format!("Invalid integer literal: {:?}", text))
}

fn to_number(value: &BigUint) -> Result<serde_json::Number, String> {
    serde_json::Number::from_str(&value.to_str_radix(10))
        .map_err(|e| format!("Failed to encode integer: {}", e))
}

fn from_value(value: serde_json::Value) -> Result<BigUint, String> {
    match value {
        serde_json::Value::String(s) => parse_integer(&s),
        serde_json::Value::Number(n) => parse_integer(&n.to_string()),
        other => Err(format!("Expected integer, found {}", other)),
    }
}

/// `#[serde(with = "decimal")]` for a single `BigUint`
pub mod decimal {
    use super::*;

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_number(value)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        from_value(value).map_err(D::Error::custom)
    }
}

/// `#[serde(with = "decimal_vec")]` for `Vec<BigUint>`
pub mod decimal_vec {
    use super::*;

    pub fn serialize<S>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let numbers = values
            .iter()
            .map(to_number)
            .collect::<Result<Vec<_>, _>>()
            .map_err(S::Error::custom)?;
        numbers.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
        values
            .into_iter()
            .map(from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(D::Error::custom)
    }
}
