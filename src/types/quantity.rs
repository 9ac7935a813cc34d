//! Serde helpers for numeric fields the node encodes as `0x`-prefixed hex
//! quantities (`"0x0"`, `"0x3039"`).
//!
//! Use with `#[serde(with = "crate::types::quantity")]`.

use crate::error::{RepositoryError, Result};
use crate::types::HEX_PREFIX;
use serde::{de, Deserialize, Deserializer, Serializer};

fn digits(text: &str) -> Result<&str> {
    let digits = text.strip_prefix(HEX_PREFIX).ok_or_else(|| {
        RepositoryError::Format(format!("quantity {:?} without {} prefix", text, HEX_PREFIX))
    })?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RepositoryError::Format(format!("invalid hex quantity {:?}", text)));
    }
    Ok(digits)
}

/// Parses a hex quantity into a `u64`.
pub fn parse(text: &str) -> Result<u64> {
    u64::from_str_radix(digits(text)?, 16)
        .map_err(|e| RepositoryError::Format(format!("quantity {:?}: {}", text, e)))
}

/// Renders a `u64` as a minimal hex quantity.
pub fn encode(value: u64) -> String {
    format!("{:#x}", value)
}

pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&encode(*value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(de::Error::custom)
}

/// `Option<u64>` quantities; `null` and a missing key both decode to `None`.
pub mod opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<u64>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&encode(*v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<u64>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| parse(&text).map_err(de::Error::custom))
            .transpose()
    }
}

/// `u128` quantities, used for wei amounts.
pub mod big {
    use super::*;

    pub fn parse(text: &str) -> Result<u128> {
        u128::from_str_radix(digits(text)?, 16)
            .map_err(|e| RepositoryError::Format(format!("quantity {:?}: {}", text, e)))
    }

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(de::Error::custom)
    }
}
