//! Serde helper for variable-length byte payloads encoded as `0x`-prefixed hex.

use crate::types::HEX_PREFIX;
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}{}", HEX_PREFIX, hex::encode(bytes)))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    let digits = text
        .strip_prefix(HEX_PREFIX)
        .ok_or_else(|| de::Error::custom(format!("hex data without {} prefix", HEX_PREFIX)))?;
    hex::decode(digits).map_err(de::Error::custom)
}
