//! Fixed-length identifiers shared by every entity.
//!
//! Hashes and addresses travel as `0x`-prefixed hex text at every API and RPC
//! boundary and as raw bytes when persisted.

pub mod hex_bytes;
pub mod quantity;

use crate::error::{RepositoryError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Prefix of the canonical textual form.
pub const HEX_PREFIX: &str = "0x";

/// Length of a [`Hash`] in bytes.
pub const HASH_LENGTH: usize = 32;

/// Length of an [`Address`] in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// An immutable `N`-byte value kept on the stack.
///
/// Both constructors that accept untrusted input check the length exactly:
/// nothing is ever truncated or zero-padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedBytes<const N: usize>([u8; N]);

/// 32-byte hash of a block or transaction.
pub type Hash = FixedBytes<HASH_LENGTH>;

/// 20-byte account address.
pub type Address = FixedBytes<ADDRESS_LENGTH>;

impl<const N: usize> FixedBytes<N> {
    /// Number of bytes held.
    pub const LEN: usize = N;

    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub const fn zero() -> Self {
        Self([0u8; N])
    }

    /// Parses `0x`-prefixed hex. Upper-case digits and a `0X` prefix are
    /// accepted here; see [`FixedBytes::from_canonical_hex`] for the strict form.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = text
            .strip_prefix(HEX_PREFIX)
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| {
                RepositoryError::Format(format!("hex string without {} prefix", HEX_PREFIX))
            })?;

        if digits.len() != N * 2 {
            return Err(RepositoryError::Format(format!(
                "hex string has length {}, want {} for a {}-byte value",
                digits.len(),
                N * 2,
                N
            )));
        }

        let mut bytes = [0u8; N];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| RepositoryError::Format(format!("invalid hex string: {}", e)))?;
        Ok(Self(bytes))
    }

    /// Parses text received at the API boundary: the `0x` prefix followed by
    /// exactly `2 * N` lowercase hex digits.
    pub fn from_canonical_hex(text: &str) -> Result<Self> {
        let value = Self::from_hex(text)?;
        if value.to_hex() != text {
            return Err(RepositoryError::Format(format!(
                "hex string {} is not in canonical lowercase form",
                text
            )));
        }
        Ok(value)
    }

    /// Renders the canonical lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("{}{}", HEX_PREFIX, hex::encode(self.0))
    }

    /// Reads a persisted value; the slice must be exactly `N` bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        <[u8; N]>::try_from(bytes)
            .map(Self)
            .map_err(|_| RepositoryError::LengthMismatch {
                expected: N,
                actual: bytes.len(),
            })
    }

    /// Unmarshals a value received at the API boundary. Only a string in the
    /// canonical form is accepted.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(text) => Self::from_canonical_hex(text),
            other => Err(RepositoryError::Format(format!(
                "unexpected {} for a {}-byte hex value",
                json_kind(other),
                N
            ))),
        }
    }

    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Display for FixedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> fmt::Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> FromStr for FixedBytes<N> {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl<const N: usize> TryFrom<&[u8]> for FixedBytes<N> {
    type Error = RepositoryError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_slice(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for FixedBytes<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBytes<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Serialize for FixedBytes<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct FixedBytesVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for FixedBytesVisitor<N> {
    type Value = FixedBytes<N>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {}-prefixed hex string of {} bytes", HEX_PREFIX, N)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        FixedBytes::from_canonical_hex(v).map_err(E::custom)
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedBytes<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(FixedBytesVisitor::<N>)
    }
}
