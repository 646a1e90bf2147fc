//! Fixed-width snapshot encoding.
//!
//! A snapshot carries exactly one unsigned integer as a single 32-byte
//! big-endian word, the same layout as the EVM ABI encoding of one
//! `uint256`. Values are held as `u128`, so a decoded word must have its
//! upper 16 bytes cleared.

use std::fmt;

use thiserror::Error;

use crate::types::{Wei, strip_hex_prefix};

/// Width in bytes of an encoded snapshot.
pub const SNAPSHOT_WIDTH: usize = 32;

/// Version tag of the snapshot layout above.
pub const SNAPSHOT_ENCODING_VERSION: u8 = 1;

const VALUE_OFFSET: usize = SNAPSHOT_WIDTH - 16;

/// Errors produced when a byte sequence is not a valid snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("snapshot must be {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("snapshot value does not fit in 128 bits")]
    Overflow,

    #[error("invalid snapshot hex: {0}")]
    Hex(String),
}

/// The encoded value of the monitored quantity at one checkpoint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    /// Encode a value into a snapshot.
    pub fn encode(value: Wei) -> Self {
        let mut word = vec![0u8; SNAPSHOT_WIDTH];
        word[VALUE_OFFSET..].copy_from_slice(&value.to_be_bytes());
        Self(word)
    }

    /// Wrap raw bytes without validating them. Validation happens on decode.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a `0x`/`0X`-prefixed (or bare) hex string.
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        hex::decode(strip_hex_prefix(s))
            .map(Self)
            .map_err(|e| DecodeError::Hex(e.to_string()))
    }

    /// Decode the value carried by this snapshot.
    pub fn decode(&self) -> Result<Wei, DecodeError> {
        if self.0.len() != SNAPSHOT_WIDTH {
            return Err(DecodeError::Length {
                expected: SNAPSHOT_WIDTH,
                got: self.0.len(),
            });
        }
        if self.0[..VALUE_OFFSET].iter().any(|&b| b != 0) {
            return Err(DecodeError::Overflow);
        }

        let mut buf = [0u8; 16];
        buf.copy_from_slice(&self.0[VALUE_OFFSET..]);
        Ok(Wei::from_be_bytes(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Snapshot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
