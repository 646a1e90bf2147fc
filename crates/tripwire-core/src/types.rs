//! Shared types used across Tripwire crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Amount of the chain's native currency in its smallest unit.
pub type Wei = u128;

/// Default alert threshold: 0.01 of the native unit (10^16 wei).
pub const DEFAULT_THRESHOLD_WEI: Wei = 10_000_000_000_000_000;

/// A 20-byte EVM account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid address hex: {0}")]
    Hex(String),
    #[error("address must be 20 bytes, got {0}")]
    Length(usize),
}

impl Address {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw =
            hex::decode(strip_hex_prefix(s)).map_err(|e| AddressError::Hex(e.to_string()))?;
        let bytes: [u8; 20] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::Length(raw.len()))?;
        Ok(Self(bytes))
    }
}

/// Trim whitespace and an optional `0x`/`0X` prefix.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The block at which a balance is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// Whatever block the data source considers the head.
    Latest,
    /// A specific block number.
    Block(u64),
}

impl Checkpoint {
    /// JSON-RPC block tag: `"latest"` or a `0x`-prefixed quantity.
    pub fn block_tag(&self) -> String {
        match self {
            Checkpoint::Latest => "latest".to_string(),
            Checkpoint::Block(n) => format!("{n:#x}"),
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::Latest => f.write_str("latest"),
            Checkpoint::Block(n) => write!(f, "#{n}"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount does not fit in 128 bits: {0}")]
    Overflow(String),
}

/// Parse a native-currency amount into wei.
///
/// Accepts a bare integer (`"10000000000000000"`) or a decimal number
/// followed by a unit: `wei`, `gwei` or `ether` (`"0.01 ether"`).
pub fn parse_wei(s: &str) -> Result<Wei, AmountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    let (number, unit) = match s.split_once(char::is_whitespace) {
        Some((n, u)) => (n.trim(), u.trim()),
        None => (s, "wei"),
    };

    let decimals: usize = match unit.to_ascii_lowercase().as_str() {
        "wei" => 0,
        "gwei" => 9,
        "ether" | "eth" => 18,
        other => return Err(AmountError::UnknownUnit(other.to_string())),
    };

    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals {
        return Err(AmountError::Invalid(format!("{s}: below one wei")));
    }

    let digits = format!("{whole}{frac:0<decimals$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse::<Wei>()
        .map_err(|_| AmountError::Overflow(s.to_string()))
}
