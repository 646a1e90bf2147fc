//! Verdict payload encoding.
//!
//! Payloads carry one string in the EVM ABI layout of a lone `string`
//! argument: a head word holding the offset of the tail (always 32 when
//! encoded here), then the byte length, then the UTF-8 bytes right-padded
//! to a word boundary.

use thiserror::Error;

/// Message carried when the history is too short to compare.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// Message carried when the balance moved by at least the threshold.
pub const THRESHOLD_EXCEEDED: &str = "Balance change exceeded threshold";

const WORD: usize = 32;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload truncated: {len} bytes")]
    Truncated { len: usize },

    #[error("payload field points outside the payload")]
    OutOfBounds,

    #[error("payload word does not fit in usize")]
    WordOverflow,

    #[error("payload string is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// ABI-encode a single string argument.
pub fn encode_string(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;

    let mut out = Vec::with_capacity(2 * WORD + padded);
    out.extend_from_slice(&word(WORD));
    out.extend_from_slice(&word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(2 * WORD + padded, 0);
    out
}

/// Decode a payload produced by [`encode_string`] (or by `abi.encode(string)`).
pub fn decode_string(payload: &[u8]) -> Result<String, PayloadError> {
    if payload.len() < WORD {
        return Err(PayloadError::Truncated { len: payload.len() });
    }

    let offset = read_word(&payload[..WORD])?;
    let len_end = offset.checked_add(WORD).ok_or(PayloadError::OutOfBounds)?;
    let len_word = payload.get(offset..len_end).ok_or(PayloadError::OutOfBounds)?;
    let len = read_word(len_word)?;

    let end = len_end.checked_add(len).ok_or(PayloadError::OutOfBounds)?;
    let data = payload.get(len_end..end).ok_or(PayloadError::OutOfBounds)?;
    Ok(String::from_utf8(data.to_vec())?)
}

fn word(n: usize) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    w
}

fn read_word(w: &[u8]) -> Result<usize, PayloadError> {
    if w[..WORD - 8].iter().any(|&b| b != 0) {
        return Err(PayloadError::WordOverflow);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&w[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|_| PayloadError::WordOverflow)
}
