//! Verdict produced by one decision evaluation.

use crate::payload::{self, INSUFFICIENT_DATA, PayloadError, THRESHOLD_EXCEEDED};

/// `(should_respond, payload)` result of a decision.
///
/// A negative verdict carries either an empty payload or an informational
/// message; only a positive verdict's payload is meant for a response sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Verdict {
    pub should_respond: bool,
    pub payload: Vec<u8>,
}

impl Verdict {
    /// A triggering verdict carrying the threshold message.
    pub fn respond() -> Self {
        Self {
            should_respond: true,
            payload: payload::encode_string(THRESHOLD_EXCEEDED),
        }
    }

    /// A negative verdict explaining that there is nothing to compare yet.
    pub fn insufficient_data() -> Self {
        Self {
            should_respond: false,
            payload: payload::encode_string(INSUFFICIENT_DATA),
        }
    }

    /// A negative verdict with an empty payload.
    pub fn quiet() -> Self {
        Self {
            should_respond: false,
            payload: Vec::new(),
        }
    }

    /// Decode the payload string, or `None` for an empty payload.
    pub fn message(&self) -> Result<Option<String>, PayloadError> {
        if self.payload.is_empty() {
            return Ok(None);
        }
        payload::decode_string(&self.payload).map(Some)
    }
}
