//! tripwire-trap — the balance-change decider.
//!
//! Takes the recent snapshot history (newest first), compares the two
//! most recent balances, and returns a `Verdict`. The decider holds no
//! state between calls: the host passes the whole history every time, and
//! identical histories always produce byte-identical verdicts.
//!
//! # Decision Rule
//!
//! ```text
//! if history.len() < 2:
//!     (false, "insufficient data")
//!
//! current   = decode(history[0])
//! previous  = decode(history[1])
//! deviation = |current - previous|
//!
//! if deviation >= threshold:
//!     (true, "Balance change exceeded threshold")
//! else:
//!     (false, <empty>)
//! ```
//!
//! Payload strings are ABI-encoded (`abi.encode(string)`), so a sink
//! expecting a single `string` argument can consume them directly.
//! A snapshot that fails to decode is an error, never a negative verdict.

pub mod decider;
pub mod payload;
pub mod strategy;
pub mod verdict;

pub use decider::{Trap, TrapConfig};
pub use payload::{INSUFFICIENT_DATA, PayloadError, THRESHOLD_EXCEEDED};
pub use strategy::{Strategy, TwoPointDeviation};
pub use tripwire_core::{DecodeError, Snapshot};
pub use verdict::Verdict;
