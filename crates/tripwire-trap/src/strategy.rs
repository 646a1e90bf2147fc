//! Windowing strategies that turn a snapshot history into a verdict.

use tracing::debug;

use tripwire_core::{DecodeError, Snapshot, Wei};

use crate::verdict::Verdict;

/// A decision rule over a newest-first snapshot history.
///
/// Implementations must be pure: the verdict depends on `history` and the
/// strategy's own immutable parameters only.
pub trait Strategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Evaluate a newest-first history.
    fn evaluate(&self, history: &[Snapshot]) -> Result<Verdict, DecodeError>;
}

/// Compares the two most recent snapshots and triggers when their absolute
/// difference is at least `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoPointDeviation {
    threshold: Wei,
}

impl TwoPointDeviation {
    pub fn new(threshold: Wei) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Wei {
        self.threshold
    }
}

impl Strategy for TwoPointDeviation {
    fn name(&self) -> &'static str {
        "two-point-deviation"
    }

    fn evaluate(&self, history: &[Snapshot]) -> Result<Verdict, DecodeError> {
        let [newest, prior, ..] = history else {
            debug!(samples = history.len(), "not enough history to compare");
            return Ok(Verdict::insufficient_data());
        };

        let current = newest.decode()?;
        let previous = prior.decode()?;
        let deviation = current.abs_diff(previous);

        if deviation >= self.threshold {
            debug!(
                current = %current,
                previous = %previous,
                deviation = %deviation,
                threshold = %self.threshold,
                "deviation at or above threshold"
            );
            Ok(Verdict::respond())
        } else {
            Ok(Verdict::quiet())
        }
    }
}
