//! Trap — the decider entry point.
//!
//! A `Trap` binds a monitored subject and its threshold to a windowing
//! strategy. It is a plain immutable value: every call to
//! `should_respond()` receives the full history from the host and
//! returns without touching anything else.

use tracing::{debug, error};

use tripwire_core::{Address, ConfigError, DecodeError, Snapshot, TripwireConfig, Wei};

use crate::strategy::{Strategy, TwoPointDeviation};
use crate::verdict::Verdict;

/// Parameters fixed when the trap is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapConfig {
    /// Account whose balance the snapshots describe.
    pub subject: Address,
    /// Deviation at or above which the trap fires.
    pub threshold: Wei,
}

impl TrapConfig {
    pub fn from_config(config: &TripwireConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            subject: config.subject.address,
            threshold: config.threshold()?,
        })
    }
}

/// The decider. Generic over the windowing strategy; the default compares
/// the two newest snapshots.
#[derive(Debug, Clone)]
pub struct Trap<S: Strategy = TwoPointDeviation> {
    config: TrapConfig,
    strategy: S,
}

impl Trap<TwoPointDeviation> {
    /// Build a trap using the two-point deviation rule.
    pub fn new(config: TrapConfig) -> Self {
        Self {
            config,
            strategy: TwoPointDeviation::new(config.threshold),
        }
    }
}

impl<S: Strategy> Trap<S> {
    /// Build a trap with a custom strategy. The strategy owns its own
    /// parameters; `config.threshold` is informational in that case.
    pub fn with_strategy(config: TrapConfig, strategy: S) -> Self {
        Self { config, strategy }
    }

    pub fn config(&self) -> &TrapConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Evaluate a newest-first history.
    ///
    /// Returns `Err` when one of the compared snapshots is malformed; that
    /// failure is never folded into a negative verdict.
    pub fn should_respond(&self, history: &[Snapshot]) -> Result<Verdict, DecodeError> {
        match self.strategy.evaluate(history) {
            Ok(verdict) => {
                debug!(
                    subject = %self.config.subject,
                    strategy = self.strategy.name(),
                    samples = history.len(),
                    should_respond = verdict.should_respond,
                    "trap evaluated"
                );
                Ok(verdict)
            }
            Err(e) => {
                error!(
                    subject = %self.config.subject,
                    strategy = self.strategy.name(),
                    error = %e,
                    "snapshot decode failed"
                );
                Err(e)
            }
        }
    }
}
