//! Monitor — the per-block scheduling loop around collector and trap.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use tripwire_collector::{BalanceSource, CollectionError, Collector};
use tripwire_core::{Checkpoint, DecodeError};
use tripwire_trap::{PayloadError, Strategy, Trap, TwoPointDeviation, Verdict};

use crate::history::History;
use crate::sink::ResponseSink;

/// Errors that abort a tick.
///
/// Each one is distinct from a negative verdict: the host learns that
/// no decision could be made, not that the balance was fine.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("collection failed: {0}")]
    Collection(#[from] CollectionError),

    #[error("snapshot decode failed at block {block}: {source}")]
    Decode {
        block: u64,
        #[source]
        source: DecodeError,
    },

    #[error("alert payload unreadable at block {block}: {source}")]
    Payload {
        block: u64,
        #[source]
        source: PayloadError,
    },
}

/// What the monitor did with a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The verdict did not ask for a response.
    None,
    /// The sink accepted the alert.
    Responded { message: String },
    /// The trap fired within the cooldown of an earlier delivery.
    CoolingDown { until_block: u64 },
    /// The sink rejected the alert; cooldown is not started.
    DeliveryFailed { error: String },
}

/// The outcome of evaluating one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub block: u64,
    pub verdict: Verdict,
    pub action: Action,
}

/// Samples the subject once per block, keeps a bounded history, asks the
/// trap for a verdict, and forwards triggering payloads to the sink.
pub struct Monitor<S, St: Strategy = TwoPointDeviation> {
    collector: Collector<S>,
    trap: Trap<St>,
    history: History,
    sink: ResponseSink,
    cooldown_blocks: u64,
    last_response: Option<u64>,
}

impl<S: BalanceSource, St: Strategy> Monitor<S, St> {
    /// Create a monitor retaining `history_capacity` snapshots.
    pub fn new(
        collector: Collector<S>,
        trap: Trap<St>,
        history_capacity: usize,
        sink: ResponseSink,
    ) -> Self {
        Self {
            collector,
            trap,
            history: History::new(history_capacity),
            sink,
            cooldown_blocks: 0,
            last_response: None,
        }
    }

    /// Suppress deliveries for this many blocks after each delivered alert.
    pub fn with_cooldown(mut self, blocks: u64) -> Self {
        self.cooldown_blocks = blocks;
        self
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn last_response_block(&self) -> Option<u64> {
        self.last_response
    }

    /// Process every block published since the previous tick.
    ///
    /// Returns one `Evaluation` per processed block, oldest first, or an
    /// empty vector when the chain has not advanced. Blocks processed
    /// before an error stay in the history; the next tick resumes after
    /// them.
    pub async fn tick(&mut self) -> Result<Vec<Evaluation>, MonitorError> {
        let head = self.collector.latest_checkpoint().await?;
        let capacity = self.history.capacity() as u64;

        let start = match self.history.latest_block() {
            Some(last) if last == head => {
                debug!(block = head, "no new block");
                return Ok(Vec::new());
            }
            Some(last) if last < head && head - last <= capacity => last + 1,
            Some(last) => {
                warn!(
                    last_block = last,
                    head,
                    capacity,
                    "history no longer contiguous with chain head, resetting"
                );
                self.history.clear();
                head.saturating_sub(capacity - 1)
            }
            None => head.saturating_sub(capacity - 1),
        };

        let mut evaluations = Vec::new();
        for block in start..=head {
            let evaluation = self.process_block(block).await?;
            evaluations.push(evaluation);
        }
        Ok(evaluations)
    }

    async fn process_block(&mut self, block: u64) -> Result<Evaluation, MonitorError> {
        let snapshot = self.collector.collect_at(Checkpoint::Block(block)).await?;

        // The block only counts as processed once it has a verdict, so a
        // failed evaluation is retried on the next tick.
        let mut window = self.history.clone();
        window.push(block, snapshot);

        let verdict = self
            .trap
            .should_respond(&window.snapshots())
            .map_err(|source| MonitorError::Decode { block, source })?;

        let message = if verdict.should_respond {
            let message = verdict
                .message()
                .map_err(|source| MonitorError::Payload { block, source })?;
            Some(message.unwrap_or_default())
        } else {
            None
        };
        self.history = window;

        let Some(message) = message else {
            return Ok(Evaluation {
                block,
                verdict,
                action: Action::None,
            });
        };

        if let Some(last) = self.last_response {
            let until_block = last.saturating_add(self.cooldown_blocks);
            if block < until_block {
                warn!(block, until_block, "trap fired during cooldown, response suppressed");
                return Ok(Evaluation {
                    block,
                    verdict,
                    action: Action::CoolingDown { until_block },
                });
            }
        }

        warn!(
            block,
            subject = %self.collector.subject(),
            %message,
            "trap fired, delivering response"
        );

        let action = match (self.sink)(message.clone()).await {
            Ok(()) => {
                self.last_response = Some(block);
                Action::Responded { message }
            }
            Err(e) => {
                error!(block, error = %e, "response delivery failed");
                Action::DeliveryFailed {
                    error: e.to_string(),
                }
            }
        };

        Ok(Evaluation {
            block,
            verdict,
            action,
        })
    }

    /// Run the monitor loop until shutdown.
    pub async fn run(&mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = interval.as_millis() as u64,
            subject = %self.collector.subject(),
            "monitor started"
        );

        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(evaluations) => {
                            if let Some(last) = evaluations.last() {
                                debug!(
                                    processed = evaluations.len(),
                                    block = last.block,
                                    "monitor tick complete"
                                );
                            }
                        }
                        Err(e) => error!(error = %e, "monitor tick failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("monitor shutting down");
                    break;
                }
            }
        }
    }
}
