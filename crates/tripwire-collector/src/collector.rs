//! Collector — samples the monitored balance into snapshots.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use tripwire_core::{Address, Checkpoint, Snapshot, Wei};

use crate::error::CollectionResult;

/// Where balances come from.
///
/// Implementations must be read-only with respect to the monitored chain.
pub trait BalanceSource: Send + Sync {
    /// Native balance of `subject` as of `at`.
    fn balance(
        &self,
        subject: &Address,
        at: Checkpoint,
    ) -> impl Future<Output = CollectionResult<Wei>> + Send;

    /// Number of the most recent block the source knows about.
    fn latest_checkpoint(&self) -> impl Future<Output = CollectionResult<u64>> + Send;
}

impl<T: BalanceSource> BalanceSource for Arc<T> {
    fn balance(
        &self,
        subject: &Address,
        at: Checkpoint,
    ) -> impl Future<Output = CollectionResult<Wei>> + Send {
        (**self).balance(subject, at)
    }

    fn latest_checkpoint(&self) -> impl Future<Output = CollectionResult<u64>> + Send {
        (**self).latest_checkpoint()
    }
}

/// Reads one subject's balance and encodes it as a `Snapshot`.
#[derive(Debug)]
pub struct Collector<S> {
    source: S,
    subject: Address,
}

impl<S: BalanceSource> Collector<S> {
    pub fn new(source: S, subject: Address) -> Self {
        Self { source, subject }
    }

    pub fn subject(&self) -> &Address {
        &self.subject
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Snapshot the balance at the source's current head.
    pub async fn collect(&self) -> CollectionResult<Snapshot> {
        self.collect_at(Checkpoint::Latest).await
    }

    /// Snapshot the balance as of a specific checkpoint.
    pub async fn collect_at(&self, at: Checkpoint) -> CollectionResult<Snapshot> {
        match self.source.balance(&self.subject, at).await {
            Ok(balance) => {
                debug!(subject = %self.subject, checkpoint = %at, balance = %balance, "balance collected");
                Ok(Snapshot::encode(balance))
            }
            Err(e) => {
                warn!(subject = %self.subject, checkpoint = %at, error = %e, "balance collection failed");
                Err(e)
            }
        }
    }

    pub async fn latest_checkpoint(&self) -> CollectionResult<u64> {
        self.source.latest_checkpoint().await
    }
}
