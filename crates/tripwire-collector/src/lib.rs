//! tripwire-collector — balance sampling for Tripwire.
//!
//! Reads the monitored account's native balance from an Ethereum JSON-RPC
//! node and encodes it as a fixed-width `Snapshot`. A failed read is
//! reported as `CollectionError`; the collector never invents a value.
//!
//! # Architecture
//!
//! ```text
//! Collector<S: BalanceSource>
//!   ├── collect()        → Snapshot at the latest block
//!   ├── collect_at(cp)   → Snapshot pinned to a block number
//!   └── latest_checkpoint()
//!
//! RpcBalanceSource
//!   ├── eth_getBalance(address, block)
//!   ├── eth_blockNumber()
//!   └── JsonClient::post() → pooled reqwest client, http or https
//! ```

pub mod collector;
pub mod error;
pub mod transport;
pub mod rpc;

pub use collector::{BalanceSource, Collector};
pub use error::{CollectionError, TransportError};
pub use transport::{HttpEndpoint, JsonClient};
pub use rpc::RpcBalanceSource;
