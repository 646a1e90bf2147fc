//! tripwire-host — drives the collector and the trap once per block.
//!
//! The trap itself is stateless; everything that remembers anything
//! lives here: the bounded snapshot history, the last block seen, and the
//! cooldown after a delivered alert.
//!
//! # Architecture
//!
//! ```text
//! Monitor
//!   ├── tick()
//!   │   ├── Collector::latest_checkpoint()
//!   │   ├── for each unseen block (oldest first):
//!   │   │   ├── Collector::collect_at(block) → History::push()
//!   │   │   ├── Trap::should_respond(History::snapshots())
//!   │   │   └── ResponseSink(message) unless cooling down
//!   │   └── → Vec<Evaluation>
//!   └── run() → periodic tick loop until shutdown
//! ```
//!
//! History is in-memory only. After a restart the first tick backfills up
//! to `capacity` blocks so a verdict is available immediately.

pub mod history;
pub mod monitor;
pub mod sink;

pub use history::{History, Sample};
pub use monitor::{Action, Evaluation, Monitor, MonitorError};
pub use sink::{ResponseSink, SinkError, SinkFuture, log_sink, webhook_sink};
