pub mod config;
pub mod snapshot;
pub mod types;

pub use config::{ConfigError, TripwireConfig, parse_duration};
pub use snapshot::{DecodeError, SNAPSHOT_ENCODING_VERSION, SNAPSHOT_WIDTH, Snapshot};
pub use types::*;
