//! tripwired — the balance tripwire daemon.
//!
//! Single binary that assembles the tripwire crates:
//! - RPC balance source + collector
//! - Trap (two-point deviation decision)
//! - Monitor loop with cooldown
//! - Log or webhook response sink
//!
//! # Usage
//!
//! ```text
//! tripwired init --address 0x3fc9...7fad > tripwire.toml
//! tripwired run --config tripwire.toml --interval 12
//! tripwired collect --config tripwire.toml --block 19000000
//! tripwired evaluate --threshold "0.01 ether" 0x...newest 0x...prior
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tripwired", about = "Balance tripwire daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the configured account until Ctrl-C.
    Run {
        /// Path to tripwire.toml.
        #[arg(long, default_value = "tripwire.toml")]
        config: PathBuf,

        /// Poll interval in seconds.
        #[arg(long, default_value = "12")]
        interval: u64,
    },

    /// Take one snapshot and print it as hex.
    Collect {
        /// Path to tripwire.toml.
        #[arg(long, default_value = "tripwire.toml")]
        config: PathBuf,

        /// Block to read at (defaults to latest).
        #[arg(long)]
        block: Option<u64>,
    },

    /// Run the decision offline on hex snapshots, newest first.
    Evaluate {
        /// Threshold in wei, or with a unit ("0.01 ether", "5 gwei").
        #[arg(long, default_value = "10000000000000000")]
        threshold: String,

        /// Hex-encoded snapshots, newest first.
        snapshots: Vec<String>,
    },

    /// Print a scaffold tripwire.toml.
    Init {
        /// Account to watch.
        #[arg(long, default_value = "0x0000000000000000000000000000000000000000")]
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tripwired=debug,tripwire=debug"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Command::Run { config, interval } => commands::run(&config, interval).await,
        Command::Collect { config, block } => {
            let hex = commands::collect(&config, block).await?;
            println!("{hex}");
            Ok(())
        }
        Command::Evaluate {
            threshold,
            snapshots,
        } => {
            let report = commands::evaluate(&threshold, &snapshots)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Init { address } => {
            print!("{}", commands::init(&address)?);
            Ok(())
        }
    }
}
