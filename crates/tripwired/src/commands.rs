//! Subcommand implementations.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use tripwire_collector::{Collector, HttpEndpoint, RpcBalanceSource};
use tripwire_core::{
    Address, Checkpoint, SNAPSHOT_ENCODING_VERSION, Snapshot, TripwireConfig, parse_wei,
};
use tripwire_host::{Monitor, ResponseSink, log_sink, webhook_sink};
use tripwire_trap::{Trap, TrapConfig};

/// Run the monitor until Ctrl-C.
pub async fn run(config_path: &Path, interval_secs: u64) -> anyhow::Result<()> {
    let config = load(config_path)?;
    info!(
        path = %config_path.display(),
        subject = %config.subject.address,
        rpc = config.rpc_url(),
        "tripwire daemon starting"
    );

    let collector = build_collector(&config)?;
    let trap = Trap::new(TrapConfig::from_config(&config)?);
    let sink = build_sink(&config)?;
    let mut monitor = Monitor::new(collector, trap, config.block_sample_size(), sink)
        .with_cooldown(config.cooldown_period_blocks());

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interval = Duration::from_secs(interval_secs.max(1));

    let monitor_handle = tokio::spawn(async move {
        monitor.run(interval, shutdown_rx).await;
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to install Ctrl-C handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    join_monitor(monitor_handle).await?;

    info!("tripwire daemon stopped");
    Ok(())
}

/// Wait for the monitor task; a panic inside it fails the daemon.
async fn join_monitor(handle: JoinHandle<()>) -> anyhow::Result<()> {
    handle.await.map_err(|e| {
        error!(error = %e, "monitor task aborted");
        anyhow::Error::new(e).context("monitor task aborted")
    })
}

/// Take one snapshot, returned as `0x`-hex.
pub async fn collect(config_path: &Path, block: Option<u64>) -> anyhow::Result<String> {
    let config = load(config_path)?;
    let collector = build_collector(&config)?;
    let at = block.map_or(Checkpoint::Latest, Checkpoint::Block);
    let snapshot = collector
        .collect_at(at)
        .await
        .with_context(|| format!("collecting balance at {at}"))?;
    Ok(snapshot.to_hex())
}

/// Evaluate hex snapshots (newest first) against a threshold.
pub fn evaluate(threshold: &str, snapshots: &[String]) -> anyhow::Result<Value> {
    let threshold =
        parse_wei(threshold).with_context(|| format!("invalid threshold {threshold:?}"))?;
    if threshold == 0 {
        bail!("threshold must be greater than zero");
    }

    let history = snapshots
        .iter()
        .map(|s| Snapshot::from_hex(s))
        .collect::<Result<Vec<_>, _>>()
        .context("malformed snapshot")?;

    let trap = Trap::new(TrapConfig {
        subject: Address::new([0; 20]),
        threshold,
    });
    let verdict = trap
        .should_respond(&history)
        .context("snapshot could not be decoded")?;
    let message = verdict.message().context("verdict payload unreadable")?;

    Ok(json!({
        "should_respond": verdict.should_respond,
        "payload": format!("0x{}", hex::encode(&verdict.payload)),
        "message": message,
        "encoding_version": SNAPSHOT_ENCODING_VERSION,
    }))
}

/// Render a scaffold tripwire.toml for `address`.
pub fn init(address: &str) -> anyhow::Result<String> {
    let address: Address = address
        .parse()
        .with_context(|| format!("invalid address {address:?}"))?;
    Ok(TripwireConfig::scaffold(address).to_toml_string()?)
}

fn load(path: &Path) -> anyhow::Result<TripwireConfig> {
    TripwireConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn build_collector(config: &TripwireConfig) -> anyhow::Result<Collector<RpcBalanceSource>> {
    let source = RpcBalanceSource::new(config.rpc_url(), config.rpc_timeout()?)
        .with_context(|| format!("invalid rpc url {:?}", config.rpc_url()))?;
    Ok(Collector::new(source, config.subject.address))
}

fn build_sink(config: &TripwireConfig) -> anyhow::Result<ResponseSink> {
    let function = config.response_function();
    match config.webhook() {
        Some(url) => {
            let endpoint = HttpEndpoint::parse(url)
                .with_context(|| format!("invalid webhook url {url:?}"))?;
            info!(%url, function, "alerts go to webhook");
            Ok(webhook_sink(endpoint, function, config.response_timeout()?))
        }
        None => {
            info!(function, "no webhook configured, alerts go to the log");
            Ok(log_sink(function))
        }
    }
}
