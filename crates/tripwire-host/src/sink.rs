//! Response sinks — where triggered alerts go.
//!
//! A sink is a one-argument async callback receiving the decoded alert
//! message. Two are provided: one that writes a log record and one that
//! POSTs to a webhook.

use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use tripwire_collector::{HttpEndpoint, JsonClient, TransportError};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("webhook transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("webhook returned http {0}")]
    Status(u16),
}

/// Future returned by a [`ResponseSink`].
pub type SinkFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = Result<(), SinkError>> + Send>,
>;

/// Callback invoked with the alert message when the trap fires.
pub type ResponseSink = Box<dyn Fn(String) -> SinkFuture + Send + Sync>;

/// A sink that records the alert as a warning-level log event.
pub fn log_sink(function: impl Into<String>) -> ResponseSink {
    let function = function.into();
    Box::new(move |message: String| -> SinkFuture {
        warn!(%function, %message, "balance alert");
        Box::pin(async { Ok(()) })
    })
}

/// A sink that POSTs `{"function": ..., "args": [message]}` to a webhook.
pub fn webhook_sink(
    endpoint: HttpEndpoint,
    function: impl Into<String>,
    timeout: Duration,
) -> ResponseSink {
    let function = function.into();
    let client = JsonClient::new(timeout);
    Box::new(move |message: String| -> SinkFuture {
        let client = client.clone();
        let endpoint = endpoint.clone();
        let body = json!({
            "function": function,
            "args": [message],
        });
        Box::pin(async move {
            let (status, _) = client.post(&endpoint, &body).await?;
            if !(200..300).contains(&status) {
                return Err(SinkError::Status(status));
            }
            info!(endpoint = %endpoint.authority(), status, "alert delivered to webhook");
            Ok(())
        })
    })
}
