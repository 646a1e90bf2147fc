//! Collector error types.

use std::time::Duration;

use thiserror::Error;

/// Failures moving bytes to and from an HTTP endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    #[error("http request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors that can occur while sampling the monitored balance.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("rpc endpoint returned http {0}")]
    Status(u16),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

pub type CollectionResult<T> = Result<T, CollectionError>;
