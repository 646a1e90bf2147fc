//! Ethereum JSON-RPC balance source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use tripwire_core::{Address, Checkpoint, Wei};

use crate::collector::BalanceSource;
use crate::error::{CollectionError, CollectionResult, TransportError};
use crate::transport::{HttpEndpoint, JsonClient};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Reads balances and block numbers from a JSON-RPC 2.0 node.
#[derive(Debug)]
pub struct RpcBalanceSource {
    endpoint: HttpEndpoint,
    client: JsonClient,
    next_id: AtomicU64,
}

impl RpcBalanceSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: HttpEndpoint::parse(url)?,
            client: JsonClient::new(timeout),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &HttpEndpoint {
        &self.endpoint
    }

    /// Issue one JSON-RPC call and return its `result` member.
    pub async fn call(&self, method: &str, params: Value) -> CollectionResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let (status, body) = self.client.post(&self.endpoint, &request).await?;
        if !(200..300).contains(&status) {
            debug!(%method, status, "rpc call returned non-2xx");
            return Err(CollectionError::Status(status));
        }

        let response: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| CollectionError::Malformed(format!("{method}: {e}")))?;

        if let Some(err) = response.error {
            return Err(CollectionError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        response
            .result
            .ok_or_else(|| CollectionError::Malformed(format!("{method}: missing result")))
    }
}

impl BalanceSource for RpcBalanceSource {
    async fn balance(&self, subject: &Address, at: Checkpoint) -> CollectionResult<Wei> {
        let result = self
            .call(
                "eth_getBalance",
                json!([subject.to_string(), at.block_tag()]),
            )
            .await?;
        parse_quantity(&result)
    }

    async fn latest_checkpoint(&self) -> CollectionResult<u64> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let block = parse_quantity(&result)?;
        u64::try_from(block)
            .map_err(|_| CollectionError::Malformed(format!("block number too large: {block}")))
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x1bc16d674ec80000"`.
fn parse_quantity(value: &Value) -> CollectionResult<Wei> {
    let s = value
        .as_str()
        .ok_or_else(|| CollectionError::Malformed(format!("expected hex string, got {value}")))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| CollectionError::Malformed(format!("quantity missing 0x prefix: {s}")))?;
    if digits.is_empty() {
        return Err(CollectionError::Malformed(format!("empty quantity: {s}")));
    }
    Wei::from_str_radix(digits, 16)
        .map_err(|e| CollectionError::Malformed(format!("quantity {s}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDR: &str = "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad";

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        }))
    }

    fn source_for(server: &MockServer) -> RpcBalanceSource {
        RpcBalanceSource::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn parse_quantity_values() {
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity(&json!("0x64")).unwrap(), 100);
        assert_eq!(
            parse_quantity(&json!("0x1bc16d674ec80000")).unwrap(),
            2_000_000_000_000_000_000
        );
    }

    #[test]
    fn parse_quantity_rejects_malformed() {
        assert!(parse_quantity(&json!(100)).is_err());
        assert!(parse_quantity(&json!("100")).is_err());
        assert!(parse_quantity(&json!("0x")).is_err());
        assert!(parse_quantity(&json!("0xzz")).is_err());
        // 33 hex digits overflow u128.
        assert!(parse_quantity(&json!(format!("0x1{}", "0".repeat(32)))).is_err());
    }

    #[tokio::test]
    async fn balance_at_latest() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_getBalance",
                "params": [ADDR, "latest"],
            })))
            .respond_with(rpc_result(json!("0x2386f26fc10000")))
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(&server);
        let balance = source
            .balance(&ADDR.parse().unwrap(), Checkpoint::Latest)
            .await
            .unwrap();
        assert_eq!(balance, 10_000_000_000_000_000);
    }

    #[tokio::test]
    async fn balance_at_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_getBalance",
                "params": [ADDR, "0x10"],
            })))
            .respond_with(rpc_result(json!("0x64")))
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(&server);
        let balance = source
            .balance(&ADDR.parse().unwrap(), Checkpoint::Block(16))
            .await
            .unwrap();
        assert_eq!(balance, 100);
    }

    #[tokio::test]
    async fn latest_block_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "eth_blockNumber"})))
            .respond_with(rpc_result(json!("0x12a05f2")))
            .mount(&server)
            .await;

        let source = source_for(&server);
        assert_eq!(source.latest_checkpoint().await.unwrap(), 19_531_250);
    }

    #[tokio::test]
    async fn rpc_error_object_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32602, "message": "invalid argument"},
            })))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let err = source.latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, CollectionError::Rpc { code: -32602, .. }));
    }

    #[tokio::test]
    async fn http_error_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let err = source
            .balance(&ADDR.parse().unwrap(), Checkpoint::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::Status(503)));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let err = source.latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, CollectionError::Malformed(_)));
    }

    #[tokio::test]
    async fn missing_result_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1})))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let err = source.latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, CollectionError::Malformed(_)));
    }

    #[tokio::test]
    async fn https_node_url_is_accepted() {
        let source =
            RpcBalanceSource::new("https://eth.example.org/v1/key", Duration::from_secs(5)).unwrap();
        assert_eq!(source.endpoint().url().scheme(), "https");
        assert!(RpcBalanceSource::new("ftp://eth.example.org", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let source = RpcBalanceSource::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = source.latest_checkpoint().await.unwrap_err();
        assert!(matches!(err, CollectionError::Transport(_)));
    }
}
