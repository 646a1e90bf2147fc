//! JSON-over-HTTP transport shared by the RPC source and the webhook sink.
//!
//! Wraps a pooled `reqwest` client (rustls for `https://`). Every request
//! carries its own timeout.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::TransportError;

const USER_AGENT: &str = concat!("tripwire-collector/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A validated `http://` or `https://` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpoint {
    url: Url,
}

impl HttpEndpoint {
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url.trim())
            .map_err(|e| TransportError::InvalidEndpoint(format!("{url}: {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "{url}: unsupported scheme {other}"
                )));
            }
        }
        if url.host_str().is_none() {
            return Err(TransportError::InvalidEndpoint(format!("{url}: missing host")));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host[:port]`, for logs.
    pub fn authority(&self) -> String {
        match (self.url.host_str(), self.url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }
}

impl fmt::Display for HttpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Pooled HTTP client that POSTs JSON bodies.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
    timeout: Duration,
}

impl JsonClient {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `body` as JSON and return the status code and raw response body.
    pub async fn post(
        &self,
        endpoint: &HttpEndpoint,
        body: &serde_json::Value,
    ) -> Result<(u16, Bytes), TransportError> {
        let resp = self
            .client
            .post(endpoint.url().clone())
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| self.classify(endpoint, e))?;
        Ok((status, body))
    }

    fn classify(&self, endpoint: &HttpEndpoint, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            debug!(endpoint = %endpoint.authority(), "request timed out");
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connect {
                address: endpoint.authority(),
                reason: e.to_string(),
            }
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_endpoint_with_port_and_path() {
        let ep = HttpEndpoint::parse("http://127.0.0.1:8545/rpc?key=1").unwrap();
        assert_eq!(ep.authority(), "127.0.0.1:8545");
        assert_eq!(ep.url().path(), "/rpc");
        assert_eq!(ep.url().query(), Some("key=1"));
    }

    #[test]
    fn parse_endpoint_accepts_https() {
        let ep = HttpEndpoint::parse("https://mainnet.example.com/v3/abc").unwrap();
        assert_eq!(ep.authority(), "mainnet.example.com");
        assert_eq!(ep.url().scheme(), "https");
    }

    #[test]
    fn parse_endpoint_rejects_other_schemes() {
        assert!(matches!(
            HttpEndpoint::parse("ws://127.0.0.1:8546"),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn parse_endpoint_rejects_missing_scheme() {
        assert!(matches!(
            HttpEndpoint::parse("127.0.0.1:8545"),
            Err(TransportError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn post_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(query_param("key", "1"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"ping": true})))
            .respond_with(ResponseTemplate::new(202).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let ep = HttpEndpoint::parse(&format!("{}/hook?key=1", server.uri())).unwrap();
        let client = JsonClient::new(Duration::from_secs(2));
        let (status, body) = client
            .post(&ep, &serde_json::json!({"ping": true}))
            .await
            .unwrap();
        assert_eq!(status, 202);
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn post_to_closed_port_fails() {
        let ep = HttpEndpoint::parse("http://127.0.0.1:1/").unwrap();
        let client = JsonClient::new(Duration::from_millis(500));
        let err = client.post(&ep, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect { .. } | TransportError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn post_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let ep = HttpEndpoint::parse(&server.uri()).unwrap();
        let client = JsonClient::new(Duration::from_millis(100));
        let err = client.post(&ep, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
