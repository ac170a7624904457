#![warn(missing_docs)]

//! **`Transport`**
//! A thin, configurable HTTP transport layer for talking to a CometBFT /
//! Tendermint RPC node.
//!
//! Features:
//! - Token-bucket rate limiting so a misbehaving indexer can't overrun the
//!   node's own rate limits.
//! - Retry with jittered exponential backoff on server errors, rate limiting,
//!   and timeouts; client errors (4xx other than 429) are never retried.
//! - High-level typed calls for the three endpoints the indexer needs:
//!   `status`, `block`, and `block_results`.
//! - Unified error handling through the `TransportError` enum.

mod bucket;
mod retry;

use bucket::TokenBucket;
use reqwest::Client;
use retry::{is_retryable_status, RetryPolicy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while sending or receiving RPC requests.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport error, includes status code (0 for connection-level
    /// failures where no response was ever received) and the underlying
    /// reqwest error.
    #[error("HTTP error (status {0}): {1}")]
    Http(u16, #[source] reqwest::Error),

    /// The node returned a non-retryable client error.
    #[error("client error (status {0}): {1}")]
    Client(u16, String),

    /// Failed to parse the response body as JSON.
    #[error("invalid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Encapsulates an HTTP client, base URL, rate limiter, and retry policy for
/// a single CometBFT RPC endpoint.
pub struct Transport {
    client: Client,
    base_url: String,
    bucket: TokenBucket,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl Transport {
    /// Create a new transport pointing at `base_url` (e.g.
    /// `http://localhost:26657`), rate-limited to `rps` requests/second and
    /// retrying up to `retries` times with the given backoff parameters.
    pub fn new(
        base_url: impl Into<String>,
        timeout_ms: u64,
        rps: f64,
        retries: u32,
        backoff_ms: u64,
        backoff_jitter: f64,
    ) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            reqwest::header::HeaderValue::from_static("gzip, br"),
        );
        headers.insert(
            reqwest::header::CONNECTION,
            reqwest::header::HeaderValue::from_static("keep-alive"),
        );

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(headers)
            .build()
            .expect("reqwest client configuration is always valid");

        Transport {
            client,
            base_url: base_url.into(),
            bucket: TokenBucket::new(rps),
            retry: RetryPolicy::new(retries, backoff_ms, backoff_jitter),
        }
    }

    /// `/status` — node identity, catching-up state, and latest block height.
    pub async fn status(&self) -> Result<Value, TransportError> {
        self.get_with_retry("status", &[]).await
    }

    /// `/block?height=N` — block header and data at `height`.
    pub async fn block(&self, height: u64) -> Result<Value, TransportError> {
        let h = height.to_string();
        self.get_with_retry("block", &[("height", h.as_str())])
            .await
    }

    /// `/block_results?height=N` — ABCI begin/end-block and per-tx events at
    /// `height`.
    pub async fn block_results(&self, height: u64) -> Result<Value, TransportError> {
        let h = height.to_string();
        self.get_with_retry("block_results", &[("height", h.as_str())])
            .await
    }

    async fn get_with_retry(
        &self,
        path: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        let mut attempt = 0;
        loop {
            self.bucket.acquire().await;
            match self.get_once(path, query).await {
                Ok(v) => return Ok(v),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt >= self.retry.retries => {
                    warn!(endpoint = path, attempts = attempt + 1, error = %e, "giving up after exhausting retries");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(endpoint = path, attempt, delay_ms = %delay.as_millis(), error = %e, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn get_once(
        &self,
        path: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Value, TransportError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(http_error)?;

        let status = resp.status();
        if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Client(status.as_u16(), body));
        }
        if !status.is_success() {
            let err = resp.error_for_status().unwrap_err();
            return Err(http_error(err));
        }

        let text = resp.text().await.map_err(http_error)?;
        let body: Value = serde_json::from_str(&text).map_err(TransportError::Serialization)?;
        Ok(unwrap_result(body))
    }
}

fn http_error(e: reqwest::Error) -> TransportError {
    let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
    TransportError::Http(status, e)
}

fn is_retryable(e: &TransportError) -> bool {
    match e {
        TransportError::Http(0, _) => true,
        TransportError::Http(status, _) => reqwest::StatusCode::from_u16(*status)
            .map(is_retryable_status)
            .unwrap_or(false),
        _ => false,
    }
}

/// CometBFT RPC envelopes the payload in
/// `{"jsonrpc":"2.0","id":...,"result":{...}}`; some deployments (and most
/// test fixtures) return the bare payload directly, so unwrap it when present
/// rather than requiring it.
fn unwrap_result(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("result") => {
            map.remove("result").expect("checked above")
        }
        other => other,
    }
}

/// Deserialize a previously-fetched raw JSON envelope into a typed value.
pub fn parse<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(TransportError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_result_envelope() {
        let body = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {"a": 1}});
        assert_eq!(unwrap_result(body), serde_json::json!({"a": 1}));
    }

    #[test]
    fn passes_through_bare_payload() {
        let body = serde_json::json!({"a": 1});
        assert_eq!(unwrap_result(body.clone()), body);
    }
}
