//! HTTP client abstraction for testability

use std::future::Future;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// An HTTP-level failure, carrying a human-readable description.
#[derive(Debug, Clone, Error)]
#[error("HTTP error: {0}")]
pub struct HttpError(pub String);

/// Trait for asynchronous HTTP GET operations.
///
/// The provider layer depends on this abstraction instead of a concrete
/// client so tests can inject canned responses.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Default User-Agent string for HTTP requests.
/// Tile servers reject requests without a browser-like User-Agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Async HTTP client implementation using reqwest.
///
/// Pools connections and keeps them warm; tile retrieval issues many
/// small requests against the same handful of hosts.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default 30 second request timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(30)
    }

    /// Creates a client with a custom request timeout in seconds.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(64)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(HttpError(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "HTTP error status"
            );
            return Err(HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(HttpError(format!("Failed to read response: {}", e)))
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Mock async HTTP client mapping exact URLs to canned responses.
    #[derive(Default)]
    pub struct MockAsyncHttpClient {
        pub responses: HashMap<String, Result<Vec<u8>, HttpError>>,
        /// Returned for URLs not present in `responses`.
        pub fallback: Option<Result<Vec<u8>, HttpError>>,
    }

    impl MockAsyncHttpClient {
        pub fn with_response(mut self, url: &str, response: Result<Vec<u8>, HttpError>) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        pub fn with_fallback(mut self, response: Result<Vec<u8>, HttpError>) -> Self {
            self.fallback = Some(response);
            self
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
            if let Some(response) = self.responses.get(url) {
                return response.clone();
            }
            match &self.fallback {
                Some(response) => response.clone(),
                None => Err(HttpError(format!("no canned response for {}", url))),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_client_per_url_responses() {
        let mock = MockAsyncHttpClient::default()
            .with_response("http://a.example", Ok(vec![1, 2, 3]))
            .with_response("http://b.example", Err(HttpError("404".to_string())));

        assert_eq!(mock.get("http://a.example").await.unwrap(), vec![1, 2, 3]);
        assert!(mock.get("http://b.example").await.is_err());
        assert!(mock.get("http://missing.example").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_client_fallback() {
        let mock = MockAsyncHttpClient::default().with_fallback(Ok(vec![9]));
        assert_eq!(mock.get("http://anything.example").await.unwrap(), vec![9]);
    }
}
