//! HTTP client abstractions.

use crate::error::DecisionError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Thin HTTP client with a fixed per-request timeout.
///
/// There is no retry loop here: decision retries are event-driven by the
/// engine (reachability restoration, manual retry, permission actions).
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with the default timeout.
    pub fn new() -> Result<Self, DecisionError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DecisionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("launchgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DecisionError::Transport(format!("client construction: {e}")))?;

        Ok(Self { inner: client })
    }

    /// Performs a POST request with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<Response, DecisionError> {
        debug!(url = %url, "Making POST request");

        self.inner
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(DecisionError::from_reqwest)
    }

    /// Performs a simple GET request.
    pub async fn get(&self, url: &str) -> Result<Response, DecisionError> {
        self.inner
            .get(url)
            .send()
            .await
            .map_err(DecisionError::from_reqwest)
    }
}

impl Default for HttpClient {
    /// Creates a default HTTP client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should only happen
    /// if the system's TLS configuration is broken, which indicates a
    /// fundamentally broken environment where the application cannot function.
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            panic!(
                "Failed to create default HTTP client: {}. \
                This usually indicates a broken TLS/SSL configuration.",
                e
            )
        })
    }
}
