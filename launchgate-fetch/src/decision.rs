//! Config decision request wire contract.
//!
//! A single POST carries the merged attribution snapshot; the response
//! either names a web experience URL with an expiry or declines. There is
//! no session or pagination, and no retry at this layer.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use launchgate_core::{AppIdentity, ConversionResult, DeepLinkContext, RemoteConfig};

use crate::client::HttpClient;
use crate::error::DecisionError;

// ============================================================================
// Request
// ============================================================================

/// Attribution context available when a decision request is issued.
///
/// Every field is optional; an empty context still produces a valid
/// request carrying just the client identifiers.
#[derive(Debug, Clone, Default)]
pub struct DecisionContext {
    /// Last known conversion payload, if any.
    pub conversion: Option<ConversionResult>,
    /// Resolved deep link, if any.
    pub deep_link: Option<DeepLinkContext>,
    /// Device push token, if registration completed.
    pub push_token: Option<String>,
}

/// A fully merged decision request body.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    body: Map<String, Value>,
}

impl DecisionRequest {
    /// Builds the request body from the available context.
    ///
    /// Merge precedence: the conversion payload is copied first, deep-link
    /// values never override keys already present, and the client
    /// identifiers always win.
    pub fn build(ctx: &DecisionContext, identity: &AppIdentity) -> Self {
        let mut body = Map::new();

        if let Some(conversion) = &ctx.conversion {
            for (key, value) in &conversion.payload {
                body.insert(key.clone(), value.clone());
            }
        }

        if let Some(deep_link) = &ctx.deep_link {
            for (key, value) in &deep_link.values {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }

        if let Some(id) = ctx
            .conversion
            .as_ref()
            .and_then(|c| c.attribution_id.clone())
        {
            body.insert("af_id".to_string(), Value::String(id));
        }
        body.insert(
            "bundle_id".to_string(),
            Value::String(identity.bundle_id.clone()),
        );
        body.insert("os".to_string(), Value::String(identity.os.clone()));
        body.insert(
            "store_id".to_string(),
            Value::String(identity.store_id.clone()),
        );
        body.insert(
            "locale".to_string(),
            Value::String(identity.locale.clone()),
        );
        if let Some(project) = &identity.firebase_project_id {
            body.insert(
                "firebase_project_id".to_string(),
                Value::String(project.clone()),
            );
        }
        if let Some(token) = &ctx.push_token {
            body.insert("push_token".to_string(), Value::String(token.clone()));
        }

        Self { body }
    }

    /// The merged JSON body.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

// ============================================================================
// Response
// ============================================================================

/// Raw decision response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionResponse {
    /// Whether the server provided a web experience.
    #[serde(default)]
    pub ok: bool,
    /// The experience URL, present when `ok`.
    #[serde(default)]
    pub url: Option<String>,
    /// Expiry as seconds since the Unix epoch, present when `ok`.
    #[serde(default)]
    pub expires: Option<i64>,
    /// Optional human-readable rejection reason.
    #[serde(default)]
    pub message: Option<String>,
}

impl DecisionResponse {
    /// Validates the response into a usable config.
    ///
    /// # Errors
    ///
    /// Returns `ServerRejected` when the server declined, and `Malformed`
    /// when an accepting response is missing its URL or expiry, or the URL
    /// does not parse.
    pub fn into_config(self) -> Result<RemoteConfig, DecisionError> {
        if !self.ok {
            return Err(DecisionError::ServerRejected(
                self.message
                    .unwrap_or_else(|| "no reason given".to_string()),
            ));
        }

        let url = self.url.ok_or_else(|| {
            DecisionError::Malformed("accepting response missing url".to_string())
        })?;
        let expires = self.expires.ok_or_else(|| {
            DecisionError::Malformed("accepting response missing expires".to_string())
        })?;
        let url = Url::parse(&url)
            .map_err(|e| DecisionError::Malformed(format!("experience url: {e}")))?;

        Ok(RemoteConfig::new(url, expires))
    }
}

// ============================================================================
// Fetcher Port & HTTP Implementation
// ============================================================================

/// Transport port for issuing decision requests.
///
/// The engine drives this; the HTTP implementation lives below and the
/// scripted one lives with the engine's sims.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    /// Issues one decision request and returns the raw response.
    async fn fetch_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError>;
}

/// HTTP implementation of [`ConfigFetcher`] against a fixed endpoint.
#[derive(Debug, Clone)]
pub struct DecisionClient {
    client: HttpClient,
    endpoint: Url,
}

impl DecisionClient {
    /// Creates a client for `endpoint` with the default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEndpoint` when the endpoint does not parse as an
    /// HTTP(S) URL.
    pub fn new(endpoint: &str) -> Result<Self, DecisionError> {
        Self::with_client(endpoint, HttpClient::new()?)
    }

    /// Creates a client for `endpoint` using an existing HTTP client.
    pub fn with_client(endpoint: &str, client: HttpClient) -> Result<Self, DecisionError> {
        let url = Url::parse(endpoint)
            .map_err(|e| DecisionError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DecisionError::InvalidEndpoint(format!(
                "{endpoint}: unsupported scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Self {
            client,
            endpoint: url,
        })
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConfigFetcher for DecisionClient {
    #[instrument(skip(self, request), fields(endpoint = %self.endpoint))]
    async fn fetch_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        let response = self
            .client
            .post_json(self.endpoint.clone(), request.body())
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Decision endpoint returned error status");
            return Err(DecisionError::ServerRejected(format!("status {status}")));
        }

        let decoded: DecisionResponse = response
            .json()
            .await
            .map_err(|e| DecisionError::Malformed(e.to_string()))?;

        debug!(ok = decoded.ok, "Decision response received");
        Ok(decoded)
    }
}

// ============================================================================
// Tests
// ============================================================================
