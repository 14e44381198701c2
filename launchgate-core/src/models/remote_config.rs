//! Remote experience configuration types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A validated experience decision returned by the config endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Fully resolved web experience URL.
    pub url: Url,
    /// Expiry as seconds since the Unix epoch.
    pub expires: i64,
}

impl RemoteConfig {
    /// Creates a remote config.
    pub fn new(url: Url, expires: i64) -> Self {
        Self { url, expires }
    }

    /// Returns true if the expiry timestamp has passed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires
    }
}

/// The last successfully fetched config, as persisted.
///
/// Expiry affects preference and reporting only; a stale config remains
/// usable as a last-resort fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRemoteConfig {
    /// The fetched decision.
    #[serde(flatten)]
    pub config: RemoteConfig,
    /// When the fetch succeeded.
    pub saved_at: DateTime<Utc>,
}

impl StoredRemoteConfig {
    /// Wraps a freshly fetched config with its save timestamp.
    pub fn new(config: RemoteConfig, saved_at: DateTime<Utc>) -> Self {
        Self { config, saved_at }
    }

    /// The persisted experience URL.
    pub fn url(&self) -> &Url {
        &self.config.url
    }

    /// Returns true if the config's expiry has passed.
    pub fn is_expired(&self) -> bool {
        self.config.is_expired_at(Utc::now())
    }
}
