//! Remote configuration decisions.
//!
//! Wraps the decision fetcher with the persistence rules the launch flow
//! relies on: every accepted decision is cached before use, and resume can
//! fall back to the cache whenever a fresh decision is unavailable.

use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use launchgate_core::{AppIdentity, RemoteConfig, StoredRemoteConfig};
use launchgate_fetch::{ConfigFetcher, DecisionContext, DecisionError, DecisionRequest};
use launchgate_store::LaunchStore;

// ============================================================================
// Config Source
// ============================================================================

/// Where a presented configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Obtained from the decision endpoint during this launch.
    Fresh,
    /// Loaded from the persisted record of an earlier launch.
    Cache,
}

// ============================================================================
// Config Service
// ============================================================================

/// Requests experience decisions and manages the cached configuration.
pub struct ConfigService {
    fetcher: Arc<dyn ConfigFetcher>,
    store: LaunchStore,
    identity: AppIdentity,
}

impl ConfigService {
    /// Creates a service over the given fetcher and identity.
    pub fn new(fetcher: Arc<dyn ConfigFetcher>, store: LaunchStore, identity: AppIdentity) -> Self {
        Self {
            fetcher,
            store,
            identity,
        }
    }

    /// Requests a decision and caches an accepted configuration.
    ///
    /// The cache write happens before the configuration is returned so a
    /// crash after acceptance still leaves the record behind; a write
    /// failure degrades to a warning since the in-memory value is usable.
    ///
    /// # Errors
    ///
    /// Propagates [`DecisionError`] unchanged; a rejected or malformed
    /// response leaves any previously cached configuration untouched.
    pub async fn request_decision(
        &self,
        context: DecisionContext,
    ) -> Result<RemoteConfig, DecisionError> {
        let request = DecisionRequest::build(&context, &self.identity);
        let response = self.fetcher.fetch_decision(&request).await?;
        let config = response.into_config()?;

        let stored = StoredRemoteConfig::new(config.clone(), Utc::now());
        if let Err(e) = self.store.save_remote_config(&stored).await {
            warn!(error = %e, "Failed to cache remote configuration");
        }

        info!(url = %config.url, expires = config.expires, "Decision accepted");
        Ok(config)
    }

    /// The cached configuration from an earlier decision, if any.
    pub async fn cached(&self) -> Option<StoredRemoteConfig> {
        self.store.load_remote_config().await
    }

    /// A fresh decision when one can be obtained, else the cached
    /// configuration.
    ///
    /// Expiry is reported but never blocks the fallback: a stale cached
    /// URL beats no URL.
    pub async fn fresh_or_cached(&self, context: DecisionContext) -> Option<(Url, ConfigSource)> {
        match self.request_decision(context).await {
            Ok(config) => Some((config.url, ConfigSource::Fresh)),
            Err(e) => {
                warn!(error = %e, "Fresh decision unavailable, consulting cache");
                let stored = self.cached().await?;
                if stored.is_expired() {
                    debug!(url = %stored.url(), "Serving expired cached configuration");
                } else {
                    debug!(url = %stored.url(), "Serving cached configuration");
                }
                Some((stored.url().clone(), ConfigSource::Cache))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use launchgate_fetch::DecisionResponse;

    struct FixedFetcher {
        response: Result<DecisionResponse, String>,
    }

    impl FixedFetcher {
        fn accepting(url: &str, expires: i64) -> Self {
            Self {
                response: Ok(DecisionResponse {
                    ok: true,
                    url: Some(url.to_string()),
                    expires: Some(expires),
                    message: None,
                }),
            }
        }

        fn rejecting(message: &str) -> Self {
            Self {
                response: Ok(DecisionResponse {
                    ok: false,
                    url: None,
                    expires: None,
                    message: Some(message.to_string()),
                }),
            }
        }

        fn unreachable() -> Self {
            Self {
                response: Err("connection refused".to_string()),
            }
        }
    }

    #[async_trait]
    impl ConfigFetcher for FixedFetcher {
        async fn fetch_decision(
            &self,
            _request: &DecisionRequest,
        ) -> Result<DecisionResponse, DecisionError> {
            self.response
                .clone()
                .map_err(DecisionError::Transport)
        }
    }

    fn identity() -> AppIdentity {
        AppIdentity::new("com.example.app", "ios", "id1234567890", "en_US")
    }

    fn service_with(fetcher: FixedFetcher) -> (ConfigService, LaunchStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchStore::with_dir(dir.path());
        let service = ConfigService::new(Arc::new(fetcher), store.clone(), identity());
        (service, store, dir)
    }

    #[tokio::test]
    async fn test_accepted_decision_is_cached() {
        let (service, store, _dir) =
            service_with(FixedFetcher::accepting("https://web.example.com/app", 99));

        let config = service
            .request_decision(DecisionContext::default())
            .await
            .unwrap();
        assert_eq!(config.url.as_str(), "https://web.example.com/app");

        let stored = store.load_remote_config().await.unwrap();
        assert_eq!(stored.url().as_str(), "https://web.example.com/app");
        assert_eq!(stored.config.expires, 99);
    }

    #[tokio::test]
    async fn test_rejection_leaves_cache_untouched() {
        let (service, store, _dir) = service_with(FixedFetcher::rejecting("unsupported region"));

        let previous = StoredRemoteConfig::new(
            RemoteConfig {
                url: Url::parse("https://cached.example.com/").unwrap(),
                expires: 1,
            },
            Utc::now(),
        );
        store.save_remote_config(&previous).await.unwrap();

        let err = service
            .request_decision(DecisionContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DecisionError::ServerRejected(_)));

        let stored = store.load_remote_config().await.unwrap();
        assert_eq!(stored.url().as_str(), "https://cached.example.com/");
    }

    #[tokio::test]
    async fn test_fresh_wins_over_cache() {
        let (service, store, _dir) =
            service_with(FixedFetcher::accepting("https://fresh.example.com/", 10));

        let previous = StoredRemoteConfig::new(
            RemoteConfig {
                url: Url::parse("https://cached.example.com/").unwrap(),
                expires: 1,
            },
            Utc::now(),
        );
        store.save_remote_config(&previous).await.unwrap();

        let (url, source) = service
            .fresh_or_cached(DecisionContext::default())
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://fresh.example.com/");
        assert_eq!(source, ConfigSource::Fresh);
    }

    #[tokio::test]
    async fn test_cache_serves_when_endpoint_unreachable() {
        let (service, store, _dir) = service_with(FixedFetcher::unreachable());

        let previous = StoredRemoteConfig::new(
            RemoteConfig {
                url: Url::parse("https://cached.example.com/").unwrap(),
                expires: 1,
            },
            Utc::now() - chrono::Duration::days(400),
        );
        store.save_remote_config(&previous).await.unwrap();
        assert!(previous.is_expired());

        // Expired cache still serves; expiry only affects reporting
        let (url, source) = service
            .fresh_or_cached(DecisionContext::default())
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://cached.example.com/");
        assert_eq!(source, ConfigSource::Cache);
    }

    #[tokio::test]
    async fn test_no_fresh_and_no_cache_yields_none() {
        let (service, _store, _dir) = service_with(FixedFetcher::unreachable());
        assert!(
            service
                .fresh_or_cached(DecisionContext::default())
                .await
                .is_none()
        );
    }
}
