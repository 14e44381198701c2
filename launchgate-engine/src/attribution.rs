//! Attribution collection and organic reclassification.
//!
//! The collector owns the attribution SDK surface: it resolves tracking
//! consent, starts the SDK exactly once, ingests its callbacks, and applies
//! the reclassification rule for organic installs before releasing the
//! received flag the acquisition wait polls.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, watch};
use tracing::{debug, info, warn};

use launchgate_core::{
    AttributionEvent, AttributionSdk, Classification, ConversionResult, CoreError,
    DeepLinkContext, TrackingConsent,
};
use launchgate_store::LaunchStore;

/// Capacity of the SDK callback channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Inner State
// ============================================================================

#[derive(Debug, Default)]
struct CollectorInner {
    /// Resolved tracking consent, cached after the first prompt.
    consent: Option<TrackingConsent>,
    /// Whether the SDK has been configured and started.
    started: bool,
    /// Last conversion payload received this process.
    conversion: Option<ConversionResult>,
    /// Resolved deep link, if any.
    deep_link: Option<DeepLinkContext>,
    /// Whether usable conversion data is available to acquisition.
    received: bool,
    /// Whether the single re-verification was already scheduled.
    reverify_scheduled: bool,
}

// ============================================================================
// Attribution Collector
// ============================================================================

/// Collects attribution callbacks and applies the reclassification rule.
///
/// A non-organic (or unrecognized) conversion releases the received flag
/// immediately. An organic conversion is held provisionally while exactly
/// one delayed re-verification runs; its outcome (or failure) overwrites or
/// keeps the provisional payload and then releases the flag, so the first
/// decision request carries the corrected classification. At most one
/// re-verification runs per process, with no retry.
pub struct AttributionCollector {
    sdk: Arc<dyn AttributionSdk>,
    store: LaunchStore,
    reverify_delay: Duration,
    inner: Arc<RwLock<CollectorInner>>,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl AttributionCollector {
    /// Creates a collector over the given SDK.
    pub fn new(sdk: Arc<dyn AttributionSdk>, store: LaunchStore, reverify_delay: Duration) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            sdk,
            store,
            reverify_delay,
            inner: Arc::new(RwLock::new(CollectorInner::default())),
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    // ========================================================================
    // Consent & Start
    // ========================================================================

    /// Resolves tracking consent, caching the first answer.
    ///
    /// Must complete before [`start`](Self::start); the engine proceeds on
    /// every outcome.
    pub async fn request_tracking_authorization(&self) -> TrackingConsent {
        if let Some(consent) = self.inner.read().await.consent {
            return consent;
        }

        let consent = self.sdk.request_tracking_authorization().await;
        info!(consent = %consent, "Tracking consent resolved");
        self.inner.write().await.consent = Some(consent);
        consent
    }

    /// Configures and starts the SDK, spawning the callback ingest task.
    ///
    /// Idempotent: a started collector returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Sdk` when consent was never resolved, and
    /// propagates SDK start failures (blocking during first launch,
    /// non-blocking on resume).
    pub async fn start(self: &Arc<Self>) -> Result<(), CoreError> {
        {
            let mut inner = self.inner.write().await;
            if inner.consent.is_none() {
                return Err(CoreError::Sdk(
                    "tracking consent must be resolved before attribution starts".to_string(),
                ));
            }
            if inner.started {
                debug!("Attribution already started");
                return Ok(());
            }
            inner.started = true;
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        if let Err(e) = self.sdk.start(tx).await {
            self.inner.write().await.started = false;
            return Err(e);
        }

        let collector = Arc::clone(self);
        tokio::spawn(async move {
            collector.run_ingest(rx).await;
        });

        debug!("Attribution started");
        Ok(())
    }

    // ========================================================================
    // Callback Ingest
    // ========================================================================

    async fn run_ingest(self: Arc<Self>, mut rx: mpsc::Receiver<AttributionEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                AttributionEvent::Conversion(result) => {
                    self.ingest_conversion(result).await;
                }
                AttributionEvent::ConversionFailed(message) => {
                    // No payload means no received flag; the bounded wait
                    // times out and acquisition falls back to native.
                    warn!(error = %message, "Conversion callback failed");
                }
                AttributionEvent::DeepLink(context) => {
                    debug!(
                        deep_link_value = context.deep_link_value().unwrap_or("-"),
                        "Deep link resolved"
                    );
                    self.inner.write().await.deep_link = Some(context);
                }
            }
        }
        debug!("Attribution event channel closed");
    }

    async fn ingest_conversion(self: &Arc<Self>, result: ConversionResult) {
        let classification = result.classification();
        info!(classification = %classification, "Conversion callback received");

        // Cache the last-known payload regardless of classification
        if let Err(e) = self.store.save_conversion(&result).await {
            warn!(error = %e, "Failed to cache conversion result");
        }

        let schedule_reverify;
        {
            let mut inner = self.inner.write().await;
            inner.conversion = Some(result);
            schedule_reverify =
                classification == Classification::Organic && !inner.reverify_scheduled;
            if schedule_reverify {
                inner.reverify_scheduled = true;
            } else {
                inner.received = true;
            }
        }

        if schedule_reverify {
            debug!(
                delay = ?self.reverify_delay,
                "Organic conversion held for re-verification"
            );
            let collector = Arc::clone(self);
            tokio::spawn(async move {
                collector.run_reverify().await;
            });
        } else {
            self.notify_received().await;
        }
    }

    async fn run_reverify(self: Arc<Self>) {
        tokio::time::sleep(self.reverify_delay).await;

        match self.sdk.reverify_conversion().await {
            Ok(result) => {
                info!(
                    classification = %result.classification(),
                    "Re-verification returned"
                );
                if let Err(e) = self.store.save_conversion(&result).await {
                    warn!(error = %e, "Failed to cache re-verified conversion");
                }
                let mut inner = self.inner.write().await;
                inner.conversion = Some(result);
                inner.received = true;
            }
            Err(e) => {
                warn!(error = %e, "Re-verification failed, keeping provisional result");
                self.inner.write().await.received = true;
            }
        }

        self.notify_received().await;
    }

    // ========================================================================
    // Received Flag & Waiting
    // ========================================================================

    /// Whether usable conversion data is available.
    pub async fn is_received(&self) -> bool {
        self.inner.read().await.received
    }

    /// Bounded wait for the received flag.
    ///
    /// Polls every `poll_interval` until the flag is set or `timeout`
    /// elapses; the worst case overshoots the timeout by at most one
    /// interval.
    pub async fn wait_for_conversion(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.is_received().await {
                return true;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return false;
            }
            let remaining = deadline - now;
            tokio::time::sleep(remaining.min(poll_interval)).await;
        }
    }

    /// Subscribes to the data-received notification.
    ///
    /// Fires on every release of the received flag, including the re-fire
    /// after a re-verification; receivers that moved past acquisition can
    /// simply drop the subscription.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    async fn notify_received(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Context Access
    // ========================================================================

    /// The best available conversion payload: this process's, else the
    /// cached one from an earlier launch.
    pub async fn conversion(&self) -> Option<ConversionResult> {
        if let Some(conversion) = self.inner.read().await.conversion.clone() {
            return Some(conversion);
        }
        self.store.load_conversion().await
    }

    /// The resolved deep link, if any arrived this process.
    pub async fn deep_link(&self) -> Option<DeepLinkContext> {
        self.inner.read().await.deep_link.clone()
    }

    /// The cached consent resolution, if resolved this process.
    pub async fn consent(&self) -> Option<TrackingConsent> {
        self.inner.read().await.consent
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn conversion(status: &str) -> ConversionResult {
        let mut payload = Map::new();
        payload.insert("af_status".to_string(), Value::String(status.to_string()));
        ConversionResult::new(payload)
    }

    struct MockSdk {
        conversion: Option<ConversionResult>,
        reverified: Option<ConversionResult>,
        fail_start: bool,
        start_calls: AtomicUsize,
        reverify_calls: AtomicUsize,
        consent_calls: AtomicUsize,
    }

    impl MockSdk {
        fn new(conversion: Option<ConversionResult>) -> Self {
            Self {
                conversion,
                reverified: None,
                fail_start: false,
                start_calls: AtomicUsize::new(0),
                reverify_calls: AtomicUsize::new(0),
                consent_calls: AtomicUsize::new(0),
            }
        }

        fn with_reverified(mut self, result: ConversionResult) -> Self {
            self.reverified = Some(result);
            self
        }
    }

    #[async_trait]
    impl AttributionSdk for MockSdk {
        async fn request_tracking_authorization(&self) -> TrackingConsent {
            self.consent_calls.fetch_add(1, Ordering::SeqCst);
            TrackingConsent::Authorized
        }

        async fn start(&self, events: mpsc::Sender<AttributionEvent>) -> Result<(), CoreError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(CoreError::Sdk("mock start failure".to_string()));
            }
            if let Some(result) = self.conversion.clone() {
                let _ = events.send(AttributionEvent::Conversion(result)).await;
            }
            Ok(())
        }

        async fn reverify_conversion(&self) -> Result<ConversionResult, CoreError> {
            self.reverify_calls.fetch_add(1, Ordering::SeqCst);
            self.reverified
                .clone()
                .ok_or_else(|| CoreError::Sdk("mock re-verification failure".to_string()))
        }
    }

    fn collector_with(sdk: MockSdk) -> (Arc<AttributionCollector>, Arc<MockSdk>, tempfile::TempDir)
    {
        let sdk = Arc::new(sdk);
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchStore::with_dir(dir.path());
        let collector = Arc::new(AttributionCollector::new(
            sdk.clone(),
            store,
            Duration::from_millis(20),
        ));
        (collector, sdk, dir)
    }

    #[tokio::test]
    async fn test_start_requires_consent() {
        let (collector, sdk, _dir) = collector_with(MockSdk::new(None));

        let err = collector.start().await.unwrap_err();
        assert!(matches!(err, CoreError::Sdk(_)));
        assert_eq!(sdk.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (collector, sdk, _dir) = collector_with(MockSdk::new(None));

        collector.request_tracking_authorization().await;
        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();
        collector.start().await.unwrap();

        assert_eq!(sdk.consent_calls.load(Ordering::SeqCst), 1);
        assert_eq!(sdk.start_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_start_can_be_retried() {
        let (collector, sdk, _dir) = collector_with(MockSdk {
            fail_start: true,
            ..MockSdk::new(None)
        });

        collector.request_tracking_authorization().await;
        assert!(collector.start().await.is_err());
        // The failure released the started flag, so a retry reaches the SDK
        assert!(collector.start().await.is_err());
        assert_eq!(sdk.start_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_organic_releases_immediately() {
        let (collector, sdk, _dir) =
            collector_with(MockSdk::new(Some(conversion("Non-organic"))));

        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();

        assert!(
            collector
                .wait_for_conversion(Duration::from_millis(500), Duration::from_millis(5))
                .await
        );
        assert_eq!(sdk.reverify_calls.load(Ordering::SeqCst), 0);
        assert!(!collector.conversion().await.unwrap().is_organic());
    }

    #[tokio::test]
    async fn test_organic_is_held_until_reverification_overwrites() {
        let (collector, sdk, _dir) = collector_with(
            MockSdk::new(Some(conversion("Organic")))
                .with_reverified(conversion("Non-organic")),
        );

        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();

        assert!(
            collector
                .wait_for_conversion(Duration::from_millis(500), Duration::from_millis(5))
                .await
        );
        assert_eq!(sdk.reverify_calls.load(Ordering::SeqCst), 1);

        // The corrected payload replaced the provisional organic one
        let result = collector.conversion().await.unwrap();
        assert_eq!(result.classification(), Classification::NonOrganic);
    }

    #[tokio::test]
    async fn test_failed_reverification_keeps_provisional_payload() {
        let (collector, sdk, _dir) = collector_with(MockSdk::new(Some(conversion("Organic"))));

        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();

        assert!(
            collector
                .wait_for_conversion(Duration::from_millis(500), Duration::from_millis(5))
                .await
        );
        assert_eq!(sdk.reverify_calls.load(Ordering::SeqCst), 1);
        assert!(collector.conversion().await.unwrap().is_organic());
    }

    #[tokio::test]
    async fn test_unknown_status_skips_reverification() {
        let (collector, sdk, _dir) = collector_with(MockSdk::new(Some(conversion("paid"))));

        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();

        assert!(
            collector
                .wait_for_conversion(Duration::from_millis(500), Duration::from_millis(5))
                .await
        );
        assert_eq!(sdk.reverify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wait_times_out_without_conversion() {
        let (collector, _sdk, _dir) = collector_with(MockSdk::new(None));

        collector.request_tracking_authorization().await;
        collector.start().await.unwrap();

        let started = tokio::time::Instant::now();
        let received = collector
            .wait_for_conversion(Duration::from_millis(60), Duration::from_millis(10))
            .await;
        let elapsed = started.elapsed();

        assert!(!received);
        // Bounded: timeout plus at most one poll interval (plus scheduling)
        assert!(elapsed >= Duration::from_millis(60));
        assert!(elapsed < Duration::from_millis(160));
    }

    #[tokio::test]
    async fn test_conversion_falls_back_to_cached_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchStore::with_dir(dir.path());
        store
            .save_conversion(&conversion("Non-organic"))
            .await
            .unwrap();

        let collector = Arc::new(AttributionCollector::new(
            Arc::new(MockSdk::new(None)),
            store,
            Duration::from_millis(20),
        ));

        // Nothing arrived this process, so the cached payload serves
        let cached = collector.conversion().await.unwrap();
        assert_eq!(cached.classification(), Classification::NonOrganic);
        assert!(!collector.is_received().await);
    }
}
