//! Scripted collaborators.
//!
//! Deterministic implementations of the collaborator ports, driven by
//! small scripts instead of platform services. They back the simulation
//! command and the scenario tests: a script describes what the platform
//! would have done, and the engine runs against it unmodified.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use url::Url;

use launchgate_core::{
    AttributionEvent, AttributionSdk, ConversionResult, CoreError, DeepLinkContext,
    PushAuthorization, PushSystem, TrackingConsent,
};
use launchgate_fetch::{ConfigFetcher, DecisionError, DecisionRequest, DecisionResponse};

/// Expiry far enough out that scripted configs never age out mid-run.
const FAR_FUTURE_EXPIRES: i64 = 4_102_444_800;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ============================================================================
// Conversion Payload Helpers
// ============================================================================

/// A conversion payload with the given attribution status.
pub fn conversion_with_status(status: &str) -> ConversionResult {
    let mut payload = Map::new();
    payload.insert("af_status".to_string(), Value::String(status.to_string()));
    ConversionResult::new(payload)
}

/// An organic conversion payload.
pub fn organic_conversion() -> ConversionResult {
    conversion_with_status("Organic")
}

/// A non-organic conversion payload with source fields filled in.
pub fn non_organic_conversion() -> ConversionResult {
    let mut payload = Map::new();
    payload.insert(
        "af_status".to_string(),
        Value::String("Non-organic".to_string()),
    );
    payload.insert(
        "media_source".to_string(),
        Value::String("scripted_ads".to_string()),
    );
    payload.insert(
        "campaign".to_string(),
        Value::String("launch_test".to_string()),
    );
    ConversionResult::new(payload)
}

/// A deep link context resolving to the given value.
pub fn deep_link_with_value(value: &str) -> DeepLinkContext {
    let mut values = Map::new();
    values.insert(
        "deep_link_value".to_string(),
        Value::String(value.to_string()),
    );
    DeepLinkContext::new(values)
}

// ============================================================================
// Scripted Attribution
// ============================================================================

/// What the attribution SDK should report when started.
#[derive(Debug, Clone)]
pub struct AttributionScript {
    /// Consent the tracking prompt resolves to.
    pub consent: TrackingConsent,
    /// Conversion payload delivered after `conversion_delay`, if any.
    pub conversion: Option<ConversionResult>,
    /// Delay before the conversion callback fires.
    pub conversion_delay: Duration,
    /// Failure message delivered instead of a conversion payload.
    pub conversion_failure: Option<String>,
    /// Deep link delivered immediately on start, if any.
    pub deep_link: Option<DeepLinkContext>,
    /// Re-verification outcome; `None` makes re-verification fail.
    pub reverify: Option<ConversionResult>,
    /// Makes `start` itself fail.
    pub fail_start: bool,
}

impl Default for AttributionScript {
    fn default() -> Self {
        Self {
            consent: TrackingConsent::Authorized,
            conversion: None,
            conversion_delay: Duration::ZERO,
            conversion_failure: None,
            deep_link: None,
            reverify: None,
            fail_start: false,
        }
    }
}

impl AttributionScript {
    /// A script delivering the given conversion immediately.
    pub fn delivering(conversion: ConversionResult) -> Self {
        Self {
            conversion: Some(conversion),
            ..Self::default()
        }
    }

    /// A script that never delivers any conversion data.
    pub fn silent() -> Self {
        Self::default()
    }
}

/// Attribution SDK playing back an [`AttributionScript`].
pub struct ScriptedAttribution {
    script: AttributionScript,
    start_calls: AtomicUsize,
    reverify_calls: AtomicUsize,
}

impl ScriptedAttribution {
    /// Creates an SDK over the given script.
    pub fn new(script: AttributionScript) -> Self {
        Self {
            script,
            start_calls: AtomicUsize::new(0),
            reverify_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `start` was driven.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// How many times re-verification was driven.
    pub fn reverify_calls(&self) -> usize {
        self.reverify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributionSdk for ScriptedAttribution {
    async fn request_tracking_authorization(&self) -> TrackingConsent {
        self.script.consent
    }

    async fn start(&self, events: mpsc::Sender<AttributionEvent>) -> Result<(), CoreError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_start {
            return Err(CoreError::Sdk("scripted start failure".to_string()));
        }

        let script = self.script.clone();
        tokio::spawn(async move {
            // Deep links resolve before conversion data so the collector
            // has them by the time the received flag releases.
            if let Some(deep_link) = script.deep_link {
                let _ = events.send(AttributionEvent::DeepLink(deep_link)).await;
            }

            if !script.conversion_delay.is_zero() {
                tokio::time::sleep(script.conversion_delay).await;
            }

            if let Some(message) = script.conversion_failure {
                let _ = events
                    .send(AttributionEvent::ConversionFailed(message))
                    .await;
            } else if let Some(conversion) = script.conversion {
                let _ = events.send(AttributionEvent::Conversion(conversion)).await;
            }
        });

        Ok(())
    }

    async fn reverify_conversion(&self) -> Result<ConversionResult, CoreError> {
        self.reverify_calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .reverify
            .clone()
            .ok_or_else(|| CoreError::Sdk("scripted re-verification failure".to_string()))
    }
}

// ============================================================================
// Scripted Push System
// ============================================================================

/// Push system with a scriptable authorization status and pending URL.
pub struct ScriptedPushSystem {
    status: Mutex<PushAuthorization>,
    grant: bool,
    token: Mutex<Option<String>>,
    pending_url: Mutex<Option<Url>>,
    request_calls: AtomicUsize,
}

impl ScriptedPushSystem {
    /// A push system with nothing determined and prompts that grant.
    pub fn new() -> Self {
        Self {
            status: Mutex::new(PushAuthorization::NotDetermined),
            grant: true,
            token: Mutex::new(None),
            pending_url: Mutex::new(None),
            request_calls: AtomicUsize::new(0),
        }
    }

    /// Starts from the given authorization status.
    pub fn with_status(self, status: PushAuthorization) -> Self {
        *lock(&self.status) = status;
        self
    }

    /// Makes the permission prompt deny instead of grant.
    pub fn with_denied_prompt(mut self) -> Self {
        self.grant = false;
        self
    }

    /// Provides a device token.
    pub fn with_token(self, token: &str) -> Self {
        *lock(&self.token) = Some(token.to_string());
        self
    }

    /// Queues a notification-delivered URL for the next launch.
    pub fn with_pending_url(self, url: Url) -> Self {
        *lock(&self.pending_url) = Some(url);
        self
    }

    /// Mutates the authorization status mid-run.
    pub fn set_status(&self, status: PushAuthorization) {
        *lock(&self.status) = status;
    }

    /// How many times the system prompt was driven.
    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedPushSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PushSystem for ScriptedPushSystem {
    async fn authorization_status(&self) -> PushAuthorization {
        *lock(&self.status)
    }

    async fn request_permission(&self) -> Result<bool, CoreError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.status) = if self.grant {
            PushAuthorization::Granted
        } else {
            PushAuthorization::Denied
        };
        Ok(self.grant)
    }

    async fn device_token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    fn take_pending_url(&self) -> Option<Url> {
        lock(&self.pending_url).take()
    }
}

// ============================================================================
// Scripted Decision Endpoint
// ============================================================================

/// One scripted answer from the decision endpoint.
#[derive(Debug, Clone)]
pub enum ScriptedDecision {
    /// Accepts with a web experience.
    Accept {
        /// Experience URL the response carries.
        url: String,
        /// Expiry as seconds since the Unix epoch.
        expires: i64,
    },
    /// Declines with a reason.
    Reject(String),
    /// Accepts but omits the URL, which the client treats as malformed.
    AcceptWithoutUrl,
    /// Fails at the transport layer before any response.
    Transport(String),
}

impl ScriptedDecision {
    /// An accepting decision that never expires during a run.
    pub fn accept(url: &str) -> Self {
        Self::Accept {
            url: url.to_string(),
            expires: FAR_FUTURE_EXPIRES,
        }
    }
}

/// Decision endpoint playing back a queue of [`ScriptedDecision`]s.
///
/// Each request consumes one queued decision; the last one repeats once
/// the queue drains. An endpoint with no script fails at the transport
/// layer, which models an unreachable server. Every received request is
/// captured for inspection.
pub struct ScriptedConfigFetcher {
    queue: Mutex<VecDeque<ScriptedDecision>>,
    requests: Mutex<Vec<DecisionRequest>>,
    calls: AtomicUsize,
}

impl ScriptedConfigFetcher {
    /// An endpoint with no scripted decisions (always unreachable).
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queues a decision.
    pub fn with_decision(self, decision: ScriptedDecision) -> Self {
        lock(&self.queue).push_back(decision);
        self
    }

    /// Queues a decision mid-run.
    pub fn push_decision(&self, decision: ScriptedDecision) {
        lock(&self.queue).push_back(decision);
    }

    /// Every request body the endpoint received, in order.
    pub fn requests(&self) -> Vec<DecisionRequest> {
        lock(&self.requests).clone()
    }

    /// How many requests reached the endpoint.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_decision(&self) -> Option<ScriptedDecision> {
        let mut queue = lock(&self.queue);
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for ScriptedConfigFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigFetcher for ScriptedConfigFetcher {
    async fn fetch_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        match self.next_decision() {
            Some(ScriptedDecision::Accept { url, expires }) => Ok(DecisionResponse {
                ok: true,
                url: Some(url),
                expires: Some(expires),
                message: None,
            }),
            Some(ScriptedDecision::Reject(message)) => Ok(DecisionResponse {
                ok: false,
                url: None,
                expires: None,
                message: Some(message),
            }),
            Some(ScriptedDecision::AcceptWithoutUrl) => Ok(DecisionResponse {
                ok: true,
                url: None,
                expires: Some(FAR_FUTURE_EXPIRES),
                message: None,
            }),
            Some(ScriptedDecision::Transport(message)) => Err(DecisionError::Transport(message)),
            None => Err(DecisionError::Transport(
                "no scripted decision".to_string(),
            )),
        }
    }
}
