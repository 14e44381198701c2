//! Collaborator ports driven by the launch engine.
//!
//! Platform integrations (network-path monitoring, the attribution SDK, the
//! push subsystem) live behind these traits so the orchestration logic stays
//! host-agnostic and fully testable with scripted implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use crate::error::CoreError;
use crate::models::{ConversionResult, DeepLinkContext, PushAuthorization};

/// Resolution of the tracking-consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingConsent {
    /// Tracking was authorized.
    Authorized,
    /// Tracking was refused.
    Denied,
    /// Tracking is restricted by device policy.
    Restricted,
    /// The prompt was never resolved.
    NotDetermined,
}

impl TrackingConsent {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::NotDetermined => "not determined",
        }
    }
}

impl fmt::Display for TrackingConsent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Callbacks delivered by the attribution SDK after [`AttributionSdk::start`].
#[derive(Debug, Clone)]
pub enum AttributionEvent {
    /// The conversion callback fired with a payload.
    Conversion(ConversionResult),
    /// The conversion callback reported a failure.
    ConversionFailed(String),
    /// A deferred or direct deep link resolved.
    DeepLink(DeepLinkContext),
}

/// Network reachability as observed by the host platform.
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Returns the current reachability verdict.
    fn is_connected(&self) -> bool;

    /// Waits for reachability to be reported, up to `timeout`.
    ///
    /// Returns the final verdict; false means the timeout elapsed while
    /// still unreachable.
    async fn wait_for_connection(&self, timeout: Duration) -> bool;
}

/// The attribution SDK surface the engine drives.
///
/// Consent must be resolved through
/// [`request_tracking_authorization`](Self::request_tracking_authorization)
/// before [`start`](Self::start) configures the SDK; the engine proceeds on
/// every consent outcome.
#[async_trait]
pub trait AttributionSdk: Send + Sync {
    /// Resolves the tracking-consent prompt.
    async fn request_tracking_authorization(&self) -> TrackingConsent;

    /// Configures and starts the SDK, delivering callbacks to `events`.
    async fn start(&self, events: mpsc::Sender<AttributionEvent>) -> Result<(), CoreError>;

    /// Re-queries the attribution backend for a corrected conversion payload.
    async fn reverify_conversion(&self) -> Result<ConversionResult, CoreError>;
}

/// The push notification subsystem surface the engine drives.
#[async_trait]
pub trait PushSystem: Send + Sync {
    /// Current system-level authorization status.
    async fn authorization_status(&self) -> PushAuthorization;

    /// Drives the system permission prompt; returns whether it was granted.
    async fn request_permission(&self) -> Result<bool, CoreError>;

    /// Device push token, when registration has completed.
    async fn device_token(&self) -> Option<String>;

    /// Consumes the URL carried by a tapped notification, if one is pending.
    fn take_pending_url(&self) -> Option<Url>;
}
