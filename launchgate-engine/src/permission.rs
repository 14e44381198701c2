//! Push permission gating.
//!
//! Decides whether the permission screen should interpose before the web
//! experience, and records the outcomes that close the gate. The gate only
//! ever closes harder: once the system prompt was driven (or the platform
//! resolved the status), no later state transition reopens it.

use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use launchgate_core::{PushAuthorization, PushSystem};
use launchgate_store::LaunchStore;

// ============================================================================
// Permission Gatekeeper
// ============================================================================

/// Gates the push permission screen and tracks its persistent state.
pub struct PermissionGatekeeper {
    push: Arc<dyn PushSystem>,
    store: LaunchStore,
    cooldown: chrono::Duration,
}

impl PermissionGatekeeper {
    /// Creates a gatekeeper with the given skip cooldown.
    pub fn new(push: Arc<dyn PushSystem>, store: LaunchStore, cooldown: chrono::Duration) -> Self {
        Self {
            push,
            store,
            cooldown,
        }
    }

    /// Whether the permission screen should be shown before the web
    /// experience.
    ///
    /// Returns `false` once the platform resolved the authorization either
    /// way, once the prompt was driven on an earlier launch, or while a
    /// skip is inside its cooldown window.
    pub async fn should_show_permission_screen(&self) -> bool {
        let status = self.push.authorization_status().await;
        let mut gate = self.store.load_push_gate().await;

        if status.is_resolved() {
            // The system prompt can never be shown again; make sure the
            // persistent gate reflects that even if the request record
            // was lost.
            if !gate.has_requested_permission {
                gate.has_requested_permission = true;
                if let Err(e) = self.store.save_push_gate(&gate).await {
                    warn!(error = %e, "Failed to persist resolved permission gate");
                }
            }
            debug!(status = %status, "Permission already resolved");
            return false;
        }

        if gate.has_requested_permission {
            debug!("Permission was requested on an earlier launch");
            return false;
        }

        if gate.skip_within(self.cooldown, Utc::now()) {
            debug!("Permission skip cooldown active");
            return false;
        }

        true
    }

    /// Drives the system permission prompt, closing the gate first.
    ///
    /// The gate is persisted before the prompt runs so that a crash
    /// mid-prompt still counts as requested. Prompt failures degrade to a
    /// denied outcome.
    pub async fn request_permission(&self) -> bool {
        let mut gate = self.store.load_push_gate().await;
        gate.has_requested_permission = true;
        if let Err(e) = self.store.save_push_gate(&gate).await {
            warn!(error = %e, "Failed to persist permission request");
        }

        match self.push.request_permission().await {
            Ok(granted) => {
                info!(granted, "Permission prompt resolved");
                granted
            }
            Err(e) => {
                warn!(error = %e, "Permission prompt failed");
                false
            }
        }
    }

    /// Records a skip, starting the cooldown window.
    pub async fn skip(&self) {
        let mut gate = self.store.load_push_gate().await;
        gate.last_skipped_at = Some(Utc::now());
        if let Err(e) = self.store.save_push_gate(&gate).await {
            warn!(error = %e, "Failed to persist permission skip");
        }
        info!("Permission screen skipped");
    }

    /// The device push token: the live one when the platform has it,
    /// otherwise the cached token from an earlier launch.
    pub async fn push_token(&self) -> Option<String> {
        if let Some(token) = self.push.device_token().await {
            if let Err(e) = self.store.save_push_token(&token).await {
                warn!(error = %e, "Failed to cache push token");
            }
            return Some(token);
        }
        self.store.load_push_token().await
    }

    /// Consumes a notification-delivered URL, if one is pending.
    pub fn take_pending_url(&self) -> Option<Url> {
        self.push.take_pending_url()
    }

    /// Current platform authorization status.
    pub async fn authorization_status(&self) -> PushAuthorization {
        self.push.authorization_status().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use launchgate_core::{CoreError, PushGateState};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockPush {
        status: Mutex<PushAuthorization>,
        grant: bool,
        token: Option<String>,
        request_calls: AtomicUsize,
    }

    impl MockPush {
        fn new(status: PushAuthorization) -> Self {
            Self {
                status: Mutex::new(status),
                grant: true,
                token: None,
                request_calls: AtomicUsize::new(0),
            }
        }

        fn set_status(&self, status: PushAuthorization) {
            *self
                .status
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner) = status;
        }
    }

    #[async_trait]
    impl PushSystem for MockPush {
        async fn authorization_status(&self) -> PushAuthorization {
            *self
                .status
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        async fn request_permission(&self) -> Result<bool, CoreError> {
            self.request_calls.fetch_add(1, Ordering::SeqCst);
            self.set_status(if self.grant {
                PushAuthorization::Granted
            } else {
                PushAuthorization::Denied
            });
            Ok(self.grant)
        }

        async fn device_token(&self) -> Option<String> {
            self.token.clone()
        }

        fn take_pending_url(&self) -> Option<Url> {
            None
        }
    }

    fn gatekeeper_with(
        push: MockPush,
    ) -> (PermissionGatekeeper, Arc<MockPush>, tempfile::TempDir) {
        let push = Arc::new(push);
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchStore::with_dir(dir.path());
        let gatekeeper =
            PermissionGatekeeper::new(push.clone(), store, chrono::Duration::hours(72));
        (gatekeeper, push, dir)
    }

    #[tokio::test]
    async fn test_first_launch_shows_screen() {
        let (gatekeeper, _push, _dir) = gatekeeper_with(MockPush::new(PushAuthorization::NotDetermined));
        assert!(gatekeeper.should_show_permission_screen().await);
    }

    #[tokio::test]
    async fn test_resolved_status_closes_gate_persistently() {
        let (gatekeeper, push, _dir) = gatekeeper_with(MockPush::new(PushAuthorization::Granted));

        assert!(!gatekeeper.should_show_permission_screen().await);

        // Even if the platform later reports not-determined again, the
        // persisted gate keeps the screen suppressed
        push.set_status(PushAuthorization::NotDetermined);
        assert!(!gatekeeper.should_show_permission_screen().await);
    }

    #[tokio::test]
    async fn test_request_closes_gate_even_before_outcome() {
        let (gatekeeper, push, dir) = gatekeeper_with(MockPush::new(PushAuthorization::NotDetermined));

        assert!(gatekeeper.request_permission().await);
        assert_eq!(push.request_calls.load(Ordering::SeqCst), 1);

        // The persisted record marks the request independently of status
        let store = LaunchStore::with_dir(dir.path());
        let gate = store.load_push_gate().await;
        assert!(gate.has_requested_permission);
        assert!(!gatekeeper.should_show_permission_screen().await);
    }

    #[tokio::test]
    async fn test_skip_suppresses_within_cooldown() {
        let (gatekeeper, _push, _dir) = gatekeeper_with(MockPush::new(PushAuthorization::NotDetermined));

        gatekeeper.skip().await;
        assert!(!gatekeeper.should_show_permission_screen().await);
    }

    #[tokio::test]
    async fn test_expired_skip_shows_screen_again() {
        let (gatekeeper, _push, dir) = gatekeeper_with(MockPush::new(PushAuthorization::NotDetermined));

        let store = LaunchStore::with_dir(dir.path());
        let gate = PushGateState {
            has_requested_permission: false,
            last_skipped_at: Some(Utc::now() - chrono::Duration::hours(100)),
        };
        store.save_push_gate(&gate).await.unwrap();

        assert!(gatekeeper.should_show_permission_screen().await);
    }

    #[tokio::test]
    async fn test_push_token_prefers_live_and_caches_it() {
        let (gatekeeper, _push, dir) = gatekeeper_with(MockPush {
            token: Some("tok-live".to_string()),
            ..MockPush::new(PushAuthorization::NotDetermined)
        });

        assert_eq!(gatekeeper.push_token().await.as_deref(), Some("tok-live"));

        let store = LaunchStore::with_dir(dir.path());
        assert_eq!(store.load_push_token().await.as_deref(), Some("tok-live"));
    }

    #[tokio::test]
    async fn test_push_token_falls_back_to_cached() {
        let (gatekeeper, _push, dir) = gatekeeper_with(MockPush::new(PushAuthorization::NotDetermined));

        let store = LaunchStore::with_dir(dir.path());
        store.save_push_token("tok-cached").await.unwrap();

        assert_eq!(gatekeeper.push_token().await.as_deref(), Some("tok-cached"));
    }
}
