//! Launch orchestration.
//!
//! The orchestrator is the composition root: it owns the persisted mode,
//! drives first-launch acquisition and web-mode resume, publishes every
//! [`LaunchState`] transition over a watch channel, and manages the
//! connectivity observation task that re-enters resume when a web-mode
//! launch was halted offline.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use launchgate_core::{
    AppIdentity, AttributionSdk, Connectivity, CoreError, LaunchState, Mode, PushSystem,
};
use launchgate_fetch::{ConfigFetcher, DecisionContext};
use launchgate_store::LaunchStore;

use crate::attribution::AttributionCollector;
use crate::config_service::ConfigService;
use crate::permission::PermissionGatekeeper;
use crate::settings::EngineSettings;

// ============================================================================
// Observation Task State
// ============================================================================

/// Bookkeeping for the single connectivity observation task.
///
/// The generation counter fences stale tasks: cancellation and restart both
/// bump it, and a task only acts while its own generation is current.
#[derive(Debug, Default)]
struct Observer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives the launch sequence and publishes its state.
///
/// Constructed through [`OrchestratorBuilder`] and always used behind an
/// [`Arc`], since the observation task re-enters the resume flow.
pub struct Orchestrator {
    connectivity: Arc<dyn Connectivity>,
    attribution: Arc<AttributionCollector>,
    gatekeeper: Arc<PermissionGatekeeper>,
    config: Arc<ConfigService>,
    store: LaunchStore,
    settings: EngineSettings,
    state: watch::Sender<LaunchState>,
    observer: Mutex<Observer>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Starts assembling an orchestrator.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    // ========================================================================
    // State Publication
    // ========================================================================

    /// Subscribes to launch state transitions.
    ///
    /// The receiver immediately holds the current state; UI layers render
    /// every change.
    pub fn subscribe(&self) -> watch::Receiver<LaunchState> {
        self.state.subscribe()
    }

    /// The most recently published state.
    pub fn current_state(&self) -> LaunchState {
        self.state.borrow().clone()
    }

    /// The attribution collector, for consumers that inspect conversion
    /// data after launch.
    pub fn attribution(&self) -> &Arc<AttributionCollector> {
        &self.attribution
    }

    fn emit(&self, state: LaunchState) {
        info!(state = %state, "Launch state");
        self.state.send_replace(state);
    }

    // ========================================================================
    // Entry Points
    // ========================================================================

    /// Runs the entry protocol for this launch.
    ///
    /// Dispatches on the persisted mode: undetermined runs first-launch
    /// acquisition, native presents immediately, web resumes the web
    /// experience.
    pub async fn initialize(self: &Arc<Self>) {
        let mode = self.store.load_mode().await;
        info!(mode = %mode, "Initializing launch");
        match mode {
            Mode::Undetermined => self.first_launch_acquisition().await,
            Mode::Native => self.emit(LaunchState::Native),
            Mode::Web => self.resume_web().await,
        }
    }

    /// Re-runs the entry protocol after a halt.
    ///
    /// The explicit recovery surface for `NoConnectivity`: cancels any
    /// observation task and starts over from the persisted mode.
    pub async fn retry(self: &Arc<Self>) {
        info!("Retry requested");
        self.cancel_observation().await;
        self.initialize().await;
    }

    // ========================================================================
    // First-Launch Acquisition
    // ========================================================================

    async fn first_launch_acquisition(self: &Arc<Self>) {
        self.emit(LaunchState::loading("checking connectivity"));
        if !self.connectivity.is_connected() {
            // First launch has no mode and no cache to fall back on;
            // halt and wait for an explicit retry.
            warn!("Offline on first launch");
            self.emit(LaunchState::NoConnectivity);
            return;
        }

        self.emit(LaunchState::loading("resolving tracking consent"));
        let consent = self.attribution.request_tracking_authorization().await;
        debug!(consent = %consent, "Consent resolved, proceeding");

        self.emit(LaunchState::loading("starting attribution"));
        if let Err(e) = self.attribution.start().await {
            warn!(error = %e, "Attribution failed to start");
            self.settle_native().await;
            return;
        }

        self.emit(LaunchState::loading("waiting for attribution data"));
        let received = self
            .attribution
            .wait_for_conversion(
                self.settings.conversion_timeout,
                self.settings.conversion_poll_interval,
            )
            .await;
        if !received {
            warn!(
                timeout = ?self.settings.conversion_timeout,
                "Conversion data did not arrive in time"
            );
            self.settle_native().await;
            return;
        }

        self.emit(LaunchState::loading("requesting experience decision"));
        let context = self.decision_context().await;
        match self.config.request_decision(context).await {
            Ok(config) => {
                // Mode commits before the state is visible, so a crash
                // between the two resumes as web rather than repeating
                // acquisition.
                self.commit_mode(Mode::Web).await;
                if self.gatekeeper.should_show_permission_screen().await {
                    self.emit(LaunchState::AwaitingPushPermission);
                } else {
                    self.emit(LaunchState::web(config.url));
                }
            }
            Err(e) => {
                warn!(error = %e, "No experience decision, settling native");
                self.settle_native().await;
            }
        }
    }

    async fn settle_native(&self) {
        self.commit_mode(Mode::Native).await;
        self.emit(LaunchState::Native);
    }

    async fn commit_mode(&self, mode: Mode) {
        if let Err(e) = self.store.save_mode(mode).await {
            warn!(error = %e, mode = %mode, "Failed to persist mode");
        }
    }

    async fn decision_context(&self) -> DecisionContext {
        DecisionContext {
            conversion: self.attribution.conversion().await,
            deep_link: self.attribution.deep_link().await,
            push_token: self.gatekeeper.push_token().await,
        }
    }

    // ========================================================================
    // Web-Mode Resume
    // ========================================================================

    async fn resume_web(self: &Arc<Self>) {
        self.emit(LaunchState::loading("resuming web experience"));

        if !self.connectivity.is_connected() {
            warn!("Offline on resume, observing connectivity");
            self.emit(LaunchState::NoConnectivity);
            self.start_observation().await;
            return;
        }

        self.cancel_observation().await;

        // Attribution keeps reporting across launches, but a failure here
        // never blocks an already-committed web experience.
        self.attribution.request_tracking_authorization().await;
        if let Err(e) = self.attribution.start().await {
            warn!(error = %e, "Attribution unavailable on resume");
        }

        if let Some(url) = self.gatekeeper.take_pending_url() {
            info!(url = %url, "Presenting notification URL");
            self.emit(LaunchState::web(url));
            return;
        }

        if self.gatekeeper.should_show_permission_screen().await {
            self.emit(LaunchState::AwaitingPushPermission);
            return;
        }

        self.present_fresh_or_cached().await;
    }

    async fn present_fresh_or_cached(self: &Arc<Self>) {
        let context = self.decision_context().await;
        match self.config.fresh_or_cached(context).await {
            Some((url, source)) => {
                debug!(source = ?source, "Web experience resolved");
                self.emit(LaunchState::web(url));
            }
            None => {
                warn!("Neither fresh nor cached configuration available");
                self.emit(LaunchState::NoConnectivity);
                self.start_observation().await;
            }
        }
    }

    // ========================================================================
    // Permission Screen Actions
    // ========================================================================

    /// Resolves the permission screen by driving the system prompt.
    ///
    /// Only meaningful while the published state is
    /// `AwaitingPushPermission`; out-of-state calls are ignored. Returns
    /// the state the launch settled on.
    pub async fn on_permission_accepted(self: &Arc<Self>) -> LaunchState {
        if !matches!(self.current_state(), LaunchState::AwaitingPushPermission) {
            warn!("Permission acceptance outside the permission screen");
            return self.current_state();
        }

        let granted = self.gatekeeper.request_permission().await;
        debug!(granted, "Permission prompt completed");
        self.emit(LaunchState::loading("requesting experience decision"));
        self.present_fresh_or_cached().await;
        self.current_state()
    }

    /// Resolves the permission screen by skipping it.
    ///
    /// Records the skip for the cooldown window, then proceeds to the web
    /// experience exactly like acceptance. Returns the settled state.
    pub async fn on_permission_skipped(self: &Arc<Self>) -> LaunchState {
        if !matches!(self.current_state(), LaunchState::AwaitingPushPermission) {
            warn!("Permission skip outside the permission screen");
            return self.current_state();
        }

        self.gatekeeper.skip().await;
        self.emit(LaunchState::loading("requesting experience decision"));
        self.present_fresh_or_cached().await;
        self.current_state()
    }

    // ========================================================================
    // Notification Override
    // ========================================================================

    /// Presents a notification-delivered URL, overriding the current web
    /// experience.
    ///
    /// Only honored in web mode; the URL replaces whatever the decision
    /// endpoint chose for this launch without a new decision request.
    pub async fn on_notification_url(&self, url: Url) {
        let mode = self.store.load_mode().await;
        if mode != Mode::Web {
            warn!(mode = %mode, url = %url, "Ignoring notification URL outside web mode");
            return;
        }

        self.cancel_observation().await;
        info!(url = %url, "Notification URL overrides the experience");
        self.emit(LaunchState::web(url));
    }

    // ========================================================================
    // Connectivity Observation
    // ========================================================================

    async fn start_observation(self: &Arc<Self>) {
        let mut observer = self.observer.lock().await;
        observer.generation += 1;
        let generation = observer.generation;
        if let Some(handle) = observer.handle.take() {
            handle.abort();
        }

        let orchestrator = Arc::clone(self);
        let interval = self.settings.observe_interval;
        observer.handle = Some(tokio::spawn(async move {
            debug!(generation, "Observing connectivity");
            loop {
                tokio::time::sleep(interval).await;
                {
                    let observer = orchestrator.observer.lock().await;
                    if observer.generation != generation {
                        return;
                    }
                }
                if orchestrator.connectivity.is_connected() {
                    orchestrator.resume_if_current(generation).await;
                    return;
                }
            }
        }));
    }

    async fn cancel_observation(&self) {
        let mut observer = self.observer.lock().await;
        if let Some(handle) = observer.handle.take() {
            observer.generation += 1;
            handle.abort();
            debug!("Connectivity observation cancelled");
        }
    }

    /// Re-enters resume from the observation task once connectivity is
    /// back, provided nothing superseded the observation meanwhile.
    ///
    /// Boxed rather than `async fn`: the future is recursive (it re-enters
    /// `resume_web`, which can restart observation), so it must be boxed.
    fn resume_if_current(
        self: &Arc<Self>,
        generation: u64,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            {
                let mut observer = self.observer.lock().await;
                if observer.generation != generation {
                    debug!(generation, "Observation superseded, not resuming");
                    return;
                }
                // Detach before resuming so the resume path never aborts the
                // task it is running on.
                observer.handle = None;
                observer.generation += 1;
            }

            if !matches!(self.current_state(), LaunchState::NoConnectivity) {
                debug!("State moved on, not resuming");
                return;
            }
            if self.store.load_mode().await != Mode::Web {
                debug!("Mode changed, not resuming");
                return;
            }

            info!("Connectivity restored, resuming web experience");
            self.resume_web().await;
        })
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles an [`Orchestrator`] from its collaborator ports.
///
/// The builder constructs the internal components, so timing knobs live in
/// one place: [`EngineSettings`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    connectivity: Option<Arc<dyn Connectivity>>,
    attribution_sdk: Option<Arc<dyn AttributionSdk>>,
    push_system: Option<Arc<dyn PushSystem>>,
    config_fetcher: Option<Arc<dyn ConfigFetcher>>,
    identity: Option<AppIdentity>,
    store: Option<LaunchStore>,
    settings: EngineSettings,
}

impl OrchestratorBuilder {
    /// Creates an empty builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connectivity monitor.
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Sets the attribution SDK.
    pub fn with_attribution_sdk(mut self, sdk: Arc<dyn AttributionSdk>) -> Self {
        self.attribution_sdk = Some(sdk);
        self
    }

    /// Sets the push notification system.
    pub fn with_push_system(mut self, push: Arc<dyn PushSystem>) -> Self {
        self.push_system = Some(push);
        self
    }

    /// Sets the decision fetcher.
    pub fn with_config_fetcher(mut self, fetcher: Arc<dyn ConfigFetcher>) -> Self {
        self.config_fetcher = Some(fetcher);
        self
    }

    /// Sets the app identity sent with every decision request.
    pub fn with_identity(mut self, identity: AppIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the record store.
    pub fn with_store(mut self, store: LaunchStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the engine timing settings.
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Other` naming the first missing collaborator.
    pub fn build(self) -> Result<Arc<Orchestrator>, CoreError> {
        let connectivity = self
            .connectivity
            .ok_or_else(|| missing("a connectivity monitor"))?;
        let sdk = self
            .attribution_sdk
            .ok_or_else(|| missing("an attribution SDK"))?;
        let push = self.push_system.ok_or_else(|| missing("a push system"))?;
        let fetcher = self
            .config_fetcher
            .ok_or_else(|| missing("a config fetcher"))?;
        let identity = self.identity.ok_or_else(|| missing("an app identity"))?;
        let store = self.store.ok_or_else(|| missing("a record store"))?;
        let settings = self.settings;

        let attribution = Arc::new(AttributionCollector::new(
            sdk,
            store.clone(),
            settings.reverify_delay,
        ));
        let gatekeeper = Arc::new(PermissionGatekeeper::new(
            push,
            store.clone(),
            settings.permission_cooldown,
        ));
        let config = Arc::new(ConfigService::new(fetcher, store.clone(), identity));

        let (state, _) = watch::channel(LaunchState::loading("initializing"));

        Ok(Arc::new(Orchestrator {
            connectivity,
            attribution,
            gatekeeper,
            config,
            store,
            settings,
            state,
            observer: Mutex::new(Observer::default()),
        }))
    }
}

fn missing(what: &str) -> CoreError {
    CoreError::Other(format!("launch orchestration requires {what}"))
}

// ============================================================================
// Tests
// ============================================================================
