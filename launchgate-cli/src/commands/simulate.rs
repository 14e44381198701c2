//! Simulate command - run a scripted launch sequence end to end.
//!
//! Runs the real orchestration engine against scripted collaborators in a
//! throwaway record store, printing every launch state it passes through.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio::sync::watch;
use tracing::info;
use url::Url;

use launchgate_core::{
    AppIdentity, LaunchState, Mode, PushAuthorization, PushGateState, RemoteConfig,
    StoredRemoteConfig,
};
use launchgate_engine::sim::{
    AttributionScript, ScriptedAttribution, ScriptedConfigFetcher, ScriptedDecision,
    ScriptedPushSystem, non_organic_conversion, organic_conversion,
};
use launchgate_engine::{EngineSettings, Orchestrator, reachability};
use launchgate_store::LaunchStore;

use crate::output::{JsonFormatter, SimulationOutput, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the simulate command.
#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario to run (first-launch, organic, no-attribution, rejected,
    /// offline, resume, cached-resume, offline-resume, notification).
    #[arg(long, short, default_value = "first-launch")]
    pub scenario: String,

    /// How to resolve the permission screen when it appears (accept, skip).
    #[arg(long, default_value = "accept")]
    pub permission: String,

    /// Experience URL the scripted decision endpoint accepts with.
    #[arg(long, default_value = "https://web.example.com/app")]
    pub url: String,

    /// Milliseconds before scripted connectivity comes back.
    #[arg(long, default_value = "150")]
    pub restore_after_ms: u64,
}

// ============================================================================
// Scenarios
// ============================================================================

/// The launch situations the simulator can play back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    /// Fresh install, non-organic conversion, accepting endpoint.
    FirstLaunch,
    /// Fresh install with an organic conversion that re-verifies.
    Organic,
    /// Fresh install where conversion data never arrives.
    NoAttribution,
    /// Fresh install the endpoint declines.
    Rejected,
    /// Fresh install without connectivity.
    Offline,
    /// Later launch in web mode with a healthy endpoint.
    Resume,
    /// Later launch in web mode with the endpoint down but a cached config.
    CachedResume,
    /// Later launch in web mode that starts offline and recovers.
    OfflineResume,
    /// Later launch carrying a notification-delivered URL.
    Notification,
}

impl Scenario {
    fn name(self) -> &'static str {
        match self {
            Self::FirstLaunch => "first-launch",
            Self::Organic => "organic",
            Self::NoAttribution => "no-attribution",
            Self::Rejected => "rejected",
            Self::Offline => "offline",
            Self::Resume => "resume",
            Self::CachedResume => "cached-resume",
            Self::OfflineResume => "offline-resume",
            Self::Notification => "notification",
        }
    }

    fn starts_in_web_mode(self) -> bool {
        matches!(
            self,
            Self::Resume | Self::CachedResume | Self::OfflineResume | Self::Notification
        )
    }
}

/// How the simulated user resolves the permission screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermissionChoice {
    Accept,
    Skip,
}

fn parse_scenario(s: &str) -> Result<Scenario> {
    match s.to_lowercase().as_str() {
        "first-launch" | "first" => Ok(Scenario::FirstLaunch),
        "organic" => Ok(Scenario::Organic),
        "no-attribution" | "silent" => Ok(Scenario::NoAttribution),
        "rejected" => Ok(Scenario::Rejected),
        "offline" => Ok(Scenario::Offline),
        "resume" => Ok(Scenario::Resume),
        "cached-resume" | "cached" => Ok(Scenario::CachedResume),
        "offline-resume" => Ok(Scenario::OfflineResume),
        "notification" | "push" => Ok(Scenario::Notification),
        _ => anyhow::bail!(
            "Unknown scenario: {}. Valid options: first-launch, organic, no-attribution, \
             rejected, offline, resume, cached-resume, offline-resume, notification",
            s
        ),
    }
}

fn parse_permission(s: &str) -> Result<PermissionChoice> {
    match s.to_lowercase().as_str() {
        "accept" | "grant" => Ok(PermissionChoice::Accept),
        "skip" => Ok(PermissionChoice::Skip),
        _ => anyhow::bail!("Unknown permission choice: {}. Valid options: accept, skip", s),
    }
}

// ============================================================================
// Command
// ============================================================================

/// Runs the simulate command.
pub async fn run(args: &SimulateArgs, cli: &Cli) -> Result<()> {
    let scenario = parse_scenario(&args.scenario)?;
    let permission = parse_permission(&args.permission)?;
    let restore_after = Duration::from_millis(args.restore_after_ms);

    info!(scenario = scenario.name(), "Running simulation");

    let outcome = run_scenario(scenario, permission, &args.url, restore_after).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_simulation(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&outcome)?);
        }
    }

    if outcome.final_state == LaunchState::NoConnectivity.to_string() {
        std::process::exit(ExitCode::Offline as i32);
    }

    Ok(())
}

/// Plays one scenario through the engine and reports what happened.
async fn run_scenario(
    scenario: Scenario,
    permission: PermissionChoice,
    url: &str,
    restore_after: Duration,
) -> Result<SimulationOutput> {
    // Simulations never touch the real records
    let dir = tempfile::tempdir()?;
    let store = LaunchStore::with_dir(dir.path());
    seed_records(scenario, &store).await?;

    let (publisher, connectivity) =
        reachability::channel(!matches!(scenario, Scenario::Offline | Scenario::OfflineResume));

    let sdk = Arc::new(ScriptedAttribution::new(attribution_script(scenario)));
    let push = Arc::new(push_system(scenario)?);
    let fetcher = Arc::new(decision_endpoint(scenario, url));

    let orchestrator = Orchestrator::builder()
        .with_connectivity(Arc::new(connectivity))
        .with_attribution_sdk(sdk)
        .with_push_system(push)
        .with_config_fetcher(fetcher.clone())
        .with_identity(AppIdentity::new(
            "com.example.app",
            "ios",
            "id1234567890",
            "en_US",
        ))
        .with_store(store.clone())
        .with_settings(simulation_settings())
        .build()?;

    let transitions = Arc::new(Mutex::new(Vec::new()));
    let recorder = spawn_recorder(orchestrator.subscribe(), transitions.clone());

    orchestrator.initialize().await;

    match scenario {
        Scenario::Offline => {
            // First launch has no automatic recovery; model the user
            // turning the network back on and tapping retry
            tokio::time::sleep(restore_after).await;
            publisher.set_connected(true);
            orchestrator.retry().await;
        }
        Scenario::OfflineResume => {
            tokio::time::sleep(restore_after).await;
            publisher.set_connected(true);
            wait_until_recovered(&orchestrator).await;
        }
        _ => {}
    }

    if matches!(
        orchestrator.current_state(),
        LaunchState::AwaitingPushPermission
    ) {
        match permission {
            PermissionChoice::Accept => {
                orchestrator.on_permission_accepted().await;
            }
            PermissionChoice::Skip => {
                orchestrator.on_permission_skipped().await;
            }
        }
    }

    // Give the recorder a beat to drain the last transition
    tokio::time::sleep(Duration::from_millis(50)).await;
    recorder.abort();

    let final_state = orchestrator.current_state();
    let transitions = transitions
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(SimulationOutput {
        scenario: scenario.name().to_string(),
        transitions,
        final_state: final_state.to_string(),
        url: final_state.web_url().map(Url::to_string),
        mode: store.load_mode().await.label().to_string(),
        decision_requests: fetcher.calls(),
    })
}

// ============================================================================
// Scenario Wiring
// ============================================================================

async fn seed_records(scenario: Scenario, store: &LaunchStore) -> Result<()> {
    if scenario.starts_in_web_mode() {
        store.save_mode(Mode::Web).await?;
        // A real first launch already drove the permission prompt
        store
            .save_push_gate(&PushGateState {
                has_requested_permission: true,
                last_skipped_at: None,
            })
            .await?;
    }

    if scenario == Scenario::CachedResume {
        let stored = StoredRemoteConfig::new(
            RemoteConfig::new(
                Url::parse("https://cached.example.com/app")?,
                4_102_444_800,
            ),
            chrono::Utc::now(),
        );
        store.save_remote_config(&stored).await?;
    }

    Ok(())
}

fn attribution_script(scenario: Scenario) -> AttributionScript {
    match scenario {
        Scenario::FirstLaunch | Scenario::Rejected | Scenario::Offline => {
            AttributionScript::delivering(non_organic_conversion())
        }
        Scenario::Organic => AttributionScript {
            conversion: Some(organic_conversion()),
            reverify: Some(non_organic_conversion()),
            ..AttributionScript::default()
        },
        _ => AttributionScript::silent(),
    }
}

fn push_system(scenario: Scenario) -> Result<ScriptedPushSystem> {
    let push = ScriptedPushSystem::new().with_token("sim-device-token");
    Ok(match scenario {
        Scenario::Notification => push
            .with_status(PushAuthorization::Granted)
            .with_pending_url(Url::parse("https://push.example.com/offer")?),
        s if s.starts_in_web_mode() => push.with_status(PushAuthorization::Granted),
        _ => push,
    })
}

fn decision_endpoint(scenario: Scenario, url: &str) -> ScriptedConfigFetcher {
    match scenario {
        Scenario::Rejected => ScriptedConfigFetcher::new()
            .with_decision(ScriptedDecision::Reject("unsupported region".to_string())),
        Scenario::CachedResume => ScriptedConfigFetcher::new()
            .with_decision(ScriptedDecision::Transport("connection refused".to_string())),
        _ => ScriptedConfigFetcher::new().with_decision(ScriptedDecision::accept(url)),
    }
}

fn simulation_settings() -> EngineSettings {
    EngineSettings::default()
        .with_conversion_timeout(Duration::from_millis(500))
        .with_conversion_poll_interval(Duration::from_millis(20))
        .with_reverify_delay(Duration::from_millis(50))
        .with_observe_interval(Duration::from_millis(25))
}

fn spawn_recorder(
    mut rx: watch::Receiver<LaunchState>,
    transitions: Arc<Mutex<Vec<LaunchState>>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let state = rx.borrow_and_update().clone();
            {
                let mut log = transitions
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                if log.last() != Some(&state) {
                    log.push(state);
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

async fn wait_until_recovered(orchestrator: &Arc<Orchestrator>) {
    let mut rx = orchestrator.subscribe();
    let _ = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let state = rx.borrow_and_update().clone();
            if state.is_settled() && state != LaunchState::NoConnectivity {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario_names() {
        assert_eq!(parse_scenario("first-launch").unwrap(), Scenario::FirstLaunch);
        assert_eq!(parse_scenario("first").unwrap(), Scenario::FirstLaunch);
        assert_eq!(parse_scenario("ORGANIC").unwrap(), Scenario::Organic);
        assert_eq!(parse_scenario("cached").unwrap(), Scenario::CachedResume);
        assert_eq!(parse_scenario("push").unwrap(), Scenario::Notification);
    }

    #[test]
    fn test_parse_scenario_invalid() {
        assert!(parse_scenario("warp-speed").is_err());
    }

    #[test]
    fn test_parse_permission() {
        assert_eq!(parse_permission("accept").unwrap(), PermissionChoice::Accept);
        assert_eq!(parse_permission("skip").unwrap(), PermissionChoice::Skip);
        assert!(parse_permission("later").is_err());
    }

    #[tokio::test]
    async fn test_first_launch_scenario_settles_web() {
        let outcome = run_scenario(
            Scenario::FirstLaunch,
            PermissionChoice::Accept,
            "https://web.example.com/app",
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        assert_eq!(outcome.mode, "web");
        assert_eq!(outcome.url.as_deref(), Some("https://web.example.com/app"));
        assert!(outcome.transitions.len() >= 2);
    }

    #[tokio::test]
    async fn test_no_attribution_scenario_settles_native() {
        let outcome = run_scenario(
            Scenario::NoAttribution,
            PermissionChoice::Accept,
            "https://web.example.com/app",
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        assert_eq!(outcome.mode, "native");
        assert_eq!(outcome.final_state, "native");
        assert_eq!(outcome.decision_requests, 0);
    }

    #[tokio::test]
    async fn test_cached_resume_scenario_serves_cache() {
        let outcome = run_scenario(
            Scenario::CachedResume,
            PermissionChoice::Accept,
            "https://web.example.com/app",
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        assert_eq!(outcome.url.as_deref(), Some("https://cached.example.com/app"));
    }

    #[tokio::test]
    async fn test_offline_resume_scenario_recovers() {
        let outcome = run_scenario(
            Scenario::OfflineResume,
            PermissionChoice::Accept,
            "https://web.example.com/app",
            Duration::from_millis(40),
        )
        .await
        .unwrap();

        assert_eq!(outcome.url.as_deref(), Some("https://web.example.com/app"));
        // The halt was visible before recovery
        assert!(
            outcome
                .transitions
                .iter()
                .any(|t| t == "no_connectivity")
        );
    }
}
