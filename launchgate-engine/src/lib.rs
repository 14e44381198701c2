//! # Launchgate Engine
//!
//! The launch orchestration engine. Wires the collaborator ports into the
//! state machine that decides, for every app launch, whether to present
//! the remote web experience or the native experience.
//!
//! ## Components
//!
//! - [`Orchestrator`]: entry protocol, state publication, observation
//! - [`AttributionCollector`]: SDK callbacks and organic reclassification
//! - [`PermissionGatekeeper`]: push pre-permission gating
//! - [`ConfigService`]: decision requests and the cached config fallback
//! - [`SharedReachability`]: in-process connectivity signal
//!
//! ## Simulation
//!
//! The [`sim`] module provides scripted implementations of every port, so
//! full launch sequences can run without a device or network.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod attribution;
pub mod config_service;
pub mod orchestrator;
pub mod permission;
pub mod reachability;
pub mod settings;
pub mod sim;

pub use attribution::AttributionCollector;
pub use config_service::{ConfigService, ConfigSource};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use permission::PermissionGatekeeper;
pub use reachability::{ReachabilityPublisher, SharedReachability};
pub use settings::EngineSettings;
