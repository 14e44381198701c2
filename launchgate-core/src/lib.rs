// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchgate Core
//!
//! Core types, models, and collaborator ports for the Launchgate engine.
//!
//! This crate provides the foundational abstractions used across all other
//! Launchgate crates, including:
//!
//! - Domain models (mode, launch state, attribution, remote config)
//! - Error types
//! - Port traits for the platform collaborators the engine drives
//!
//! ## Key Types
//!
//! ### Decision Types
//! - [`Mode`] - The persisted web/native decision
//! - [`LaunchState`] - The state published to the presentation layer
//! - [`RemoteConfig`] / [`StoredRemoteConfig`] - Fetched experience config
//!
//! ### Attribution Types
//! - [`ConversionResult`] - Raw conversion payload with typed accessors
//! - [`Classification`] - Organic/non-organic install classification
//! - [`DeepLinkContext`] - Deferred or direct deep-link payload
//! - [`TrackingConsent`] - Resolution of the tracking-consent prompt
//!
//! ### Push Types
//! - [`PushAuthorization`] - System-level permission status
//! - [`PushGateState`] - Persisted prompt-gating state
//!
//! ### Ports
//! - [`Connectivity`] - Network reachability surface
//! - [`AttributionSdk`] - Attribution SDK surface
//! - [`PushSystem`] - Push subsystem surface

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Identity
    AppIdentity,
    // Attribution
    Classification,
    ConversionResult,
    DeepLinkContext,
    // Decision
    LaunchState,
    Mode,
    // Push
    PushAuthorization,
    PushGateState,
    // Remote config
    RemoteConfig,
    StoredRemoteConfig,
};

// Re-export traits and their event types
pub use traits::{AttributionEvent, AttributionSdk, Connectivity, PushSystem, TrackingConsent};
