//! Domain models for Launchgate.
//!
//! This module contains the data structures the launch engine decides with
//! and persists: the committed experience mode, the published launch state,
//! attribution payloads, the fetched remote config, and push-gating state.
//!
//! ## Submodules
//!
//! - [`mode`] - The persisted web/native decision
//! - [`state`] - The launch state published to the presentation layer
//! - [`conversion`] - Attribution payloads (ConversionResult, DeepLinkContext)
//! - [`remote_config`] - Fetched experience config and its persisted form
//! - [`push`] - Push authorization status and prompt-gating state
//! - [`identity`] - Fixed client identifiers sent with decision requests

mod conversion;
mod identity;
mod mode;
mod push;
mod remote_config;
mod state;

// Re-export everything at the models level
pub use conversion::{Classification, ConversionResult, DeepLinkContext};
pub use identity::AppIdentity;
pub use mode::Mode;
pub use push::{PushAuthorization, PushGateState};
pub use remote_config::{RemoteConfig, StoredRemoteConfig};
pub use state::LaunchState;

#[cfg(test)]
mod serde_tests;
