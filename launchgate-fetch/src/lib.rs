// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchgate Fetch
//!
//! HTTP plumbing for the Launchgate engine.
//!
//! This crate carries everything that touches the network:
//!
//! ## Decision Requests
//!
//! - [`decision::DecisionRequest`] - Merged request body (conversion
//!   payload, deep-link values, client identifiers)
//! - [`decision::DecisionResponse`] - Raw response with validation into a
//!   usable [`launchgate_core::RemoteConfig`]
//! - [`decision::ConfigFetcher`] - Transport port the engine drives
//! - [`decision::DecisionClient`] - HTTP implementation against a fixed
//!   endpoint
//!
//! ## Connectivity
//!
//! - [`probe::Probe`] - One availability check against a URL
//! - [`probe::ProbeConnectivity`] - Probe-backed
//!   [`launchgate_core::Connectivity`] implementation
//!
//! ## Example
//!
//! ```ignore
//! use launchgate_fetch::{DecisionClient, DecisionContext, DecisionRequest};
//!
//! let client = DecisionClient::new("https://config.example.com/v2/decision")?;
//! let request = DecisionRequest::build(&DecisionContext::default(), &identity);
//! let response = client.fetch_decision(&request).await?;
//! let config = response.into_config()?;
//! ```

// Core modules
pub mod client;
pub mod decision;
pub mod error;
pub mod probe;

// Re-export key types at crate root
pub use client::HttpClient;
pub use decision::{
    ConfigFetcher, DecisionClient, DecisionContext, DecisionRequest, DecisionResponse,
};
pub use error::DecisionError;
pub use probe::{Probe, ProbeConnectivity, ProbeResult, run_probes};
