// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchgate Store
//!
//! Persisted launch records for the Launchgate engine.
//!
//! The engine persists a handful of small records between launches: the
//! committed experience mode, the last fetched remote config, the last
//! conversion payload, and push-gating state. Each record is one JSON file
//! written atomically with owner-only permissions.
//!
//! ## Key Types
//!
//! - [`LaunchStore`] - Typed load/save per record, plus reset
//! - [`StoreError`] - IO and serialization failures
//!
//! Loads never fail: a missing or damaged record degrades to its default so
//! persistence problems cannot block a launch.

pub mod error;
pub mod launch_store;
pub mod persistence;

pub use error::StoreError;
pub use launch_store::LaunchStore;
pub use persistence::{default_store_dir, ensure_dir, load_json, load_json_optional, save_json};
