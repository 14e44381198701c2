//! Typed access to the persisted launch records.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use launchgate_core::{ConversionResult, Mode, PushGateState, StoredRemoteConfig};

use crate::error::StoreError;
use crate::persistence;

/// Record file names under the store directory.
const MODE_FILE: &str = "mode.json";
const REMOTE_CONFIG_FILE: &str = "remote_config.json";
const CONVERSION_FILE: &str = "conversion.json";
const PUSH_GATE_FILE: &str = "push_gate.json";
const PUSH_TOKEN_FILE: &str = "push_token.json";
const ONBOARDING_FILE: &str = "onboarding.json";

const RECORD_FILES: [&str; 6] = [
    MODE_FILE,
    REMOTE_CONFIG_FILE,
    CONVERSION_FILE,
    PUSH_GATE_FILE,
    PUSH_TOKEN_FILE,
    ONBOARDING_FILE,
];

/// Typed store over the persisted launch records, one JSON file per record.
///
/// Loads are total: a missing or damaged record degrades to its default (or
/// `None`) with a log line, never an error, so persistence problems can
/// never block a launch. Writers are single per record (the orchestrator
/// commits the mode, the config service writes the remote config), so no
/// cross-process locking is needed.
#[derive(Debug, Clone)]
pub struct LaunchStore {
    dir: PathBuf,
}

impl LaunchStore {
    /// Creates a store rooted at the default per-user directory.
    pub fn new() -> Self {
        Self::with_dir(persistence::default_store_dir())
    }

    /// Creates a store rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    // ========================================================================
    // Mode
    // ========================================================================

    /// Loads the committed experience mode, defaulting to `Undetermined`.
    pub async fn load_mode(&self) -> Mode {
        persistence::load_json_or_default(&self.path(MODE_FILE)).await
    }

    /// Commits the experience mode.
    pub async fn save_mode(&self, mode: Mode) -> Result<(), StoreError> {
        debug!(mode = %mode, "Committing mode");
        persistence::save_json(&self.path(MODE_FILE), &mode).await
    }

    // ========================================================================
    // Remote config
    // ========================================================================

    /// Loads the last successfully fetched remote config.
    pub async fn load_remote_config(&self) -> Option<StoredRemoteConfig> {
        persistence::load_json_optional(&self.path(REMOTE_CONFIG_FILE)).await
    }

    /// Overwrites the cached remote config.
    pub async fn save_remote_config(&self, config: &StoredRemoteConfig) -> Result<(), StoreError> {
        persistence::save_json(&self.path(REMOTE_CONFIG_FILE), config).await
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Loads the last cached conversion result.
    pub async fn load_conversion(&self) -> Option<ConversionResult> {
        persistence::load_json_optional(&self.path(CONVERSION_FILE)).await
    }

    /// Overwrites the cached conversion result.
    pub async fn save_conversion(&self, result: &ConversionResult) -> Result<(), StoreError> {
        persistence::save_json(&self.path(CONVERSION_FILE), result).await
    }

    // ========================================================================
    // Push gate
    // ========================================================================

    /// Loads the push prompt-gating state.
    pub async fn load_push_gate(&self) -> PushGateState {
        persistence::load_json_or_default(&self.path(PUSH_GATE_FILE)).await
    }

    /// Overwrites the push prompt-gating state.
    pub async fn save_push_gate(&self, gate: &PushGateState) -> Result<(), StoreError> {
        persistence::save_json(&self.path(PUSH_GATE_FILE), gate).await
    }

    // ========================================================================
    // Push token
    // ========================================================================

    /// Loads the cached device push token.
    pub async fn load_push_token(&self) -> Option<String> {
        persistence::load_json_optional(&self.path(PUSH_TOKEN_FILE)).await
    }

    /// Caches the device push token.
    pub async fn save_push_token(&self, token: &str) -> Result<(), StoreError> {
        persistence::save_json(&self.path(PUSH_TOKEN_FILE), &token).await
    }

    // ========================================================================
    // Onboarding
    // ========================================================================

    /// Whether the unrelated onboarding flow was completed.
    pub async fn has_completed_onboarding(&self) -> bool {
        persistence::load_json_or_default(&self.path(ONBOARDING_FILE)).await
    }

    /// Records onboarding completion.
    pub async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StoreError> {
        persistence::save_json(&self.path(ONBOARDING_FILE), &completed).await
    }

    // ========================================================================
    // Reset
    // ========================================================================

    /// The record files currently present on disk, by file name.
    pub async fn existing_records(&self) -> Vec<String> {
        let mut present = Vec::new();
        for file in RECORD_FILES {
            if tokio::fs::try_exists(self.path(file)).await.unwrap_or(false) {
                present.push(file.to_string());
            }
        }
        present
    }

    /// Removes every record file (the explicit reset that allows Mode to be
    /// re-evaluated).
    pub async fn reset(&self) -> Result<(), StoreError> {
        for file in RECORD_FILES {
            let path = self.path(file);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "Removed record"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove record");
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }
}

impl Default for LaunchStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
