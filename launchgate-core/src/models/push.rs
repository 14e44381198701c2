//! Push permission types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// System-level push authorization status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushAuthorization {
    /// The user has not answered the system prompt yet.
    #[default]
    NotDetermined,
    /// Push notifications are allowed.
    Granted,
    /// Push notifications were refused.
    Denied,
}

impl PushAuthorization {
    /// Returns true once the system prompt has been answered either way.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::NotDetermined)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotDetermined => "not determined",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for PushAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Persisted state gating the push pre-permission screen.
///
/// The gate closes permanently once the system prompt has been driven or a
/// resolved status is observed; a skip only pauses prompting for the
/// configured cooldown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushGateState {
    /// Whether the system prompt was ever driven for this install.
    #[serde(default)]
    pub has_requested_permission: bool,
    /// When the user last dismissed the pre-permission screen.
    #[serde(default)]
    pub last_skipped_at: Option<DateTime<Utc>>,
}

impl PushGateState {
    /// Returns true while the last skip is still within `cooldown` at `now`.
    pub fn skip_within(&self, cooldown: Duration, now: DateTime<Utc>) -> bool {
        self.last_skipped_at.is_some_and(|at| now - at < cooldown)
    }
}
