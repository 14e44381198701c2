//! The launch state published to the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The state the orchestrator publishes over its watch channel.
///
/// States are replaced whole, never partially mutated; at any instant the
/// presentation layer sees exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LaunchState {
    /// Acquisition or resume is in progress.
    Loading {
        /// Progress description for diagnostics and splash surfaces.
        message: String,
    },
    /// No usable network path; a retry surface should be shown.
    NoConnectivity,
    /// Web mode is committed and the push pre-permission screen is due.
    AwaitingPushPermission,
    /// Present the remote web experience.
    Web {
        /// Fully resolved experience URL.
        url: Url,
    },
    /// Present the native experience.
    Native,
}

impl LaunchState {
    /// Creates a `Loading` state with a progress message.
    pub fn loading(message: impl Into<String>) -> Self {
        Self::Loading {
            message: message.into(),
        }
    }

    /// Creates a `Web` state for the given experience URL.
    pub fn web(url: Url) -> Self {
        Self::Web { url }
    }

    /// Returns true once the launch sequence has settled on a presentation.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Loading { .. })
    }

    /// The experience URL, when presenting the web experience.
    pub fn web_url(&self) -> Option<&Url> {
        match self {
            Self::Web { url } => Some(url),
            _ => None,
        }
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "loading",
            Self::NoConnectivity => "no_connectivity",
            Self::AwaitingPushPermission => "awaiting_push_permission",
            Self::Web { .. } => "web",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading { message } => write!(f, "loading ({message})"),
            Self::Web { url } => write!(f, "web ({url})"),
            _ => write!(f, "{}", self.label()),
        }
    }
}
