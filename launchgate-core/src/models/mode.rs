//! The persisted experience decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The experience decision committed for this install.
///
/// `Undetermined` only exists before the first successful acquisition.
/// Once `Web` or `Native` is committed the value survives restarts and is
/// re-evaluated only after an explicit reset of the persisted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No decision has been made yet (first launch).
    #[default]
    Undetermined,
    /// The remote web experience was selected.
    Web,
    /// The native experience was selected.
    Native,
}

impl Mode {
    /// Returns true once a decision has been committed.
    pub fn is_determined(&self) -> bool {
        !matches!(self, Self::Undetermined)
    }

    /// Returns true if the web experience was selected.
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Web)
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undetermined => "undetermined",
            Self::Web => "web",
            Self::Native => "native",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
