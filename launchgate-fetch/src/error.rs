//! Decision fetch error types.

use thiserror::Error;

/// Errors from the config decision request path.
///
/// Every variant is recovered locally by the engine (native fallback,
/// cached config, or the no-connectivity state); none escapes to the
/// presentation layer as a raw error.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The configured endpoint is not a usable HTTP(S) URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server answered but declined to provide an experience.
    #[error("Server rejected decision: {0}")]
    ServerRejected(String),

    /// The response arrived but could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl DecisionError {
    /// Returns true for failures of the network path itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Maps a reqwest error onto the decision taxonomy.
    ///
    /// Body decode failures count as malformed responses; everything else
    /// (connect, timeout, redirect loops) is a transport failure.
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
