//! Screen state types for UI binding.
//!
//! Every screen operation walks the same state machine:
//! `Idle -> Loading -> {Success | Error} -> Idle`.

use std::time::{Duration, Instant};

use crate::result::{FailureStatus, RequestResult};

/// Represents the current state of a screen operation.
///
/// This enum enables the UI to show appropriate feedback:
/// - `Idle`: Ready, controls enabled
/// - `Loading`: Call in flight, show spinner
/// - `Success`: Call completed, show the message and refreshed data
/// - `Error`: Call failed, show error message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenState {
    /// Nothing happening.
    #[default]
    Idle,

    /// A call is in progress.
    Loading {
        /// When the call started (for elapsed time display).
        started_at: Instant,
    },

    /// The last call succeeded.
    Success {
        /// Message for the status line.
        message: String,
    },

    /// The last call failed.
    Error {
        /// Where the failure came from, when a call was attempted.
        status: Option<FailureStatus>,
        /// Human-readable error message.
        message: String,
    },
}

impl ScreenState {
    /// Creates a new Loading state with the current timestamp.
    #[must_use]
    pub fn loading() -> Self {
        Self::Loading {
            started_at: Instant::now(),
        }
    }

    /// Creates a Success state.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    /// Creates an Error state not tied to a call (validation, cancelled confirm).
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an Error state from a failed call, prefixing the action name.
    #[must_use]
    pub fn failed(action: &str, result: &RequestResult) -> Self {
        match result {
            RequestResult::Failure { status, message } => Self::Error {
                status: Some(*status),
                message: format!("{action} failed: {message}"),
            },
            RequestResult::Success { .. } => Self::error(format!("{action} failed")),
        }
    }

    /// Returns true if the state is Idle.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a call is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Returns true if the last call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if the last call failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns the status line message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message } | Self::Error { message, .. } => Some(message),
            Self::Idle | Self::Loading { .. } => None,
        }
    }

    /// Returns the elapsed time if loading.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Loading { started_at } => Some(started_at.elapsed()),
            _ => None,
        }
    }
}
