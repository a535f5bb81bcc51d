//! Session lifecycle states

use serde::{Deserialize, Serialize};

/// Where the login session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No token obtained yet, or logged out.
    #[default]
    Unauthenticated,
    /// A token was obtained and is believed valid.
    Authenticated,
    /// The token is known to be expired.
    Expired,
    /// Login failed for this run; terminal.
    Failed,
}

impl SessionState {
    /// Returns true when a token is held, even if expired.
    #[must_use]
    pub const fn has_token(self) -> bool {
        matches!(self, Self::Authenticated | Self::Expired)
    }

    /// Returns true once login failed for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Not authenticated",
            Self::Authenticated => "Authenticated",
            Self::Expired => "Token expired",
            Self::Failed => "Authentication failed",
        }
    }
}
