//! Authentication errors

use thiserror::Error;

/// Errors raised while talking to the identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No token is held by the session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Token expired and no refresh token is available.
    #[error("token expired and no refresh token available")]
    TokenExpiredNoRefresh,

    /// Failed to refresh the token.
    #[error("failed to refresh token: {message}")]
    RefreshFailed {
        /// Error description.
        message: String,
    },

    /// The provider rejected the authorization.
    #[error("authorization failed: {message}")]
    AuthorizationFailed {
        /// Error description.
        message: String,
    },

    /// The identity configuration is unusable.
    #[error("invalid identity configuration: {message}")]
    InvalidConfiguration {
        /// Error description.
        message: String,
    },

    /// The redirect callback could not be received or was forged.
    #[error("callback error: {message}")]
    Callback {
        /// Error description.
        message: String,
    },

    /// The provider could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },

    /// The provider returned a token that cannot be decoded.
    #[error("invalid token: {message}")]
    InvalidToken {
        /// Error description.
        message: String,
    },
}
