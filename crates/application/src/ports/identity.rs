//! Identity provider port.

use std::future::Future;
use std::pin::Pin;

use sims_domain::{AuthError, IdentityConfig, TokenSet};

/// Boxed future returned by provider operations.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthError>> + Send + 'a>>;

/// Client for an OpenID Connect provider.
///
/// The session drives it; implementations own the browser redirect, the
/// callback and the token endpoint calls.
pub trait IdentityProvider: Send + Sync {
    /// Runs the authorization-code flow.
    ///
    /// Returns `Ok(None)` when the flow finished without a token (the user
    /// closed the page or the provider sent no code).
    fn login<'a>(&'a self, config: &'a IdentityConfig) -> AuthFuture<'a, Option<TokenSet>>;

    /// Exchanges a refresh token for a new token set.
    fn refresh<'a>(
        &'a self,
        config: &'a IdentityConfig,
        refresh_token: &'a str,
    ) -> AuthFuture<'a, TokenSet>;

    /// Starts the provider's end-session flow.
    fn logout<'a>(
        &'a self,
        config: &'a IdentityConfig,
        id_token: Option<&'a str>,
        redirect_uri: &'a str,
    ) -> AuthFuture<'a, ()>;
}
