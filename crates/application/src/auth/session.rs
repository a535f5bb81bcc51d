//! Login session over an identity provider.
//!
//! `AuthSession` owns the token set obtained from the provider, tracks the
//! session state and copies every fresh access token into the [`TokenStore`].

use std::sync::Arc;

use parking_lot::RwLock;
use sims_domain::{AuthError, IdentityConfig, SessionState, TokenClaims, TokenSet, token_preview};
use tracing::{debug, error, info, warn};

use super::TokenStore;
use crate::ports::{Clock, IdentityProvider};
use crate::{ApplicationError, ApplicationResult};

/// How an expired token was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirySource {
    /// An explicit `is_expired` check.
    Check,
    /// A refresh attempt found the token already expired.
    Refresh,
    /// The API answered 401.
    Unauthorized,
}

impl ExpirySource {
    /// Short label for logs and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "expiry check",
            Self::Refresh => "refresh",
            Self::Unauthorized => "401 response",
        }
    }
}

/// Observer invoked when the session moves to `Expired`.
pub type ExpiredHandler = Box<dyn Fn(ExpirySource) + Send + Sync>;

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    tokens: Option<TokenSet>,
}

/// Authentication session shared by the screens.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    config: RwLock<IdentityConfig>,
    inner: RwLock<SessionInner>,
    expired_handlers: RwLock<Vec<ExpiredHandler>>,
    scrub_on_logout: bool,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &self.state())
            .field("realm", &self.config.read().realm)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Creates an unauthenticated session.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: TokenStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            config: RwLock::new(IdentityConfig::default()),
            inner: RwLock::new(SessionInner::default()),
            expired_handlers: RwLock::new(Vec::new()),
            scrub_on_logout: false,
        }
    }

    /// Clears the token store on logout when set.
    #[must_use]
    pub const fn with_scrub_on_logout(mut self, scrub: bool) -> Self {
        self.scrub_on_logout = scrub;
        self
    }

    /// Runs the login flow with `config`.
    ///
    /// `Ok(true)` means a token was obtained and is already in the token
    /// store. `Ok(false)` means the flow ended without a token and the caller
    /// should restart it. Any error leaves the session in the terminal
    /// `Failed` state.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, the token cannot be stored, or
    /// a previous attempt already failed.
    pub async fn initialize(&self, config: &IdentityConfig) -> ApplicationResult<bool> {
        if self.state().is_terminal() {
            return Err(AuthError::AuthorizationFailed {
                message: "authentication already failed for this run".to_string(),
            }
            .into());
        }
        *self.config.write() = config.clone();

        info!(realm = %config.realm, client_id = %config.client_id, "Starting login");
        let tokens = match self.provider.login(config).await {
            Ok(Some(tokens)) => tokens,
            Ok(None) => {
                info!("Login finished without a token");
                self.inner.write().state = SessionState::Unauthenticated;
                return Ok(false);
            }
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = self.store.set(tokens.access.as_str()).await {
            return Err(self.fail(e.into()));
        }

        info!(token = %token_preview(tokens.access.as_str()), "Authenticated");
        let mut inner = self.inner.write();
        inner.state = SessionState::Authenticated;
        inner.tokens = Some(tokens);
        Ok(true)
    }

    /// Runs [`Self::initialize`] again while it returns `Ok(false)`, at most
    /// `max_attempts` times.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::initialize`].
    pub async fn initialize_with_reload(
        &self,
        config: &IdentityConfig,
        max_attempts: u32,
    ) -> ApplicationResult<bool> {
        for attempt in 1..=max_attempts {
            if self.initialize(config).await? {
                return Ok(true);
            }
            debug!(attempt, "Restarting login");
        }
        warn!(max_attempts, "Giving up on login");
        Ok(false)
    }

    /// Returns true when the token expires within `tolerance_secs`, or when
    /// there is no token at all.
    ///
    /// A token found actually expired moves the session to `Expired`.
    pub fn is_expired(&self, tolerance_secs: i64) -> bool {
        let now = self.clock.now();
        let (expiring, expired) = {
            let inner = self.inner.read();
            let Some(tokens) = inner.tokens.as_ref() else {
                return true;
            };
            let claims = tokens.access.claims();
            (
                claims.is_expired_at(now, tolerance_secs),
                claims.is_expired_at(now, 0),
            )
        };
        if expired {
            self.transition_expired(ExpirySource::Check);
        }
        expiring
    }

    /// Renews the token unless it stays valid for `min_validity_secs`.
    ///
    /// Returns `Ok(false)` without contacting the provider when the current
    /// token is still good enough, `Ok(true)` after a successful renewal.
    /// The token store is only written on success.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no token, no refresh token, or the
    /// provider rejects the refresh.
    pub async fn refresh(&self, min_validity_secs: i64) -> ApplicationResult<bool> {
        let now = self.clock.now();
        let (refresh_token, expired) = {
            let inner = self.inner.read();
            let tokens = inner.tokens.as_ref().ok_or(AuthError::NotAuthenticated)?;
            let claims = tokens.access.claims();
            if !claims.is_expired_at(now, min_validity_secs) {
                debug!(min_validity_secs, "Token still valid, refresh skipped");
                return Ok(false);
            }
            (tokens.refresh_token.clone(), claims.is_expired_at(now, 0))
        };
        if expired {
            self.transition_expired(ExpirySource::Refresh);
        }
        let refresh_token = refresh_token.ok_or(AuthError::TokenExpiredNoRefresh)?;

        let config = self.config.read().clone();
        let renewed = match self.provider.refresh(&config, &refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                return Err(e.into());
            }
        };
        self.store.set(renewed.access.as_str()).await?;

        info!(token = %token_preview(renewed.access.as_str()), "Token refreshed");
        let mut inner = self.inner.write();
        let previous = inner.tokens.take();
        inner.tokens = Some(merge_renewed(previous, renewed));
        inner.state = SessionState::Authenticated;
        Ok(true)
    }

    /// Returns true when the token grants the realm role `role`.
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.inner
            .read()
            .tokens
            .as_ref()
            .is_some_and(|t| t.access.claims().has_realm_role(role))
    }

    /// Returns true when the token grants `role` on the configured client.
    pub fn has_resource_role(&self, role: &str) -> bool {
        let client_id = self.config.read().client_id.clone();
        self.inner
            .read()
            .tokens
            .as_ref()
            .is_some_and(|t| t.access.claims().has_resource_role(role, &client_id))
    }

    /// Ends the session at the provider and locally.
    ///
    /// The session is unauthenticated afterwards even if the provider call
    /// fails. The token store keeps its value unless scrubbing on logout was
    /// enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's end-session flow fails or the
    /// store cannot be scrubbed.
    pub async fn logout(&self, redirect_uri: &str) -> ApplicationResult<()> {
        let id_token = {
            let mut inner = self.inner.write();
            inner.state = SessionState::Unauthenticated;
            inner.tokens.take().and_then(|t| t.id_token)
        };
        let config = self.config.read().clone();
        info!(redirect_uri, "Logging out");

        let result = self
            .provider
            .logout(&config, id_token.as_deref(), redirect_uri)
            .await
            .map_err(ApplicationError::from);

        if self.scrub_on_logout {
            self.store.clear().await?;
        }
        result
    }

    /// Records that the API rejected the token.
    pub fn mark_expired(&self) {
        self.transition_expired(ExpirySource::Unauthorized);
    }

    /// Registers an observer for expiry discoveries.
    pub fn on_expired(&self, handler: impl Fn(ExpirySource) + Send + Sync + 'static) {
        self.expired_handlers.write().push(Box::new(handler));
    }

    /// Returns true while a token believed valid is held.
    pub fn authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    /// Raw access token.
    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .tokens
            .as_ref()
            .map(|t| t.access.as_str().to_string())
    }

    /// Decoded claims of the access token.
    pub fn token_parsed(&self) -> Option<TokenClaims> {
        self.inner
            .read()
            .tokens
            .as_ref()
            .map(|t| t.access.claims().clone())
    }

    /// Seconds left before the token expires.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        let now = self.clock.now();
        self.inner
            .read()
            .tokens
            .as_ref()
            .and_then(|t| t.access.claims().seconds_until_expiry(now))
    }

    fn fail(&self, err: ApplicationError) -> ApplicationError {
        error!(error = %err, "Authentication failed");
        let mut inner = self.inner.write();
        inner.state = SessionState::Failed;
        inner.tokens = None;
        err
    }

    fn transition_expired(&self, source: ExpirySource) {
        {
            let mut inner = self.inner.write();
            if inner.state != SessionState::Authenticated {
                return;
            }
            inner.state = SessionState::Expired;
        }
        warn!(source = source.as_str(), "Session expired");
        for handler in self.expired_handlers.read().iter() {
            handler(source);
        }
    }
}

/// Providers may omit the refresh and id tokens on refresh; keep the old ones.
fn merge_renewed(previous: Option<TokenSet>, mut renewed: TokenSet) -> TokenSet {
    if let Some(previous) = previous {
        if renewed.refresh_token.is_none() {
            renewed.refresh_token = previous.refresh_token;
        }
        if renewed.id_token.is_none() {
            renewed.id_token = previous.id_token;
        }
    }
    renewed
}
