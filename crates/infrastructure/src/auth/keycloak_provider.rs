//! Keycloak implementation of the identity provider port.
//!
//! Authorization-code flow with PKCE: the system browser is sent to the
//! realm's `auth` endpoint, the redirect lands on a loopback listener, and
//! the code is exchanged at the `token` endpoint with a form-urlencoded POST.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sims_application::ports::{AuthFuture, IdentityProvider};
use sims_domain::{AccessToken, AuthError, IdentityConfig, TokenSet, token_preview};
use tracing::{debug, info, warn};
use url::Url;

use super::{CallbackOutcome, CallbackServer, Pkce, random_state};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How long the user gets to finish logging in.
const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(300);

/// Opens a URL for the user.
pub type BrowserLauncher = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self) -> Result<TokenSet, AuthError> {
        let access = AccessToken::parse(self.access_token).map_err(|e| AuthError::InvalidToken {
            message: e.to_string(),
        })?;
        Ok(TokenSet {
            access,
            refresh_token: self.refresh_token,
            id_token: self.id_token,
        })
    }
}

/// Keycloak OIDC client.
pub struct KeycloakProvider {
    http_client: reqwest::Client,
    launcher: BrowserLauncher,
    login_timeout: Duration,
}

impl std::fmt::Debug for KeycloakProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakProvider")
            .field("login_timeout", &self.login_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for KeycloakProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeycloakProvider {
    /// Creates a provider that opens the system browser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            launcher: Arc::new(|url| webbrowser::open(url)),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    /// Replaces the browser launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: BrowserLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Sets how long to wait for the login redirect.
    #[must_use]
    pub const fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// URL the browser is sent to.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured provider URL is not a URL.
    pub fn authorization_url(
        config: &IdentityConfig,
        redirect_uri: &str,
        pkce: &Pkce,
        state: &str,
        nonce: &str,
    ) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &config.authorization_endpoint(),
            [
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("response_mode", "query"),
                ("scope", config.scope.as_str()),
                ("state", state),
                ("nonce", nonce),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", pkce.method.as_str()),
            ],
        )
        .map_err(|e| invalid_config(&e))
    }

    /// URL of the end-session endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured provider URL is not a URL.
    pub fn logout_url(
        config: &IdentityConfig,
        id_token: Option<&str>,
        redirect_uri: &str,
    ) -> Result<Url, AuthError> {
        let mut url = Url::parse(&config.logout_endpoint()).map_err(|e| invalid_config(&e))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &config.client_id);
            query.append_pair("post_logout_redirect_uri", redirect_uri);
            if let Some(id_token) = id_token {
                query.append_pair("id_token_hint", id_token);
            }
        }
        Ok(url)
    }

    fn open(&self, url: &Url) {
        if let Err(e) = (self.launcher)(url.as_str()) {
            warn!(error = %e, "Could not open browser automatically");
            info!(url = %url, "Open this URL to continue");
        }
    }

    /// POSTs a form to the token endpoint.
    async fn token_request(
        &self,
        config: &IdentityConfig,
        params: &[(&str, &str)],
    ) -> Result<TokenSet, AuthError> {
        let body = serde_urlencoded::to_string(params).map_err(|e| AuthError::Network {
            message: format!("Failed to encode form: {e}"),
        })?;

        let response = self
            .http_client
            .post(config.token_endpoint())
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AuthError::Network {
            message: format!("Failed to read token response: {e}"),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text).map_or_else(
                |_| format!("Token request failed with status {status}: {text}"),
                |error| error.error_description.unwrap_or(error.error),
            );
            return Err(AuthError::AuthorizationFailed { message });
        }

        let token: TokenResponse = serde_json::from_str(&text).map_err(|e| AuthError::Network {
            message: format!("Failed to parse token response: {e}"),
        })?;
        token.into_token_set()
    }

    async fn run_login(&self, config: &IdentityConfig) -> Result<Option<TokenSet>, AuthError> {
        let pkce = Pkce::generate(config.pkce_method);
        let state = random_state();
        let nonce = random_state();
        let server = CallbackServer::bind(config.redirect_port, state.clone()).await?;
        let redirect_uri = config.redirect_uri();

        let url = Self::authorization_url(config, &redirect_uri, &pkce, &state, &nonce)?;
        info!(port = server.port(), "Waiting for login callback");
        self.open(&url);

        let code = match server.wait(self.login_timeout).await? {
            Some(CallbackOutcome::Code(code)) => code,
            Some(CallbackOutcome::Denied { error, description }) => {
                return Err(AuthError::AuthorizationFailed {
                    message: description.unwrap_or(error),
                });
            }
            None => return Ok(None),
        };
        debug!("Exchanging authorization code");

        let tokens = self
            .token_request(
                config,
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", config.client_id.as_str()),
                    ("code", code.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("code_verifier", pkce.verifier.as_str()),
                ],
            )
            .await?;
        info!(token = %token_preview(tokens.access.as_str()), "Login complete");
        Ok(Some(tokens))
    }
}

impl IdentityProvider for KeycloakProvider {
    fn login<'a>(&'a self, config: &'a IdentityConfig) -> AuthFuture<'a, Option<TokenSet>> {
        Box::pin(self.run_login(config))
    }

    fn refresh<'a>(
        &'a self,
        config: &'a IdentityConfig,
        refresh_token: &'a str,
    ) -> AuthFuture<'a, TokenSet> {
        Box::pin(async move {
            self.token_request(
                config,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", config.client_id.as_str()),
                    ("refresh_token", refresh_token),
                ],
            )
            .await
            .map_err(|e| match e {
                AuthError::AuthorizationFailed { message } => AuthError::RefreshFailed { message },
                other => other,
            })
        })
    }

    fn logout<'a>(
        &'a self,
        config: &'a IdentityConfig,
        id_token: Option<&'a str>,
        redirect_uri: &'a str,
    ) -> AuthFuture<'a, ()> {
        Box::pin(async move {
            let url = Self::logout_url(config, id_token, redirect_uri)?;
            self.open(&url);
            Ok(())
        })
    }
}

fn invalid_config(error: &url::ParseError) -> AuthError {
    AuthError::InvalidConfiguration {
        message: format!("identity provider URL: {error}"),
    }
}
