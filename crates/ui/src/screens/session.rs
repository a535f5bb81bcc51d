//! Identity test screen.
//!
//! Ten numbered actions exercising the login session. Each one ends with a
//! single info message.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sims_application::{AuthSession, AuthorizedApi};
use sims_domain::{AppConfig, DomainError, IdentityConfig, RequestResult};
use tracing::info;

/// Login restarts allowed before giving up.
const LOGIN_ATTEMPTS: u32 = 3;
/// Tolerance used by the expiry check.
const EXPIRY_TOLERANCE_SECS: i64 = 5;
/// Minimum validity below which the refresh action renews.
const REFRESH_MIN_VALIDITY_SECS: i64 = 10;
const ADMIN_ROLE: &str = "admin";
const CLIENT_ROLE: &str = "test";

/// The numbered actions of the session screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// 1: is the session authenticated.
    CheckAuthenticated,
    /// 2: run the login flow.
    Login,
    /// 3: show the raw token.
    ShowToken,
    /// 4: show the decoded claims.
    ShowParsedToken,
    /// 5: check expiry with a 5 s tolerance.
    CheckExpiry,
    /// 6: refresh with a 10 s minimum validity.
    Refresh,
    /// 7: send a request to the probe URL.
    ProbeRequest,
    /// 8: log out.
    Logout,
    /// 9: realm role `admin`.
    RealmRole,
    /// 10: client role `test`.
    ClientRole,
}

impl SessionAction {
    /// All actions, numbered from 1.
    pub const ALL: [Self; 10] = [
        Self::CheckAuthenticated,
        Self::Login,
        Self::ShowToken,
        Self::ShowParsedToken,
        Self::CheckExpiry,
        Self::Refresh,
        Self::ProbeRequest,
        Self::Logout,
        Self::RealmRole,
        Self::ClientRole,
    ];

    /// Menu number.
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).map_or(0, |i| i + 1)
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CheckAuthenticated => "Is authenticated",
            Self::Login => "Log in",
            Self::ShowToken => "Show token",
            Self::ShowParsedToken => "Show parsed token",
            Self::CheckExpiry => "Is token expired",
            Self::Refresh => "Refresh token",
            Self::ProbeRequest => "Send probe request",
            Self::Logout => "Log out",
            Self::RealmRole => "Has realm role admin",
            Self::ClientRole => "Has client role test",
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

impl FromStr for SessionAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| DomainError::InvalidField {
                field: "action",
                message: format!("expected 1-10, got {s:?}"),
            })
    }
}

/// Presentation model of the identity test screen.
pub struct SessionScreen {
    session: Arc<AuthSession>,
    api: AuthorizedApi,
    identity: IdentityConfig,
    probe_url: String,
    logout_redirect_uri: String,
}

impl fmt::Debug for SessionScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionScreen")
            .field("state", &self.session.state())
            .field("probe_url", &self.probe_url)
            .finish_non_exhaustive()
    }
}

impl SessionScreen {
    /// Creates the screen for `session`, reading URLs from `config`.
    #[must_use]
    pub fn new(session: Arc<AuthSession>, api: AuthorizedApi, config: &AppConfig) -> Self {
        Self {
            session,
            api,
            identity: config.identity.clone(),
            probe_url: config.probe_url.clone(),
            logout_redirect_uri: config.logout_redirect_uri.clone(),
        }
    }

    /// Runs `action` and returns its info message.
    pub async fn perform(&self, action: SessionAction) -> String {
        let message = match action {
            SessionAction::CheckAuthenticated => {
                format!("Authenticated: {}", yes_no(self.session.authenticated()))
            }
            SessionAction::Login => self.login().await,
            SessionAction::ShowToken => self
                .session
                .token()
                .unwrap_or_else(|| "No token".to_string()),
            SessionAction::ShowParsedToken => self.session.token_parsed().map_or_else(
                || "No token".to_string(),
                |claims| {
                    serde_json::to_string_pretty(&claims)
                        .unwrap_or_else(|e| format!("Cannot display claims: {e}"))
                },
            ),
            SessionAction::CheckExpiry => self.expiry_message(),
            SessionAction::Refresh => match self.session.refresh(REFRESH_MIN_VALIDITY_SECS).await {
                Ok(true) => "Token refreshed".to_string(),
                Ok(false) => "Token still valid".to_string(),
                Err(e) => format!("Refresh failed: {e}"),
            },
            SessionAction::ProbeRequest => match self.api.get(&self.probe_url).await {
                RequestResult::Success { status, .. } => format!("Probe request: {status}"),
                RequestResult::Failure { status, message } => {
                    format!("Probe request failed ({status}): {message}")
                }
            },
            SessionAction::Logout => match self.session.logout(&self.logout_redirect_uri).await {
                Ok(()) => "Logged out".to_string(),
                Err(e) => format!("Logged out locally; provider said: {e}"),
            },
            SessionAction::RealmRole => format!(
                "Realm role {ADMIN_ROLE}: {}",
                yes_no(self.session.has_realm_role(ADMIN_ROLE))
            ),
            SessionAction::ClientRole => format!(
                "Client role {CLIENT_ROLE}: {}",
                yes_no(self.session.has_resource_role(CLIENT_ROLE))
            ),
        };
        info!(action = action.number(), "{message}");
        message
    }

    fn expiry_message(&self) -> String {
        let expired = self.session.is_expired(EXPIRY_TOLERANCE_SECS);
        match self.session.seconds_until_expiry() {
            Some(left) if left > 0 => {
                format!("Token expired: {} (expires in {left}s)", yes_no(expired))
            }
            _ => format!("Token expired: {}", yes_no(expired)),
        }
    }

    async fn login(&self) -> String {
        match self
            .session
            .initialize_with_reload(&self.identity, LOGIN_ATTEMPTS)
            .await
        {
            Ok(true) => {
                let user = self
                    .session
                    .token_parsed()
                    .and_then(|claims| claims.preferred_username)
                    .unwrap_or_else(|| "unknown user".to_string());
                format!("Logged in as {user}")
            }
            Ok(false) => "Login ended without a token".to_string(),
            Err(e) => format!("Login failed: {e}"),
        }
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::{FakeHttp, FakeProvider, NOW, session_fixture, token_set};
    use pretty_assertions::assert_eq;
    use sims_domain::{AuthError, HttpMethod, SessionState};

    #[test]
    fn test_action_numbers() {
        assert_eq!("1".parse::<SessionAction>().unwrap(), SessionAction::CheckAuthenticated);
        assert_eq!(" 10 ".parse::<SessionAction>().unwrap(), SessionAction::ClientRole);
        assert!("0".parse::<SessionAction>().is_err());
        assert!("11".parse::<SessionAction>().is_err());
        assert!("login".parse::<SessionAction>().is_err());
        assert_eq!(SessionAction::Logout.to_string(), "8. Log out");
    }

    #[tokio::test]
    async fn test_before_login() {
        let fixture = session_fixture(FakeProvider::new(None), FakeHttp::new()).await;
        let screen = &fixture.screen;

        assert_eq!(screen.perform(SessionAction::CheckAuthenticated).await, "Authenticated: no");
        assert_eq!(screen.perform(SessionAction::ShowToken).await, "No token");
        assert_eq!(screen.perform(SessionAction::CheckExpiry).await, "Token expired: yes");
        assert_eq!(screen.perform(SessionAction::RealmRole).await, "Realm role admin: no");
        assert!(
            screen
                .perform(SessionAction::ProbeRequest)
                .await
                .starts_with("Probe request failed (Token unavailable)")
        );
        assert!(fixture.http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_then_inspect() {
        let fixture = session_fixture(
            FakeProvider::new(Some(token_set(NOW + 600))),
            FakeHttp::new().respond(HttpMethod::Get, "/request", 200, "{}"),
        )
        .await;
        let screen = &fixture.screen;

        assert_eq!(screen.perform(SessionAction::Login).await, "Logged in as alice");
        assert_eq!(screen.perform(SessionAction::CheckAuthenticated).await, "Authenticated: yes");
        assert_eq!(
            screen.perform(SessionAction::CheckExpiry).await,
            "Token expired: no (expires in 600s)"
        );
        assert_eq!(screen.perform(SessionAction::Refresh).await, "Token still valid");
        assert_eq!(screen.perform(SessionAction::RealmRole).await, "Realm role admin: yes");
        assert_eq!(screen.perform(SessionAction::ClientRole).await, "Client role test: yes");
        assert!(
            screen
                .perform(SessionAction::ShowParsedToken)
                .await
                .contains("\"preferred_username\": \"alice\"")
        );
        assert_eq!(screen.perform(SessionAction::ProbeRequest).await, "Probe request: 200");
        assert_eq!(
            fixture.http.requests()[0].url,
            "https://mockbin.com/request"
        );
    }

    #[tokio::test]
    async fn test_expiry_within_tolerance_shows_time_left() {
        let fixture =
            session_fixture(FakeProvider::new(Some(token_set(NOW + 3))), FakeHttp::new()).await;
        let screen = &fixture.screen;
        screen.perform(SessionAction::Login).await;

        assert_eq!(
            screen.perform(SessionAction::CheckExpiry).await,
            "Token expired: yes (expires in 3s)"
        );
        assert_eq!(fixture.session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn test_logout() {
        let fixture =
            session_fixture(FakeProvider::new(Some(token_set(NOW + 600))), FakeHttp::new()).await;
        let screen = &fixture.screen;
        screen.perform(SessionAction::Login).await;

        assert_eq!(screen.perform(SessionAction::Logout).await, "Logged out");

        assert_eq!(fixture.session.state(), SessionState::Unauthenticated);
        assert_eq!(
            fixture.provider.last_logout_redirect(),
            Some("http://localhost:3001/".to_string())
        );
    }

    #[tokio::test]
    async fn test_login_failure_is_terminal() {
        let provider = FakeProvider::failing(AuthError::AuthorizationFailed {
            message: "invalid_client".to_string(),
        });
        let fixture = session_fixture(provider, FakeHttp::new()).await;
        let screen = &fixture.screen;

        assert!(screen.perform(SessionAction::Login).await.starts_with("Login failed: "));
        assert_eq!(fixture.session.state(), SessionState::Failed);
        assert!(screen.perform(SessionAction::Login).await.starts_with("Login failed: "));
        assert_eq!(fixture.provider.login_calls(), 1);
    }

    #[tokio::test]
    async fn test_login_without_token_restarts() {
        let fixture = session_fixture(FakeProvider::new(None), FakeHttp::new()).await;

        assert_eq!(
            fixture.screen.perform(SessionAction::Login).await,
            "Login ended without a token"
        );
        assert_eq!(fixture.provider.login_calls(), 3);
    }
}
