//! Identity provider configuration

use serde::{Deserialize, Serialize};

/// PKCE code challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PkceMethod {
    /// SHA-256 of the verifier, base64url encoded.
    #[default]
    S256,
    /// The verifier itself.
    #[serde(rename = "plain")]
    Plain,
}

impl PkceMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

/// Connection settings for the Keycloak realm used to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity server.
    pub url: String,
    /// Realm name.
    pub realm: String,
    /// Public client identifier.
    pub client_id: String,
    /// PKCE challenge method.
    pub pkce_method: PkceMethod,
    /// Loopback port the authorization redirect lands on.
    pub redirect_port: u16,
    /// Requested scopes, space separated.
    pub scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: "http://keycloak.test/".to_string(),
            realm: "react-symfony-realm".to_string(),
            client_id: "react-client2".to_string(),
            pkce_method: PkceMethod::S256,
            redirect_port: 3001,
            scope: "openid".to_string(),
        }
    }
}

impl IdentityConfig {
    /// Base of the realm's OpenID Connect endpoints.
    #[must_use]
    pub fn openid_connect_base(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Authorization endpoint.
    #[must_use]
    pub fn authorization_endpoint(&self) -> String {
        format!("{}/auth", self.openid_connect_base())
    }

    /// Token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.openid_connect_base())
    }

    /// End-session endpoint.
    #[must_use]
    pub fn logout_endpoint(&self) -> String {
        format!("{}/logout", self.openid_connect_base())
    }

    /// Redirect URI registered for the loopback callback.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.redirect_port)
    }
}
