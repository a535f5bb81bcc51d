//! Bearer tokens and their decoded claims.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomainError, DomainResult};

/// A list of role names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl RoleSet {
    /// Returns true if `role` is granted.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Claim set carried in the payload segment of a JWT access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Authorized party (client id the token was issued to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    /// E-mail address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Realm-level roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RoleSet>,
    /// Client-level roles keyed by client id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_access: BTreeMap<String, RoleSet>,
    /// Every other claim, kept for display.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    /// Decodes the payload segment of a compact JWT.
    ///
    /// The signature is not verified; the API server does that.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no payload segment or the payload
    /// is not base64url-encoded JSON.
    pub fn decode(token: &str) -> DomainResult<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next()) {
            (Some(_), Some(payload)) if !payload.is_empty() => payload,
            _ => return Err(DomainError::MalformedToken("missing payload segment".to_string())),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| DomainError::MalformedToken(format!("payload is not base64url: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| DomainError::MalformedToken(format!("payload is not JSON: {e}")))
    }

    /// Expiry as a timestamp, if the token carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Returns true if the token expires at or before `now + tolerance_secs`.
    ///
    /// A token without an `exp` claim never expires. A tolerance reaching
    /// past the representable time range saturates: far positive counts as
    /// expired, far negative as valid.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, tolerance_secs: i64) -> bool {
        let Some(expires_at) = self.expires_at() else {
            return false;
        };
        match Duration::try_seconds(tolerance_secs).and_then(|d| now.checked_add_signed(d)) {
            Some(deadline) => expires_at <= deadline,
            None => tolerance_secs > 0,
        }
    }

    /// Seconds left before expiry (negative once expired).
    #[must_use]
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at().map(|exp| (exp - now).num_seconds())
    }

    /// Returns true if the realm grants `role`.
    #[must_use]
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.realm_access.as_ref().is_some_and(|access| access.contains(role))
    }

    /// Returns true if `resource` (a client id) grants `role`.
    #[must_use]
    pub fn has_resource_role(&self, role: &str, resource: &str) -> bool {
        self.resource_access
            .get(resource)
            .is_some_and(|access| access.contains(role))
    }
}

/// A raw access token paired with its decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    raw: String,
    claims: TokenClaims,
}

impl AccessToken {
    /// Parses a compact JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be decoded.
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        let claims = TokenClaims::decode(&raw)?;
        Ok(Self { raw, claims })
    }

    /// The encoded token, as sent in the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The decoded claims.
    #[must_use]
    pub const fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

/// Everything the token endpoint hands back after login or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    /// The bearer token.
    pub access: AccessToken,
    /// Token used to obtain a new access token.
    pub refresh_token: Option<String>,
    /// OIDC id token, used as a logout hint.
    pub id_token: Option<String>,
}

/// Get a preview of a token (first 8 chars + ...), safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) if token.len() > 12 => format!("{}...", &token[..idx]),
        _ => token.to_string(),
    }
}
