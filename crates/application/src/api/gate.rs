//! Token-gated API access.
//!
//! A call is only sent when the token store holds a token; otherwise it
//! resolves at once to a "token unavailable" failure. A 401 answer is
//! reported to the session as an expiry.

use std::sync::Arc;

use serde_json::Value;
use sims_domain::{HttpMethod, RequestResult, token_preview};
use tracing::{debug, info};

use super::{ApiClient, authorized_request};
use crate::auth::{AuthSession, TokenStore};

/// Authenticated access to the REST API.
#[derive(Clone)]
pub struct AuthorizedApi {
    client: ApiClient,
    store: TokenStore,
    session: Option<Arc<AuthSession>>,
    base_url: String,
}

impl std::fmt::Debug for AuthorizedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedApi")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AuthorizedApi {
    /// Creates a gate sending relative paths to `base_url`.
    #[must_use]
    pub fn new(client: ApiClient, store: TokenStore, base_url: impl Into<String>) -> Self {
        Self {
            client,
            store,
            session: None,
            base_url: base_url.into(),
        }
    }

    /// Reports 401 answers to `session`.
    #[must_use]
    pub fn with_session(mut self, session: Arc<AuthSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Base URL relative paths are joined onto.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `method target` with the stored bearer token.
    ///
    /// `target` is either an absolute http(s) URL or a path under the base
    /// URL.
    pub async fn send(&self, method: HttpMethod, target: &str, body: Option<Value>) -> RequestResult {
        let Some(token) = self.store.get().await else {
            debug!(%method, target, "No token, request not sent");
            return RequestResult::token_unavailable();
        };

        let url = self.resolve(target);
        debug!(%method, %url, token = %token_preview(&token), "Authorized request");
        let result = self
            .client
            .execute(authorized_request(method, url, body, &token))
            .await;

        if result.is_unauthorized() {
            info!(target, "API rejected the token");
            if let Some(session) = &self.session {
                session.mark_expired();
            }
        }
        result
    }

    /// `GET target`.
    pub async fn get(&self, target: &str) -> RequestResult {
        self.send(HttpMethod::Get, target, None).await
    }

    /// `POST target` with a JSON body.
    pub async fn post(&self, target: &str, body: Value) -> RequestResult {
        self.send(HttpMethod::Post, target, Some(body)).await
    }

    /// `PUT target` with a JSON body.
    pub async fn put(&self, target: &str, body: Value) -> RequestResult {
        self.send(HttpMethod::Put, target, Some(body)).await
    }

    /// `DELETE target`.
    pub async fn delete(&self, target: &str) -> RequestResult {
        self.send(HttpMethod::Delete, target, None).await
    }

    fn resolve(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            target.trim_start_matches('/')
        )
    }
}
