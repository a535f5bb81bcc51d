//! Hand-written fakes for the ports, shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sims_domain::{
    AccessToken, AuthError, HttpMethod, IdentityConfig, RequestSpec, ResponseSpec, TokenSet,
};

use crate::ports::{
    AuthFuture, Clock, HttpClient, HttpClientError, IdentityProvider, KeyValueStorage,
    StorageError,
};

/// Fixed "now" used by the session tests.
pub const NOW: i64 = 1_700_000_000;

/// Builds an unsigned JWT around `payload`.
pub fn jwt(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// Token set expiring at `exp`, with realm role `admin` and client role `test`.
pub fn token_set(exp: i64, refresh_token: Option<&str>) -> TokenSet {
    let raw = jwt(&json!({
        "sub": "user-1",
        "exp": exp,
        "iat": exp - 300,
        "preferred_username": "alice",
        "realm_access": {"roles": ["admin", "user"]},
        "resource_access": {"react-client2": {"roles": ["test"]}}
    }));
    TokenSet {
        access: AccessToken::parse(raw).unwrap(),
        refresh_token: refresh_token.map(str::to_string),
        id_token: Some("id-token".to_string()),
    }
}

/// Clock pinned to a timestamp.
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn at(timestamp: i64) -> Self {
        Self(DateTime::from_timestamp(timestamp, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory key/value storage.
#[derive(Default)]
pub struct MemoryStorage {
    pub items: Mutex<HashMap<String, String>>,
    pub fail: bool,
}

impl MemoryStorage {
    pub fn with_raw(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail {
            return Err(StorageError::Serialization("broken".to_string()));
        }
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Identity provider replaying canned results.
pub struct ScriptedProvider {
    login: Result<Option<TokenSet>, AuthError>,
    refresh: Result<TokenSet, AuthError>,
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
    last_logout_redirect: Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn logging_in(tokens: Option<TokenSet>) -> Self {
        Self {
            login: Ok(tokens),
            refresh: Err(AuthError::RefreshFailed {
                message: "not scripted".to_string(),
            }),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            last_refresh_token: Mutex::new(None),
            last_logout_redirect: Mutex::new(None),
        }
    }

    pub fn failing_login(error: AuthError) -> Self {
        Self {
            login: Err(error),
            ..Self::logging_in(None)
        }
    }

    pub fn with_refresh(mut self, result: Result<TokenSet, AuthError>) -> Self {
        self.refresh = result;
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    pub fn last_logout_redirect(&self) -> Option<String> {
        self.last_logout_redirect.lock().unwrap().clone()
    }
}

impl IdentityProvider for ScriptedProvider {
    fn login<'a>(&'a self, _config: &'a IdentityConfig) -> AuthFuture<'a, Option<TokenSet>> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.login.clone();
        Box::pin(async move { result })
    }

    fn refresh<'a>(
        &'a self,
        _config: &'a IdentityConfig,
        refresh_token: &'a str,
    ) -> AuthFuture<'a, TokenSet> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
        let result = self.refresh.clone();
        Box::pin(async move { result })
    }

    fn logout<'a>(
        &'a self,
        _config: &'a IdentityConfig,
        _id_token: Option<&'a str>,
        redirect_uri: &'a str,
    ) -> AuthFuture<'a, ()> {
        *self.last_logout_redirect.lock().unwrap() = Some(redirect_uri.to_string());
        Box::pin(async { Ok(()) })
    }
}

type Route = (HttpMethod, String, Result<ResponseSpec, HttpClientError>);

/// HTTP client that records every request and answers from a route table.
#[derive(Default)]
pub struct RecordingHttpClient {
    requests: Mutex<Vec<RequestSpec>>,
    routes: Mutex<Vec<Route>>,
    delay: Option<Duration>,
}

impl RecordingHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answers requests whose URL ends with `suffix`.
    pub fn respond(self, method: HttpMethod, suffix: &str, status: u16, body: &str) -> Self {
        let response = ResponseSpec::new(
            status,
            HashMap::new(),
            body.as_bytes(),
            Duration::from_millis(5),
        );
        self.routes
            .lock()
            .unwrap()
            .push((method, suffix.to_string(), Ok(response)));
        self
    }

    pub fn fail(self, method: HttpMethod, suffix: &str, error: HttpClientError) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((method, suffix.to_string(), Err(error)));
        self
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: HttpMethod, suffix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .count()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(
        &'a self,
        request: &'a RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'a>> {
        self.requests.lock().unwrap().push(request.clone());
        let result = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(method, suffix, _)| *method == request.method && request.url.ends_with(suffix))
            .map_or_else(
                || Err(HttpClientError::Other(format!("no route for {}", request.url))),
                |(_, _, result)| result.clone(),
            );
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}
