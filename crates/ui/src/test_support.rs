//! Fakes for the screen tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use sims_application::ports::{
    AuthFuture, Clock, HttpClient, HttpClientError, IdentityProvider, KeyValueStorage,
    StorageError,
};
use sims_application::{
    ApiClient, AuthSession, AuthorizedApi, Diagnostics, MealsClient, TokenStore,
};
use sims_domain::{
    AccessToken, AppConfig, AuthError, HttpMethod, IdentityConfig, RequestSpec, ResponseSpec,
    TokenSet,
};

use crate::screens::SessionScreen;

pub const NOW: i64 = 1_700_000_000;
const API: &str = "http://localhost:8000";

/// Token set for `alice` with realm role `admin` and client role `test`.
pub fn token_set(exp: i64) -> TokenSet {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": "u-1",
            "exp": exp,
            "preferred_username": "alice",
            "realm_access": {"roles": ["admin"]},
            "resource_access": {"react-client2": {"roles": ["test"]}}
        })
        .to_string(),
    );
    TokenSet {
        access: AccessToken::parse(format!("{header}.{payload}.sig")).unwrap(),
        refresh_token: Some("refresh".to_string()),
        id_token: None,
    }
}

pub struct FakeClock;

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }
}

#[derive(Default)]
pub struct MemoryStorage(Mutex<HashMap<String, String>>);

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.0.lock().remove(key);
        Ok(())
    }
}

pub struct FakeProvider {
    login: Result<Option<TokenSet>, AuthError>,
    login_calls: AtomicUsize,
    last_logout_redirect: Mutex<Option<String>>,
}

impl FakeProvider {
    pub fn new(tokens: Option<TokenSet>) -> Self {
        Self {
            login: Ok(tokens),
            login_calls: AtomicUsize::new(0),
            last_logout_redirect: Mutex::new(None),
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            login: Err(error),
            ..Self::new(None)
        }
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn last_logout_redirect(&self) -> Option<String> {
        self.last_logout_redirect.lock().clone()
    }
}

impl IdentityProvider for FakeProvider {
    fn login<'a>(&'a self, _config: &'a IdentityConfig) -> AuthFuture<'a, Option<TokenSet>> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.login.clone();
        Box::pin(async move { result })
    }

    fn refresh<'a>(
        &'a self,
        _config: &'a IdentityConfig,
        _refresh_token: &'a str,
    ) -> AuthFuture<'a, TokenSet> {
        Box::pin(async {
            Err(AuthError::RefreshFailed {
                message: "not scripted".to_string(),
            })
        })
    }

    fn logout<'a>(
        &'a self,
        _config: &'a IdentityConfig,
        _id_token: Option<&'a str>,
        redirect_uri: &'a str,
    ) -> AuthFuture<'a, ()> {
        *self.last_logout_redirect.lock() = Some(redirect_uri.to_string());
        Box::pin(async { Ok(()) })
    }
}

type Route = (HttpMethod, String, ResponseSpec);

/// Records requests and answers from a route table; last matching route wins.
#[derive(Default)]
pub struct FakeHttp {
    requests: Mutex<Vec<RequestSpec>>,
    routes: Vec<Route>,
    delay: Option<Duration>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(mut self, method: HttpMethod, suffix: &str, status: u16, body: &str) -> Self {
        let response =
            ResponseSpec::new(status, HashMap::new(), body.as_bytes(), Duration::from_millis(1));
        self.routes.push((method, suffix.to_string(), response));
        self
    }

    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().clone()
    }

    pub fn count(&self, method: HttpMethod, suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(suffix))
            .count()
    }
}

impl HttpClient for FakeHttp {
    fn execute<'a>(
        &'a self,
        request: &'a RequestSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + 'a>> {
        self.requests.lock().push(request.clone());
        let result = self
            .routes
            .iter()
            .rev()
            .find(|(method, suffix, _)| *method == request.method && request.url.ends_with(suffix))
            .map(|(_, _, response)| response.clone())
            .ok_or_else(|| HttpClientError::Other(format!("no route for {}", request.url)));
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

async fn gate(http: FakeHttp, token: bool) -> (AuthorizedApi, TokenStore, Arc<FakeHttp>) {
    let http = Arc::new(http);
    let store = TokenStore::new(Arc::new(MemoryStorage::default()));
    if token {
        store.set("abc.def.ghi").await.unwrap();
    }
    let api = AuthorizedApi::new(ApiClient::new(http.clone()), store.clone(), API);
    (api, store, http)
}

pub async fn meals_client(http: FakeHttp, token: bool) -> (MealsClient, Arc<FakeHttp>) {
    let (api, _, http) = gate(http, token).await;
    (MealsClient::new(api), http)
}

pub async fn diagnostics(http: FakeHttp, token: bool) -> (Diagnostics, Arc<FakeHttp>) {
    let (api, _, http) = gate(http, token).await;
    (Diagnostics::new(api, Arc::new(FakeClock)), http)
}

pub struct SessionFixture {
    pub screen: SessionScreen,
    pub session: Arc<AuthSession>,
    pub provider: Arc<FakeProvider>,
    pub http: Arc<FakeHttp>,
}

pub async fn session_fixture(provider: FakeProvider, http: FakeHttp) -> SessionFixture {
    let (api, store, http) = gate(http, false).await;
    let provider = Arc::new(provider);
    let session = Arc::new(AuthSession::new(provider.clone(), store, Arc::new(FakeClock)));
    let api = api.with_session(session.clone());
    let screen = SessionScreen::new(session.clone(), api, &AppConfig::default());
    SessionFixture {
        screen,
        session,
        provider,
        http,
    }
}
