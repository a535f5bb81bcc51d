//! Shared HTTP transport.

use std::sync::Arc;

use serde_json::Value;
use sims_domain::{CONTENT_TYPE, Header, Headers, HttpMethod, RequestResult, RequestSpec};
use tracing::{debug, warn};

use crate::ports::HttpClient;

/// Content type sent with every API call.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// The single transport used by all calling code.
///
/// It adds the JSON content type when missing, never adds credentials and
/// never retries. Every outcome, transport failures included, comes back as
/// a [`RequestResult`].
#[derive(Clone)]
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wraps an HTTP client adapter.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Sends `method url` with an optional JSON body and extra headers.
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
        headers: Option<Headers>,
    ) -> RequestResult {
        let mut request = RequestSpec::new(method, url);
        request.body = body;
        if let Some(headers) = headers {
            request.headers = headers;
        }
        self.execute(request).await
    }

    /// Sends a prepared request.
    pub async fn execute(&self, mut request: RequestSpec) -> RequestResult {
        if let Err(e) = request.parse_url() {
            warn!(url = %request.url, error = %e, "Request not sent");
            return RequestResult::network(e.to_string());
        }
        if !request.headers.contains(CONTENT_TYPE) {
            request.headers.set(Header::new(CONTENT_TYPE, JSON_CONTENT_TYPE));
        }

        debug!(method = %request.method, url = %request.url, "Sending request");
        match self.http.execute(&request).await {
            Ok(response) => {
                debug!(
                    status = response.status,
                    elapsed = ?response.duration,
                    "Response received"
                );
                let result = RequestResult::from_response(&response);
                if let Some(message) = result.failure_message() {
                    warn!(status = response.status, reason = message, "Request failed");
                }
                result
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network error");
                RequestResult::network(e.to_string())
            }
        }
    }
}
