//! Request specification type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{Header, Headers, HttpMethod};
use crate::error::{DomainError, DomainResult};

/// Complete specification for one outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute target URL
    pub url: String,
    /// HTTP headers
    #[serde(default)]
    pub headers: Headers,
    /// JSON body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSpec {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET request with the given URL.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.set(header);
        self
    }

    /// Validates the URL and returns the parsed version.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or not http(s).
    pub fn parse_url(&self) -> DomainResult<Url> {
        let url = Url::parse(&self.url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DomainError::InvalidUrl(format!(
                "unsupported scheme {other}: {}",
                self.url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_request() {
        let req = RequestSpec::get("https://api.example.com/users");
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn test_builder_helpers() {
        let req = RequestSpec::new(HttpMethod::Post, "http://localhost/api/repas")
            .with_body(json!({"nom": "Salade"}))
            .with_header(Header::new("X-Trace", "1"));
        assert_eq!(req.headers.get("x-trace"), Some("1"));
        assert_eq!(req.body, Some(json!({"nom": "Salade"})));
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(RequestSpec::get("ftp://example.com").parse_url().is_err());
        assert!(RequestSpec::get("not a url").parse_url().is_err());
        assert!(RequestSpec::get("http://localhost:8000/api").parse_url().is_ok());
    }
}
