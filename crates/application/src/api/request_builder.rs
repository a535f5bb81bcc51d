//! Builds fully-headered API requests.

use serde_json::Value;
use sims_domain::{CONTENT_TYPE, Header, HttpMethod, RequestSpec};

use super::JSON_CONTENT_TYPE;

/// Request carrying `Authorization: Bearer <token>` and a JSON content type.
#[must_use]
pub fn authorized_request(
    method: HttpMethod,
    url: impl Into<String>,
    body: Option<Value>,
    token: &str,
) -> RequestSpec {
    let mut request = RequestSpec::new(method, url)
        .with_header(Header::bearer(token))
        .with_header(Header::new(CONTENT_TYPE, JSON_CONTENT_TYPE));
    request.body = body;
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sims_domain::AUTHORIZATION;

    #[test]
    fn test_headers_attached() {
        let request = authorized_request(
            HttpMethod::Post,
            "http://localhost:8000/api/repas",
            Some(json!({"nom": "Salade"})),
            "abc.def.ghi",
        );
        assert_eq!(request.headers.get(AUTHORIZATION), Some("Bearer abc.def.ghi"));
        assert_eq!(request.headers.get("content-type"), Some("application/json"));
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.body, Some(json!({"nom": "Salade"})));
    }

    #[test]
    fn test_get_has_no_body() {
        let request = authorized_request(HttpMethod::Get, "http://x/api/user", None, "t");
        assert!(request.body.is_none());
    }
}
