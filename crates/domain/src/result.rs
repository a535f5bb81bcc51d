//! Outcome of one outbound API call.
//!
//! Every request made by the screens resolves to a [`RequestResult`]; no
//! error escapes the request boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::response::ResponseSpec;

/// Message shown when a call is attempted without a stored token.
pub const TOKEN_UNAVAILABLE_MESSAGE: &str = "Token not available. Please authenticate.";

/// Fields inspected, in order, for a server-supplied error message.
const SERVER_MESSAGE_FIELDS: [&str; 3] = ["message", "error", "detail"];

/// Status attached to a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum FailureStatus {
    /// The server answered with a non-2xx status.
    Http(u16),
    /// No response was received (timeout, DNS, connection reset).
    Network,
    /// No token was stored, so the call was never sent.
    TokenUnavailable,
}

impl FailureStatus {
    /// Returns the HTTP status code, if the server answered.
    #[must_use]
    pub const fn code(self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(code),
            Self::Network | Self::TokenUnavailable => None,
        }
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Network => f.write_str("Network Error"),
            Self::TokenUnavailable => f.write_str("Token unavailable"),
        }
    }
}

/// A failed call, detached from [`RequestResult`] for use with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallFailure {
    /// Where the failure came from.
    pub status: FailureStatus,
    /// Human-readable message.
    pub message: String,
}

/// Tagged result of a request: the response data or a displayable failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RequestResult {
    /// 2xx response.
    Success {
        /// HTTP status code.
        status: u16,
        /// Parsed JSON body; `Null` when empty, a string when not JSON.
        body: Value,
    },
    /// Anything else.
    Failure {
        /// Where the failure came from.
        status: FailureStatus,
        /// Human-readable message.
        message: String,
    },
}

impl RequestResult {
    /// Failure for a call that was refused locally for lack of a token.
    #[must_use]
    pub fn token_unavailable() -> Self {
        Self::Failure {
            status: FailureStatus::TokenUnavailable,
            message: TOKEN_UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    /// Failure for a call that never got a response.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Failure {
            status: FailureStatus::Network,
            message: message.into(),
        }
    }

    /// Converts a received response into a result.
    ///
    /// Non-2xx responses carry the server's `message` (or `error`/`detail`)
    /// field when the body is a JSON object that has one, and a generic
    /// message otherwise.
    #[must_use]
    pub fn from_response(response: &ResponseSpec) -> Self {
        if response.is_success() {
            return Self::Success {
                status: response.status,
                body: parse_body(&response.body),
            };
        }

        let message = response
            .body_as_json()
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| format!("Request failed with status {}", response.status_code()));

        Self::Failure {
            status: FailureStatus::Http(response.status),
            message,
        }
    }

    /// Returns true for `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the HTTP status code when the server answered.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { status, .. } => status.code(),
        }
    }

    /// Returns the body of a successful result.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    /// Splits the result into the success payload or a [`CallFailure`].
    ///
    /// # Errors
    ///
    /// Returns the failure when the call did not succeed.
    pub fn into_result(self) -> Result<(u16, Value), CallFailure> {
        match self {
            Self::Success { status, body } => Ok((status, body)),
            Self::Failure { status, message } => Err(CallFailure { status, message }),
        }
    }

    /// Returns true if the server rejected the token (HTTP 401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Failure {
                status: FailureStatus::Http(401),
                ..
            }
        )
    }
}

fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn server_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    SERVER_MESSAGE_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn response(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec::new(status, HashMap::new(), body.as_bytes(), Duration::ZERO)
    }

    #[test]
    fn test_success_parses_json() {
        let result = RequestResult::from_response(&response(201, r#"{"id":7}"#));
        assert_eq!(
            result,
            RequestResult::Success {
                status: 201,
                body: json!({"id": 7})
            }
        );
    }

    #[test]
    fn test_no_content_is_null_body() {
        let result = RequestResult::from_response(&response(204, ""));
        assert_eq!(result.body(), Some(&Value::Null));
    }

    #[test]
    fn test_failure_uses_server_message() {
        let result =
            RequestResult::from_response(&response(403, r#"{"message":"Access denied"}"#));
        assert_eq!(
            result,
            RequestResult::Failure {
                status: FailureStatus::Http(403),
                message: "Access denied".to_string()
            }
        );
    }

    #[test]
    fn test_failure_falls_back_to_generic_message() {
        let result = RequestResult::from_response(&response(404, "<html>nope</html>"));
        assert_eq!(result.status_code(), Some(404));
        assert_eq!(
            result.failure_message(),
            Some("Request failed with status 404 Not Found")
        );
    }

    #[test]
    fn test_token_unavailable_has_no_status_code() {
        let result = RequestResult::token_unavailable();
        assert_eq!(result.status_code(), None);
        assert_eq!(result.failure_message(), Some(TOKEN_UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn test_into_result_splits_outcomes() {
        let ok = RequestResult::from_response(&response(200, "[]")).into_result();
        assert_eq!(ok, Ok((200, json!([]))));

        let err = RequestResult::network("connection refused").into_result();
        assert_eq!(
            err,
            Err(CallFailure {
                status: FailureStatus::Network,
                message: "connection refused".to_string()
            })
        );
    }

    #[test]
    fn test_failure_status_display() {
        assert_eq!(FailureStatus::Http(500).to_string(), "500");
        assert_eq!(FailureStatus::Network.to_string(), "Network Error");
        assert!(RequestResult::from_response(&response(401, "")).is_unauthorized());
    }
}
