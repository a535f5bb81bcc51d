//! Diagnostic API probes.
//!
//! Each probe is a single authenticated call whose outcome is kept as a
//! small report for display.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use sims_domain::{DomainError, HttpMethod, RequestResult};
use tracing::info;

use crate::api::AuthorizedApi;
use crate::ports::Clock;

/// The diagnostic endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// `GET /api/token`
    Token,
    /// `GET /api/user`
    User,
    /// `GET /api/admin`
    Admin,
    /// `POST /api/createuser`
    CreateUser,
}

impl Probe {
    /// All probes in display order.
    pub const ALL: [Self; 4] = [Self::Token, Self::User, Self::Admin, Self::CreateUser];

    /// Short name, also the in-flight key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::User => "user",
            Self::Admin => "admin",
            Self::CreateUser => "createuser",
        }
    }

    /// API path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Token => "/api/token",
            Self::User => "/api/user",
            Self::Admin => "/api/admin",
            Self::CreateUser => "/api/createuser",
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(self) -> HttpMethod {
        match self {
            Self::CreateUser => HttpMethod::Post,
            Self::Token | Self::User | Self::Admin => HttpMethod::Get,
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Probe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|probe| probe.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::InvalidField {
                field: "probe",
                message: format!("unknown probe {s:?}"),
            })
    }
}

/// Outcome of one probe, shaped like the record shown on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbeReport {
    /// 2xx answer.
    Success {
        /// Always true; kept so the serialized record reads `{"success": true, ...}`.
        success: bool,
        /// HTTP status.
        status: u16,
        /// Response body.
        data: Value,
        /// Payload sent, for probes that send one.
        #[serde(skip_serializing_if = "Option::is_none")]
        sent: Option<Value>,
    },
    /// Any failure.
    Error {
        /// Failure message.
        error: String,
        /// HTTP status, "Network Error" or "Token unavailable".
        status: String,
    },
}

impl ProbeReport {
    fn from_result(result: RequestResult, sent: Option<Value>) -> Self {
        match result {
            RequestResult::Success { status, body } => Self::Success {
                success: true,
                status,
                data: body,
                sent,
            },
            RequestResult::Failure { status, message } => Self::Error {
                error: message,
                status: status.to_string(),
            },
        }
    }

    /// Returns true for a 2xx answer.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Pretty JSON rendering.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Runs diagnostic probes through the token gate.
#[derive(Clone)]
pub struct Diagnostics {
    api: AuthorizedApi,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").field("api", &self.api).finish_non_exhaustive()
    }
}

impl Diagnostics {
    /// Creates a runner over `api`.
    #[must_use]
    pub fn new(api: AuthorizedApi, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }

    /// Sends `probe` and reports the outcome.
    pub async fn run(&self, probe: Probe) -> ProbeReport {
        let sent = (probe == Probe::CreateUser).then(|| self.test_user());
        let result = self.api.send(probe.method(), probe.path(), sent.clone()).await;
        info!(probe = probe.name(), success = result.is_success(), "Probe finished");
        ProbeReport::from_result(result, sent)
    }

    /// Generated account sent by the create-user probe.
    #[must_use]
    pub fn test_user(&self) -> Value {
        json!({
            "username": format!("testuser_{}", self.clock.now().timestamp_millis()),
            "email": "test@example.com",
            "firstName": "Test",
            "lastName": "User",
        })
    }
}
