//! Application configuration model.
//!
//! Defaults point at the demo Keycloak realm and a local API server.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::auth::IdentityConfig;

/// Runtime configuration for the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the REST API; paths such as `/api/repas` are appended.
    pub api_base_url: String,
    /// Identity provider settings.
    pub identity: IdentityConfig,
    /// Where the browser goes after logout.
    pub logout_redirect_uri: String,
    /// Transport timeout for API calls, in seconds.
    pub request_timeout_secs: u64,
    /// Remove the stored token on logout.
    pub scrub_token_on_logout: bool,
    /// Target of the session screen's "send HTTP request" action.
    pub probe_url: String,
    /// Override for the slot storage file; platform data dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            identity: IdentityConfig::default(),
            logout_redirect_uri: "http://localhost:3001/".to_string(),
            request_timeout_secs: 10,
            scrub_token_on_logout: false,
            probe_url: "https://mockbin.com/request".to_string(),
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Joins an API path onto the base URL.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
