//! Console configuration persistence.
//!
//! Stores the configuration in the platform-specific config directory:
//! - Linux/macOS: ~/.config/sims/config.json
//! - Windows: %APPDATA%/sims/config.json
//!
//! Environment variables prefixed with `SIMS_` override file values.

use std::path::{Path, PathBuf};

use sims_domain::AppConfig;
use tokio::fs;
use tracing::{debug, info};

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Prefix of the override variables.
pub const ENV_PREFIX: &str = "SIMS_";

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// An override variable holds an unusable value.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Repository for the console configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    path: Option<PathBuf>,
}

impl Default for ConfigRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigRepository {
    /// Repository over the default config file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir().map(|p| p.join("sims").join("config.json")),
        }
    }

    /// Repository over an explicit file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Path of the config file, if one could be determined.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads the configuration from disk.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(AppConfig::default());
        };

        match fs::read(path).await {
            Ok(content) => {
                debug!(path = %path.display(), "Loaded config file");
                Ok(from_json_bytes(&content)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Ok(AppConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the file and applies the process environment on top.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or an override is invalid.
    pub async fn load_with_env(&self) -> Result<AppConfig, ConfigError> {
        let config = self.load().await?;
        apply_env_overrides(config, |name| std::env::var(name).ok())
    }

    /// Saves the configuration to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Err(ConfigError::NoConfigDir);
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = to_json_stable_bytes(config)?;
        fs::write(path, content).await?;
        info!(path = %path.display(), "Saved config file");
        Ok(())
    }
}

/// Overrides `config` with `SIMS_*` variables found through `lookup`.
///
/// Recognized: `SIMS_API_BASE_URL`, `SIMS_KEYCLOAK_URL`, `SIMS_REALM`,
/// `SIMS_CLIENT_ID`, `SIMS_REDIRECT_PORT`, `SIMS_STORAGE_PATH`.
///
/// # Errors
///
/// Returns an error if `SIMS_REDIRECT_PORT` is not a port number.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let var = |suffix: &str| {
        let name = format!("{ENV_PREFIX}{suffix}");
        lookup(&name)
            .filter(|value| !value.trim().is_empty())
            .map(|value| (name, value))
    };

    if let Some((_, value)) = var("API_BASE_URL") {
        config.api_base_url = value;
    }
    if let Some((_, value)) = var("KEYCLOAK_URL") {
        config.identity.url = value;
    }
    if let Some((_, value)) = var("REALM") {
        config.identity.realm = value;
    }
    if let Some((_, value)) = var("CLIENT_ID") {
        config.identity.client_id = value;
    }
    if let Some((name, value)) = var("REDIRECT_PORT") {
        config.identity.redirect_port = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value })?;
    }
    if let Some((_, value)) = var("STORAGE_PATH") {
        config.storage_path = Some(PathBuf::from(value));
    }
    Ok(config)
}
