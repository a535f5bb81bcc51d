//! SIMS Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod auth;
pub mod persistence;
pub mod serialization;

pub use adapters::{ReqwestHttpClient, SystemClock};
pub use auth::{BrowserLauncher, CallbackOutcome, CallbackServer, KeycloakProvider, Pkce};
pub use persistence::{
    ConfigError, ConfigRepository, ENV_PREFIX, FileKeyValueStorage, apply_env_overrides,
};
pub use serialization::{
    SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
