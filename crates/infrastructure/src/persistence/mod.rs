//! File-backed persistence: the token slot file and the config file.

mod config_repository;
mod slot_storage;

pub use config_repository::{ConfigError, ConfigRepository, ENV_PREFIX, apply_env_overrides};
pub use slot_storage::FileKeyValueStorage;
