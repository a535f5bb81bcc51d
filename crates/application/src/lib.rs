//! SIMS Application - Use cases and ports
//!
//! This crate defines the application layer with:
//! - Port traits (HTTP transport, key/value storage, identity provider, clock)
//! - The persisted token store and the login session
//! - The token-gated API client, typed resource CRUD and diagnostic probes

pub mod api;
pub mod auth;
pub mod diagnostics;
pub mod error;
pub mod in_flight;
pub mod ports;
pub mod resources;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, AuthorizedApi, authorized_request};
pub use auth::{AuthSession, ExpirySource, TOKEN_SLOT, TokenStore};
pub use diagnostics::{Diagnostics, Probe, ProbeReport};
pub use error::{ApplicationError, ApplicationResult};
pub use in_flight::{InFlight, InFlightGuard, OperationKey};
pub use ports::{Clock, HttpClient, HttpClientError, IdentityProvider, KeyValueStorage, StorageError};
pub use resources::{MealsClient, Resource, ResourceClient, ResourceError};
