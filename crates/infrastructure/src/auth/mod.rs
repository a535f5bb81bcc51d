//! Keycloak login: PKCE, the loopback callback and the token endpoint.

mod callback;
mod keycloak_provider;
mod pkce;

pub use callback::{CallbackOutcome, CallbackServer};
pub use keycloak_provider::{BrowserLauncher, KeycloakProvider};
pub use pkce::{Pkce, random_state};
