//! Authentication domain types

mod config;
mod error;
mod session;
mod token;

pub use config::{IdentityConfig, PkceMethod};
pub use error::AuthError;
pub use session::SessionState;
pub use token::{AccessToken, RoleSet, TokenClaims, TokenSet, token_preview};
