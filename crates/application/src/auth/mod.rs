//! Authentication: the persisted token and the login session.

mod session;
mod token_store;

pub use session::{AuthSession, ExpiredHandler, ExpirySource};
pub use token_store::{TOKEN_SLOT, TokenStore};
