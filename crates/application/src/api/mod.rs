//! Outbound API calls.
//!
//! [`ApiClient`] is the bare transport; [`AuthorizedApi`] is the token gate
//! every screen goes through.

mod client;
mod gate;
mod request_builder;

pub use client::{ApiClient, JSON_CONTENT_TYPE};
pub use gate::AuthorizedApi;
pub use request_builder::authorized_request;
