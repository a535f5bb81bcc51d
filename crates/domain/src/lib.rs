//! SIMS Domain - Core business types
//!
//! This crate defines the domain model for the SIMS console: requests and
//! responses, bearer tokens and their claims, the meal resource and the
//! screen state machine. All types here are pure Rust with no I/O.

pub mod auth;
pub mod error;
pub mod meal;
pub mod request;
pub mod response;
pub mod result;
pub mod settings;
pub mod state;

pub use auth::{
    AccessToken, AuthError, IdentityConfig, PkceMethod, RoleSet, SessionState, TokenClaims,
    TokenSet, token_preview,
};
pub use error::{DomainError, DomainResult};
pub use meal::{DEFAULT_OWNER_ID, Meal, MealCategory, MealForm, MealId};
pub use request::{AUTHORIZATION, CONTENT_TYPE, Header, Headers, HttpMethod, RequestSpec};
pub use response::{ResponseSpec, StatusCode};
pub use result::{CallFailure, FailureStatus, RequestResult, TOKEN_UNAVAILABLE_MESSAGE};
pub use settings::AppConfig;
pub use state::ScreenState;
