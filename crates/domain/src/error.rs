//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A required field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field holds a value of the wrong shape.
    #[error("invalid {field}: {message}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The category is not one of the known meal types.
    #[error("unknown meal category: {0}")]
    UnknownCategory(String),

    /// A bearer token could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
