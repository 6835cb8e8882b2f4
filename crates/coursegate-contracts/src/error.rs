//! Error types for the coursegate access layer.
//!
//! Every fallible operation returns `CoursegateResult<T>`.  Variants follow
//! the access-control error taxonomy: authentication absence, session
//! invalidity and internal validation errors, plus the storage and
//! configuration plumbing beneath them.  Suspicious activity is reported as
//! a `SuspicionReport`, not an error.

use thiserror::Error;

/// The unified error type for the coursegate crates.
#[derive(Debug, Error)]
pub enum CoursegateError {
    /// No actor identity is present. Non-retryable without logging in.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The session token is malformed, expired, or carries an unknown role.
    #[error("session invalid: {reason}")]
    SessionInvalid { reason: String },

    /// Something unexpected happened while running the check sequence.
    #[error("validation error: {reason}")]
    ValidationFailed { reason: String },

    /// The key-value store could not be read or written.
    #[error("storage failed: {reason}")]
    StorageFailed { reason: String },

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl From<serde_json::Error> for CoursegateError {
    fn from(e: serde_json::Error) -> Self {
        CoursegateError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the coursegate crates.
pub type CoursegateResult<T> = Result<T, CoursegateError>;
