//! Error types for the access control service.

use thiserror::Error;

/// Errors that can occur while resolving visibility.
///
/// Missing data (unknown user, no role assignment) is not an error on
/// this path; the service degrades to conservative defaults instead.
/// Only real store failures surface here, because no safe default exists
/// for "I don't know what you can see".
#[derive(Debug, Error)]
pub enum AccessError {
    /// A database error occurred during resolution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience Result type for the access control service.
pub type Result<T> = std::result::Result<T, AccessError>;
