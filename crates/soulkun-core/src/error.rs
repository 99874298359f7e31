//! Error Types
//!
//! This module provides standardized error types for Soul-kun.
//!
//! # Example
//!
//! ```
//! use soulkun_core::{SoulkunError, Result};
//!
//! fn check_code(code: &str) -> Result<()> {
//!     if code.is_empty() {
//!         return Err(SoulkunError::Validation {
//!             field: "code".to_string(),
//!             message: "must not be empty".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

/// Standardized error type for Soul-kun.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SoulkunError {
    /// Input validation failure.
    #[error("Validation error on field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

/// Type alias for Results using `SoulkunError`.
pub type Result<T> = std::result::Result<T, SoulkunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = SoulkunError::Validation {
            field: "parent_code".to_string(),
            message: "unresolved reference".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error on field 'parent_code': unresolved reference"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let err = SoulkunError::Validation {
            field: "code".to_string(),
            message: "empty".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "validation");
        assert_eq!(json["field"], "code");
    }
}
