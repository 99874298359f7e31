//! Error types for the organization sync service.

use thiserror::Error;

/// Errors that can occur during an org-chart sync run.
///
/// Validation errors are raised before any write and indicate a malformed
/// upstream payload; the caller must fix the data and resubmit. A
/// consistency violation means the closure-table rebuild disagreed with
/// the parent chain; it indicates a bug, aborts the transaction, and is
/// not recoverable by retry. Database errors propagate as a failed run;
/// the single-transaction design guarantees no partial application is
/// left visible.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed payload (duplicate code, empty field, bad role level).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A department references a parent that resolves to nothing.
    #[error("Department '{code}' references unknown parent '{parent_code}'")]
    UnresolvedParent {
        /// The department with the dangling reference.
        code: String,
        /// The parent code that did not resolve.
        parent_code: String,
    },

    /// The proposed parent graph contains a cycle.
    #[error("Cycle detected in department hierarchy involving '{code}'")]
    CycleDetected {
        /// A department on the cycle.
        code: String,
    },

    /// The rebuilt closure table disagrees with the parent chain.
    #[error("Closure table inconsistency: {0}")]
    Consistency(String),

    /// A database error occurred during the run.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SyncError {
    /// Whether this error is a deterministic validation failure
    /// (malformed upstream data, not retryable as-is).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_)
                | SyncError::UnresolvedParent { .. }
                | SyncError::CycleDetected { .. }
        )
    }

    /// Whether this error is a fatal internal consistency violation.
    #[must_use]
    pub fn is_consistency(&self) -> bool {
        matches!(self, SyncError::Consistency(_))
    }
}

/// Convenience Result type for the sync service.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(SyncError::Validation("x".into()).is_validation());
        assert!(SyncError::CycleDetected { code: "a".into() }.is_validation());
        assert!(SyncError::UnresolvedParent {
            code: "a".into(),
            parent_code: "b".into()
        }
        .is_validation());
        assert!(!SyncError::Consistency("x".into()).is_validation());
    }

    #[test]
    fn test_display() {
        let err = SyncError::UnresolvedParent {
            code: "sales-east".into(),
            parent_code: "sales".into(),
        };
        assert_eq!(
            err.to_string(),
            "Department 'sales-east' references unknown parent 'sales'"
        );
    }
}
