//! Error types for Gnosis.
//!
//! All errors in Gnosis are strongly typed using thiserror.
//! "No match" and "ambiguous match" are not errors: they are reported
//! through result types such as [`crate::resolver::PersonMatch`].

use thiserror::Error;

use crate::entity::{EntityKind, NodeId};
use crate::model::BookmarkId;
use crate::storage::StorageError;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A search that must narrow its results had only stopwords.
    #[error("Query '{query}' has no searchable tokens after stopword removal")]
    NoSearchTokens {
        /// The rejected query text.
        query: String,
    },

    /// A person name with no parts.
    #[error("Person name cannot be empty")]
    EmptyName,

    /// A required input was absent or blank.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Name of the missing input.
        field: String,
    },

    /// An input longer than its limit.
    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    FieldTooLong {
        /// Name of the oversized input.
        field: String,
        /// Largest accepted length in bytes.
        max_length: usize,
    },

    /// A result limit of zero.
    #[error("Limit for '{field}' must be greater than zero")]
    InvalidLimit {
        /// Name of the limit setting.
        field: String,
    },

    /// A year outside `1..=9999`.
    #[error("Publication year {value} is out of range")]
    InvalidYear {
        /// The rejected year.
        value: i32,
    },

    /// Configuration that could not be parsed.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Parser message.
        reason: String,
    },

    /// A property name that is not a plain identifier.
    #[error("'{field}' is not a valid property name")]
    InvalidField {
        /// The rejected property name.
        field: String,
    },

    /// Tokens that did not compile into a search pattern.
    #[error("Invalid search pattern: {reason}")]
    InvalidPattern {
        /// Regex compiler message.
        reason: String,
    },
}

/// Execution errors that occur while running catalog operations.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No node with this id exists.
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// The missing id.
        id: NodeId,
    },

    /// The node exists under a different label.
    #[error("Node {id} is a {actual}, expected a {expected}")]
    KindMismatch {
        /// The node looked up.
        id: NodeId,
        /// Kind the caller asked for.
        expected: EntityKind,
        /// Kind actually stored.
        actual: EntityKind,
    },

    /// No bookmark with this id exists for the caller.
    #[error("Bookmark not found: {id}")]
    BookmarkNotFound {
        /// The missing bookmark.
        id: BookmarkId,
    },

    /// Any other backend failure.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend message.
        message: String,
    },
}

/// Top-level error type for Gnosis.
#[derive(Debug, Error)]
pub enum GnosisError {
    /// Bad caller input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation failed against the stores.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// A broken internal invariant.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl From<StorageError> for GnosisError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NodeNotFound(id) => ExecutionError::NodeNotFound { id }.into(),
            StorageError::KindMismatch {
                id,
                expected,
                actual,
            } => ExecutionError::KindMismatch {
                id,
                expected,
                actual,
            }
            .into(),
            StorageError::BookmarkNotFound(id) => ExecutionError::BookmarkNotFound { id }.into(),
            other => ExecutionError::Storage {
                message: other.to_string(),
            }
            .into(),
        }
    }
}

impl GnosisError {
    /// Creates an internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if the error reports a missing node or bookmark.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Execution(
                ExecutionError::NodeNotFound { .. } | ExecutionError::BookmarkNotFound { .. }
            )
        )
    }
}

/// Result type alias for Gnosis operations.
pub type GnosisResult<T> = Result<T, GnosisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_no_tokens() {
        let err = ValidationError::NoSearchTokens {
            query: "of the".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("of the"));
        assert!(msg.contains("no searchable tokens"));
    }

    #[test]
    fn test_execution_error_kind_mismatch() {
        let err = ExecutionError::KindMismatch {
            id: NodeId::new(),
            expected: EntityKind::Paper,
            actual: EntityKind::Venue,
        };
        let msg = format!("{err}");
        assert!(msg.contains("venue"));
        assert!(msg.contains("paper"));
    }

    #[test]
    fn test_gnosis_error_from_validation() {
        let err: GnosisError = ValidationError::EmptyName.into();
        assert!(err.is_validation());
        assert!(!err.is_execution());
    }

    #[test]
    fn test_storage_not_found_maps_to_execution() {
        let id = NodeId::new();
        let err: GnosisError = StorageError::NodeNotFound(id).into();
        assert!(err.is_execution());
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_storage_backend_error_maps_to_storage() {
        let err: GnosisError = StorageError::BackendError("poisoned lock".to_string()).into();
        assert!(matches!(
            err,
            GnosisError::Execution(ExecutionError::Storage { .. })
        ));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_gnosis_error_internal() {
        let err = GnosisError::internal("unexpected state");
        assert!(err.is_internal());
        assert!(err.to_string().contains("unexpected state"));
    }
}
