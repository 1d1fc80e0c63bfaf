//! Storage error types.

use thiserror::Error;

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Node not found.
    #[error("{kind} node not found: {node_id}")]
    NodeNotFound { kind: &'static str, node_id: u64 },

    /// A sibling with the same alias already exists under the parent.
    #[error("duplicate {kind} alias '{alias}' under parent {parent:?}")]
    DuplicateAlias {
        kind: &'static str,
        alias: String,
        parent: Option<u64>,
    },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Internal error.
    #[error("internal storage error: {message}")]
    InternalError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
