//! Domain error types for ACL operations.

use thiserror::Error;

use crate::model::NodeKind;

/// Domain-specific errors for ACL operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Identifier does not resolve to a node.
    #[error("{kind} node not found: {identifier}")]
    NodeNotFound { kind: NodeKind, identifier: String },

    /// Node lookup for a permission link failed.
    #[error("invalid node for permission link: {message}")]
    InvalidNode { message: String },

    /// Action is not part of the configured action set.
    #[error("unknown action '{action}' (known: {known})")]
    UnknownAction { action: String, known: String },

    /// Parent chain is longer than the configured limit, so the stored
    /// forest is assumed to contain a cycle.
    #[error("cycle detected walking {kind} ancestors of node {node_id} (max depth: {max_depth})")]
    CycleDetected {
        kind: NodeKind,
        node_id: u64,
        max_depth: usize,
    },

    /// Invalid resolver or backend configuration.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Malformed flat-file ACL definition.
    #[error("ini parse error on line {line}: {message}")]
    IniParse { line: usize, message: String },

    /// Failure reading the flat-file ACL definition.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error reported by the backing store.
    #[error("storage error: {message}")]
    Storage { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
