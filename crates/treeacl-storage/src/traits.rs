//! AclDataStore trait definition.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Which of the two node forests a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoredNodeKind {
    /// Access request objects (users, roles).
    Aro,
    /// Access control objects (resources, controller actions).
    Aco,
}

impl StoredNodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoredNodeKind::Aro => "aro",
            StoredNodeKind::Aco => "aco",
        }
    }
}

impl fmt::Display for StoredNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored ARO or ACO node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub id: u64,
    pub parent_id: Option<u64>,
    pub alias: Option<String>,
    pub model: Option<String>,
    pub foreign_key: Option<String>,
}

/// Input for creating a node. The store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNode {
    pub parent_id: Option<u64>,
    pub alias: Option<String>,
    pub model: Option<String>,
    pub foreign_key: Option<String>,
}

impl NewNode {
    /// Creates a node input carrying only an alias.
    pub fn with_alias(parent_id: Option<u64>, alias: impl Into<String>) -> Self {
        Self {
            parent_id,
            alias: Some(alias.into()),
            ..Default::default()
        }
    }

    /// Attaches a model/foreign key binding.
    pub fn bound_to(mut self, model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self.foreign_key = Some(foreign_key.into());
        self
    }
}

/// A stored permission row linking one ARO to one ACO.
///
/// `flags` maps action field names (e.g. `_read`) to raw tri-state values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPermission {
    pub aro_id: u64,
    pub aco_id: u64,
    pub flags: BTreeMap<String, i8>,
}

/// Abstract storage interface for ACL data.
///
/// Implementations must be thread-safe (Send + Sync). Consistency of
/// concurrent upserts is left to the backend: last write wins per row.
#[async_trait]
pub trait AclDataStore: Send + Sync + 'static {
    // Node operations

    /// Creates a node. Fails if the parent does not exist or a sibling
    /// already carries the same alias.
    async fn create_node(&self, kind: StoredNodeKind, node: NewNode) -> StorageResult<StoredNode>;

    /// Gets a node by id.
    async fn get_node(&self, kind: StoredNodeKind, id: u64) -> StorageResult<StoredNode>;

    /// Deletes a node, its whole subtree and every permission row that
    /// references a removed node.
    async fn delete_node(&self, kind: StoredNodeKind, id: u64) -> StorageResult<()>;

    /// Lists the direct children of `parent_id` (roots when `None`), ordered by id.
    async fn find_children(
        &self,
        kind: StoredNodeKind,
        parent_id: Option<u64>,
    ) -> StorageResult<Vec<StoredNode>>;

    /// Finds the lowest-id node carrying `alias`, at any depth.
    async fn find_by_alias(
        &self,
        kind: StoredNodeKind,
        alias: &str,
    ) -> StorageResult<Option<StoredNode>>;

    /// Finds the node bound to a host record.
    async fn find_by_binding(
        &self,
        kind: StoredNodeKind,
        model: &str,
        foreign_key: &str,
    ) -> StorageResult<Option<StoredNode>>;

    // Permission operations

    /// Reads all rows for `aro_id` whose ACO is one of `aco_ids`.
    /// No ordering is guaranteed.
    async fn find_permissions(
        &self,
        aro_id: u64,
        aco_ids: &[u64],
    ) -> StorageResult<Vec<StoredPermission>>;

    /// Reads the row for one (aro, aco) pair.
    async fn find_permission(
        &self,
        aro_id: u64,
        aco_id: u64,
    ) -> StorageResult<Option<StoredPermission>>;

    /// Inserts the row or replaces the existing row for the same pair.
    async fn upsert_permission(&self, permission: StoredPermission) -> StorageResult<()>;
}

/// Validates a node alias.
///
/// Aliases must be usable as one segment of a slash path: no `/`, no
/// surrounding whitespace (path segments are trimmed before matching) and no
/// `::` (which marks a model binding).
pub fn validate_alias(alias: &str) -> StorageResult<()> {
    if alias.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: "alias cannot be empty".to_string(),
        });
    }
    if alias != alias.trim() {
        return Err(StorageError::InvalidInput {
            message: format!("alias '{alias}' cannot start or end with whitespace"),
        });
    }
    if alias.contains('/') || alias.contains("::") {
        return Err(StorageError::InvalidInput {
            message: format!("alias '{alias}' cannot contain '/' or '::'"),
        });
    }
    Ok(())
}

/// Validates that every flag of a permission row is a tri-state value.
pub fn validate_permission(permission: &StoredPermission) -> StorageResult<()> {
    for (field, value) in &permission.flags {
        if field.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "permission field name cannot be empty".to_string(),
            });
        }
        if !(-1..=1).contains(value) {
            return Err(StorageError::InvalidInput {
                message: format!(
                    "permission field '{field}' must be -1, 0 or 1, got {value}"
                ),
            });
        }
    }
    Ok(())
}
