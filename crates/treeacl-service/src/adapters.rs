//! Adapters that bridge the storage layer to the domain layer.
//!
//! The domain layer defines what the resolver needs (`NodeReader`,
//! `PermissionStore`); the storage layer implements `AclDataStore` with
//! concrete backends. These adapters translate between the two: node and
//! row shapes, raw tri-state flags, and error types.

use std::sync::Arc;

use async_trait::async_trait;

use treeacl_domain::error::{DomainError, DomainResult};
use treeacl_domain::model::{Node, NodeId, NodeKind, Permission, PermissionValue};
use treeacl_domain::resolver::{NodeReader, PermissionStore};
use treeacl_storage::{AclDataStore, StorageError, StoredNode, StoredNodeKind, StoredPermission};

fn stored_kind(kind: NodeKind) -> StoredNodeKind {
    match kind {
        NodeKind::Aro => StoredNodeKind::Aro,
        NodeKind::Aco => StoredNodeKind::Aco,
    }
}

fn storage_error(e: StorageError) -> DomainError {
    DomainError::Storage {
        message: e.to_string(),
    }
}

fn to_node(stored: StoredNode) -> Node {
    Node {
        id: stored.id,
        parent_id: stored.parent_id,
        alias: stored.alias,
        model: stored.model,
        foreign_key: stored.foreign_key,
    }
}

fn to_permission(stored: StoredPermission) -> DomainResult<Permission> {
    let mut permission = Permission {
        aro_id: stored.aro_id,
        aco_id: stored.aco_id,
        flags: Default::default(),
    };
    for (field, raw) in stored.flags {
        let value = PermissionValue::try_from(raw).map_err(|raw| DomainError::Storage {
            message: format!(
                "row ({}, {}) has invalid value {raw} for '{field}'",
                stored.aro_id, stored.aco_id
            ),
        })?;
        permission.flags.insert(field, value);
    }
    Ok(permission)
}

fn to_stored(permission: Permission) -> StoredPermission {
    StoredPermission {
        aro_id: permission.aro_id,
        aco_id: permission.aco_id,
        flags: permission
            .flags
            .into_iter()
            .map(|(field, value)| (field, value.as_i8()))
            .collect(),
    }
}

/// Adapter that implements `NodeReader` using an `AclDataStore`.
pub struct StoreNodeReader<S: AclDataStore> {
    storage: Arc<S>,
}

impl<S: AclDataStore> StoreNodeReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: AclDataStore> NodeReader for StoreNodeReader<S> {
    async fn find_node(&self, kind: NodeKind, id: NodeId) -> DomainResult<Option<Node>> {
        match self.storage.get_node(stored_kind(kind), id).await {
            Ok(node) => Ok(Some(to_node(node))),
            Err(StorageError::NodeNotFound { .. }) => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn find_by_alias(&self, kind: NodeKind, alias: &str) -> DomainResult<Option<Node>> {
        let node = self
            .storage
            .find_by_alias(stored_kind(kind), alias)
            .await
            .map_err(storage_error)?;
        Ok(node.map(to_node))
    }

    async fn find_child_by_alias(
        &self,
        kind: NodeKind,
        parent: NodeId,
        alias: &str,
    ) -> DomainResult<Option<Node>> {
        let children = self
            .storage
            .find_children(stored_kind(kind), Some(parent))
            .await
            .map_err(storage_error)?;
        Ok(children
            .into_iter()
            .find(|child| child.alias.as_deref() == Some(alias))
            .map(to_node))
    }

    async fn find_by_binding(
        &self,
        kind: NodeKind,
        model: &str,
        foreign_key: &str,
    ) -> DomainResult<Option<Node>> {
        let node = self
            .storage
            .find_by_binding(stored_kind(kind), model, foreign_key)
            .await
            .map_err(storage_error)?;
        Ok(node.map(to_node))
    }
}

/// Adapter that implements `PermissionStore` using an `AclDataStore`.
pub struct StorePermissionStore<S: AclDataStore> {
    storage: Arc<S>,
}

impl<S: AclDataStore> StorePermissionStore<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: AclDataStore> PermissionStore for StorePermissionStore<S> {
    async fn find_permissions(
        &self,
        aro_id: NodeId,
        aco_ids: &[NodeId],
    ) -> DomainResult<Vec<Permission>> {
        self.storage
            .find_permissions(aro_id, aco_ids)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(to_permission)
            .collect()
    }

    async fn find_permission(
        &self,
        aro_id: NodeId,
        aco_id: NodeId,
    ) -> DomainResult<Option<Permission>> {
        self.storage
            .find_permission(aro_id, aco_id)
            .await
            .map_err(storage_error)?
            .map(to_permission)
            .transpose()
    }

    async fn upsert_permission(&self, permission: Permission) -> DomainResult<()> {
        self.storage
            .upsert_permission(to_stored(permission))
            .await
            .map_err(storage_error)
    }
}
