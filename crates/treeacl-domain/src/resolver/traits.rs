//! Traits for storage operations needed by the resolver.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{Node, NodeId, NodeKind, Permission};

/// Read access to the ARO and ACO forests.
#[async_trait]
pub trait NodeReader: Send + Sync {
    /// Finds a node by id.
    async fn find_node(&self, kind: NodeKind, id: NodeId) -> DomainResult<Option<Node>>;

    /// Finds the lowest-id node carrying `alias`, at any depth.
    async fn find_by_alias(&self, kind: NodeKind, alias: &str) -> DomainResult<Option<Node>>;

    /// Finds the direct child of `parent` carrying `alias`.
    async fn find_child_by_alias(
        &self,
        kind: NodeKind,
        parent: NodeId,
        alias: &str,
    ) -> DomainResult<Option<Node>>;

    /// Finds the node bound to a host record.
    async fn find_by_binding(
        &self,
        kind: NodeKind,
        model: &str,
        foreign_key: &str,
    ) -> DomainResult<Option<Node>>;
}

/// Read/write access to the permission table.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Rows for `aro_id` against any of `aco_ids`, in no particular order.
    async fn find_permissions(
        &self,
        aro_id: NodeId,
        aco_ids: &[NodeId],
    ) -> DomainResult<Vec<Permission>>;

    /// The row for one (aro, aco) pair, if it exists.
    async fn find_permission(
        &self,
        aro_id: NodeId,
        aco_id: NodeId,
    ) -> DomainResult<Option<Permission>>;

    /// Inserts or replaces the row for `(permission.aro_id, permission.aco_id)`.
    async fn upsert_permission(&self, permission: Permission) -> DomainResult<()>;
}
