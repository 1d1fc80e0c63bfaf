//! Mock implementations for resolver testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DomainError, DomainResult};
use crate::model::{Node, NodeId, NodeKind, Permission, PermissionValue};
use crate::resolver::{DbAcl, NodeReader, PermissionStore};

/// Mock node reader for testing.
pub struct MockNodeReader {
    nodes: RwLock<HashMap<(NodeKind, NodeId), Node>>,
}

impl MockNodeReader {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add_node(&self, kind: NodeKind, id: NodeId, parent_id: Option<NodeId>, alias: &str) {
        self.insert(
            kind,
            Node {
                id,
                parent_id,
                alias: Some(alias.to_string()),
                model: None,
                foreign_key: None,
            },
        )
        .await;
    }

    pub async fn insert(&self, kind: NodeKind, node: Node) {
        self.nodes.write().await.insert((kind, node.id), node);
    }

    async fn find_first<F>(&self, kind: NodeKind, predicate: F) -> Option<Node>
    where
        F: Fn(&Node) -> bool,
    {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|((k, _), node)| *k == kind && predicate(node))
            .map(|(_, node)| node.clone())
            .min_by_key(|node| node.id)
    }
}

#[async_trait]
impl NodeReader for MockNodeReader {
    async fn find_node(&self, kind: NodeKind, id: NodeId) -> DomainResult<Option<Node>> {
        Ok(self.nodes.read().await.get(&(kind, id)).cloned())
    }

    async fn find_by_alias(&self, kind: NodeKind, alias: &str) -> DomainResult<Option<Node>> {
        Ok(self
            .find_first(kind, |n| n.alias.as_deref() == Some(alias))
            .await)
    }

    async fn find_child_by_alias(
        &self,
        kind: NodeKind,
        parent: NodeId,
        alias: &str,
    ) -> DomainResult<Option<Node>> {
        Ok(self
            .find_first(kind, |n| {
                n.parent_id == Some(parent) && n.alias.as_deref() == Some(alias)
            })
            .await)
    }

    async fn find_by_binding(
        &self,
        kind: NodeKind,
        model: &str,
        foreign_key: &str,
    ) -> DomainResult<Option<Node>> {
        Ok(self
            .find_first(kind, |n| {
                n.model.as_deref() == Some(model) && n.foreign_key.as_deref() == Some(foreign_key)
            })
            .await)
    }
}

/// Mock permission table for testing.
pub struct MockPermissionStore {
    rows: RwLock<HashMap<(NodeId, NodeId), Permission>>,
    fail_reads: AtomicBool,
}

impl MockPermissionStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Stores a row with the given fields; unspecified fields are absent.
    pub async fn set_row(&self, aro_id: NodeId, aco_id: NodeId, flags: &[(&str, PermissionValue)]) {
        let permission = Permission {
            aro_id,
            aco_id,
            flags: flags.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        };
        self.rows.write().await.insert((aro_id, aco_id), permission);
    }

    pub async fn get_row(&self, aro_id: NodeId, aco_id: NodeId) -> Option<Permission> {
        self.rows.read().await.get(&(aro_id, aco_id)).cloned()
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Makes every subsequent read fail with a storage error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> DomainResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::Storage {
                message: "permission table unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MockPermissionStore {
    async fn find_permissions(
        &self,
        aro_id: NodeId,
        aco_ids: &[NodeId],
    ) -> DomainResult<Vec<Permission>> {
        self.check_available()?;
        // Lowest ACO id first, which puts roots before their descendants
        let mut rows: Vec<Permission> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| p.aro_id == aro_id && aco_ids.contains(&p.aco_id))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.aco_id);
        Ok(rows)
    }

    async fn find_permission(
        &self,
        aro_id: NodeId,
        aco_id: NodeId,
    ) -> DomainResult<Option<Permission>> {
        self.check_available()?;
        Ok(self.get_row(aro_id, aco_id).await)
    }

    async fn upsert_permission(&self, permission: Permission) -> DomainResult<()> {
        self.rows
            .write()
            .await
            .insert((permission.aro_id, permission.aco_id), permission);
        Ok(())
    }
}

// ARO ids
pub const ADMINS: NodeId = 1;
pub const USER_X: NodeId = 2;
pub const EDITORS: NodeId = 3;
pub const STAFF: NodeId = 4;
pub const BOB: NodeId = 5;

// ACO ids
pub const CONTROLLERS: NodeId = 1;
pub const USERS: NodeId = 2;
pub const EDIT: NodeId = 3;
pub const VIEW: NodeId = 4;
pub const POSTS: NodeId = 5;

/// Builds the shared fixture forests:
///
/// ```text
/// ARO: Admins ─ UserX            ACO: controllers ─ Users ─ edit
///      Editors ─ Staff ─ bob                      │       └ view
///                                                 └ Posts
/// ```
pub async fn fixture_nodes() -> Arc<MockNodeReader> {
    let nodes = Arc::new(MockNodeReader::new());
    nodes.add_node(NodeKind::Aro, ADMINS, None, "Admins").await;
    nodes.add_node(NodeKind::Aro, USER_X, Some(ADMINS), "UserX").await;
    nodes.add_node(NodeKind::Aro, EDITORS, None, "Editors").await;
    nodes.add_node(NodeKind::Aro, STAFF, Some(EDITORS), "Staff").await;
    nodes.add_node(NodeKind::Aro, BOB, Some(STAFF), "bob").await;

    nodes.add_node(NodeKind::Aco, CONTROLLERS, None, "controllers").await;
    nodes.add_node(NodeKind::Aco, USERS, Some(CONTROLLERS), "Users").await;
    nodes.add_node(NodeKind::Aco, EDIT, Some(USERS), "edit").await;
    nodes.add_node(NodeKind::Aco, VIEW, Some(USERS), "view").await;
    nodes.add_node(NodeKind::Aco, POSTS, Some(CONTROLLERS), "Posts").await;
    nodes
}

/// Fixture forests, an empty permission table and an ACL over both.
pub async fn fixture_acl() -> (
    DbAcl<MockNodeReader, MockPermissionStore>,
    Arc<MockPermissionStore>,
) {
    let nodes = fixture_nodes().await;
    let permissions = Arc::new(MockPermissionStore::new());
    let acl = DbAcl::new(nodes, Arc::clone(&permissions));
    (acl, permissions)
}
