//! In-memory storage implementation.
//!
//! Nodes are kept in one `DashMap` per forest. A secondary alias index keyed
//! by `(kind, parent, alias)` lets node creation enforce sibling uniqueness
//! atomically through the entry API instead of a check-then-insert.
//!
//! Writes that depend on another node existing (creating a child, upserting a
//! row) hold the shared side of a structure lock; cascading deletes hold the
//! exclusive side. A delete therefore never interleaves with a create under
//! the node being removed, so no orphan or stale alias entry survives it.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    validate_alias, validate_permission, AclDataStore, NewNode, StoredNode, StoredNodeKind,
    StoredPermission,
};

type AliasKey = (StoredNodeKind, Option<u64>, String);

/// In-memory implementation of AclDataStore.
///
/// # Performance Characteristics
///
/// - **Get node / find permission / upsert**: O(1) average (DashMap lookup)
/// - **Find children / find by binding**: O(N) over the forest
/// - **Delete node**: O(N + P) where P is the number of permission rows
#[derive(Debug)]
pub struct MemoryAclStore {
    aros: DashMap<u64, StoredNode>,
    acos: DashMap<u64, StoredNode>,
    aliases: DashMap<AliasKey, u64>,
    /// Permission rows keyed by (aro_id, aco_id).
    permissions: DashMap<(u64, u64), StoredPermission>,
    /// Shared for inserts that reference an existing node, exclusive for deletes.
    structure: RwLock<()>,
    next_aro_id: AtomicU64,
    next_aco_id: AtomicU64,
}

impl Default for MemoryAclStore {
    fn default() -> Self {
        Self {
            aros: DashMap::new(),
            acos: DashMap::new(),
            aliases: DashMap::new(),
            permissions: DashMap::new(),
            structure: RwLock::new(()),
            next_aro_id: AtomicU64::new(1),
            next_aco_id: AtomicU64::new(1),
        }
    }
}

impl MemoryAclStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of permission rows currently stored.
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    fn nodes(&self, kind: StoredNodeKind) -> &DashMap<u64, StoredNode> {
        match kind {
            StoredNodeKind::Aro => &self.aros,
            StoredNodeKind::Aco => &self.acos,
        }
    }

    fn next_id(&self, kind: StoredNodeKind) -> u64 {
        let counter = match kind {
            StoredNodeKind::Aro => &self.next_aro_id,
            StoredNodeKind::Aco => &self.next_aco_id,
        };
        counter.fetch_add(1, Ordering::Relaxed)
    }

    fn not_found(kind: StoredNodeKind, node_id: u64) -> StorageError {
        StorageError::NodeNotFound {
            kind: kind.as_str(),
            node_id,
        }
    }

    /// Collects `root` and all of its descendants.
    fn collect_subtree(&self, kind: StoredNodeKind, root: u64) -> HashSet<u64> {
        let nodes = self.nodes(kind);
        let mut subtree = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);

        while let Some(current) = queue.pop_front() {
            let children: Vec<u64> = nodes
                .iter()
                .filter(|n| n.parent_id == Some(current))
                .map(|n| n.id)
                .collect();
            for child in children {
                if subtree.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        subtree
    }
}

#[async_trait]
impl AclDataStore for MemoryAclStore {
    #[instrument(skip_all, fields(kind = %kind))]
    async fn create_node(&self, kind: StoredNodeKind, node: NewNode) -> StorageResult<StoredNode> {
        if let Some(alias) = &node.alias {
            validate_alias(alias)?;
        }

        let _structure = self.structure.read();
        if let Some(parent_id) = node.parent_id {
            if !self.nodes(kind).contains_key(&parent_id) {
                return Err(Self::not_found(kind, parent_id));
            }
        }

        let id = self.next_id(kind);

        // Reserve the alias atomically before the node becomes visible
        if let Some(alias) = &node.alias {
            match self.aliases.entry((kind, node.parent_id, alias.clone())) {
                Entry::Occupied(_) => {
                    return Err(StorageError::DuplicateAlias {
                        kind: kind.as_str(),
                        alias: alias.clone(),
                        parent: node.parent_id,
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(id);
                }
            }
        }

        let stored = StoredNode {
            id,
            parent_id: node.parent_id,
            alias: node.alias,
            model: node.model,
            foreign_key: node.foreign_key,
        };
        self.nodes(kind).insert(id, stored.clone());
        debug!(node_id = id, "created node");

        Ok(stored)
    }

    async fn get_node(&self, kind: StoredNodeKind, id: u64) -> StorageResult<StoredNode> {
        self.nodes(kind)
            .get(&id)
            .map(|n| n.value().clone())
            .ok_or_else(|| Self::not_found(kind, id))
    }

    #[instrument(skip(self, kind), fields(kind = %kind))]
    async fn delete_node(&self, kind: StoredNodeKind, id: u64) -> StorageResult<()> {
        let _structure = self.structure.write();
        if !self.nodes(kind).contains_key(&id) {
            return Err(Self::not_found(kind, id));
        }

        let subtree = self.collect_subtree(kind, id);
        for node_id in &subtree {
            if let Some((_, node)) = self.nodes(kind).remove(node_id) {
                if let Some(alias) = node.alias {
                    self.aliases.remove(&(kind, node.parent_id, alias));
                }
            }
        }

        self.permissions.retain(|(aro_id, aco_id), _| match kind {
            StoredNodeKind::Aro => !subtree.contains(aro_id),
            StoredNodeKind::Aco => !subtree.contains(aco_id),
        });
        debug!(removed = subtree.len(), "deleted node subtree");

        Ok(())
    }

    async fn find_children(
        &self,
        kind: StoredNodeKind,
        parent_id: Option<u64>,
    ) -> StorageResult<Vec<StoredNode>> {
        let mut children: Vec<StoredNode> = self
            .nodes(kind)
            .iter()
            .filter(|n| n.parent_id == parent_id)
            .map(|n| n.value().clone())
            .collect();
        children.sort_by_key(|n| n.id);
        Ok(children)
    }

    async fn find_by_alias(
        &self,
        kind: StoredNodeKind,
        alias: &str,
    ) -> StorageResult<Option<StoredNode>> {
        Ok(self
            .nodes(kind)
            .iter()
            .filter(|n| n.alias.as_deref() == Some(alias))
            .map(|n| n.value().clone())
            .min_by_key(|n| n.id))
    }

    async fn find_by_binding(
        &self,
        kind: StoredNodeKind,
        model: &str,
        foreign_key: &str,
    ) -> StorageResult<Option<StoredNode>> {
        Ok(self
            .nodes(kind)
            .iter()
            .filter(|n| {
                n.model.as_deref() == Some(model) && n.foreign_key.as_deref() == Some(foreign_key)
            })
            .map(|n| n.value().clone())
            .min_by_key(|n| n.id))
    }

    async fn find_permissions(
        &self,
        aro_id: u64,
        aco_ids: &[u64],
    ) -> StorageResult<Vec<StoredPermission>> {
        Ok(aco_ids
            .iter()
            .filter_map(|aco_id| self.permissions.get(&(aro_id, *aco_id)))
            .map(|p| p.value().clone())
            .collect())
    }

    async fn find_permission(
        &self,
        aro_id: u64,
        aco_id: u64,
    ) -> StorageResult<Option<StoredPermission>> {
        Ok(self
            .permissions
            .get(&(aro_id, aco_id))
            .map(|p| p.value().clone()))
    }

    #[instrument(skip(self, permission), fields(aro_id = permission.aro_id, aco_id = permission.aco_id))]
    async fn upsert_permission(&self, permission: StoredPermission) -> StorageResult<()> {
        validate_permission(&permission)?;

        let _structure = self.structure.read();
        if !self.aros.contains_key(&permission.aro_id) {
            return Err(Self::not_found(StoredNodeKind::Aro, permission.aro_id));
        }
        if !self.acos.contains_key(&permission.aco_id) {
            return Err(Self::not_found(StoredNodeKind::Aco, permission.aco_id));
        }

        self.permissions
            .insert((permission.aro_id, permission.aco_id), permission);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn row(aro_id: u64, aco_id: u64, flags: &[(&str, i8)]) -> StoredPermission {
        StoredPermission {
            aro_id,
            aco_id,
            flags: flags
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    // Test: store can be created empty
    #[tokio::test]
    async fn test_memory_store_can_be_created() {
        let store = MemoryAclStore::new();
        let roots = store.find_children(StoredNodeKind::Aro, None).await.unwrap();
        assert!(roots.is_empty());
        assert_eq!(store.permission_count(), 0);
    }

    // Test: store can be shared through Arc
    #[tokio::test]
    async fn test_memory_store_shared() {
        let store = MemoryAclStore::new_shared();
        let node = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "controllers"))
            .await
            .unwrap();

        let store2 = Arc::clone(&store);
        let retrieved = store2.get_node(StoredNodeKind::Aco, node.id).await.unwrap();
        assert_eq!(retrieved.alias.as_deref(), Some("controllers"));
    }

    #[tokio::test]
    async fn test_forests_are_independent() {
        let store = MemoryAclStore::new();
        let aro = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "users"))
            .await
            .unwrap();
        let aco = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "users"))
            .await
            .unwrap();

        // Ids are assigned per forest, so both start at 1
        assert_eq!(aro.id, 1);
        assert_eq!(aco.id, 1);
        assert_eq!(
            store.find_children(StoredNodeKind::Aro, None).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_create_node_rejects_unknown_parent() {
        let store = MemoryAclStore::new();
        let result = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(Some(42), "orphan"))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::NodeNotFound { node_id: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_node_rejects_padded_alias() {
        let store = MemoryAclStore::new();
        let result = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, " Admins "))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidInput { .. })));
        assert!(store
            .find_by_alias(StoredNodeKind::Aro, " Admins ")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_create_node_rejects_duplicate_sibling_alias() {
        let store = MemoryAclStore::new();
        let root = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "controllers"))
            .await
            .unwrap();
        store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(Some(root.id), "Users"))
            .await
            .unwrap();

        let duplicate = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(Some(root.id), "Users"))
            .await;
        assert!(matches!(duplicate, Err(StorageError::DuplicateAlias { .. })));

        // Same alias under a different parent is fine
        assert!(store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "Users"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_find_by_alias_matches_any_depth() {
        let store = MemoryAclStore::new();
        let admins = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "Admins"))
            .await
            .unwrap();
        let user = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(Some(admins.id), "UserX"))
            .await
            .unwrap();

        let found = store
            .find_by_alias(StoredNodeKind::Aro, "UserX")
            .await
            .unwrap();
        assert_eq!(found.map(|n| n.id), Some(user.id));
        assert!(store
            .find_by_alias(StoredNodeKind::Aco, "UserX")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_binding() {
        let store = MemoryAclStore::new();
        let node = store
            .create_node(
                StoredNodeKind::Aro,
                NewNode::with_alias(None, "alice").bound_to("User", "7"),
            )
            .await
            .unwrap();

        let found = store
            .find_by_binding(StoredNodeKind::Aro, "User", "7")
            .await
            .unwrap();
        assert_eq!(found.map(|n| n.id), Some(node.id));

        let missing = store
            .find_by_binding(StoredNodeKind::Aro, "User", "8")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = MemoryAclStore::new();
        let aro = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "alice"))
            .await
            .unwrap();
        let aco = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "posts"))
            .await
            .unwrap();

        store
            .upsert_permission(row(aro.id, aco.id, &[("_read", 1)]))
            .await
            .unwrap();
        store
            .upsert_permission(row(aro.id, aco.id, &[("_read", -1)]))
            .await
            .unwrap();

        assert_eq!(store.permission_count(), 1);
        let stored = store.find_permission(aro.id, aco.id).await.unwrap().unwrap();
        assert_eq!(stored.flags.get("_read"), Some(&-1));
    }

    #[tokio::test]
    async fn test_upsert_rejects_unknown_nodes_and_bad_values() {
        let store = MemoryAclStore::new();
        let aro = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "alice"))
            .await
            .unwrap();

        let missing_aco = store.upsert_permission(row(aro.id, 9, &[("_read", 1)])).await;
        assert!(matches!(missing_aco, Err(StorageError::NodeNotFound { .. })));

        let aco = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "posts"))
            .await
            .unwrap();
        let bad_value = store
            .upsert_permission(row(aro.id, aco.id, &[("_read", 5)]))
            .await;
        assert!(matches!(bad_value, Err(StorageError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_find_permissions_filters_by_aco_ids() {
        let store = MemoryAclStore::new();
        let aro = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "alice"))
            .await
            .unwrap();
        let a = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "a"))
            .await
            .unwrap();
        let b = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "b"))
            .await
            .unwrap();
        store
            .upsert_permission(row(aro.id, a.id, &[("_read", 1)]))
            .await
            .unwrap();
        store
            .upsert_permission(row(aro.id, b.id, &[("_read", 1)]))
            .await
            .unwrap();

        let rows = store.find_permissions(aro.id, &[b.id]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].aco_id, b.id);
    }

    #[tokio::test]
    async fn test_delete_node_removes_subtree_and_permissions() {
        let store = MemoryAclStore::new();
        let root = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(None, "controllers"))
            .await
            .unwrap();
        let users = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(Some(root.id), "Users"))
            .await
            .unwrap();
        let edit = store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(Some(users.id), "edit"))
            .await
            .unwrap();
        let aro = store
            .create_node(StoredNodeKind::Aro, NewNode::with_alias(None, "admins"))
            .await
            .unwrap();
        store
            .upsert_permission(row(aro.id, edit.id, &[("_update", 1)]))
            .await
            .unwrap();
        store
            .upsert_permission(row(aro.id, root.id, &[("_read", 1)]))
            .await
            .unwrap();

        store.delete_node(StoredNodeKind::Aco, users.id).await.unwrap();

        assert!(store.get_node(StoredNodeKind::Aco, users.id).await.is_err());
        assert!(store.get_node(StoredNodeKind::Aco, edit.id).await.is_err());
        assert!(store.get_node(StoredNodeKind::Aco, root.id).await.is_ok());
        assert_eq!(store.permission_count(), 1);

        // The alias is free again once its node is gone
        assert!(store
            .create_node(StoredNodeKind::Aco, NewNode::with_alias(Some(root.id), "Users"))
            .await
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_racing_child_creation_leaves_no_stale_alias() {
        let store = MemoryAclStore::new_shared();

        for round in 0..32 {
            let parent = store
                .create_node(
                    StoredNodeKind::Aco,
                    NewNode::with_alias(None, format!("parent-{round}")),
                )
                .await
                .unwrap();
            let parent_id = parent.id;

            let creators: Vec<_> = (0..4)
                .map(|i| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        store
                            .create_node(
                                StoredNodeKind::Aco,
                                NewNode::with_alias(Some(parent_id), format!("c{i}")),
                            )
                            .await
                    })
                })
                .collect();
            let deleter = {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.delete_node(StoredNodeKind::Aco, parent_id).await
                })
            };

            deleter.await.unwrap().unwrap();
            for creator in creators {
                match creator.await.unwrap() {
                    // Created before the delete, so the cascade removed it
                    Ok(child) => {
                        assert!(store.get_node(StoredNodeKind::Aco, child.id).await.is_err())
                    }
                    Err(StorageError::NodeNotFound { node_id, .. }) => {
                        assert_eq!(node_id, parent_id)
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        }

        assert!(store.acos.is_empty());
        assert!(store.aliases.is_empty());
    }
}
