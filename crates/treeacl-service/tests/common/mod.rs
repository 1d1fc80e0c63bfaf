//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use treeacl_service::{build_acl, AclServiceConfig, StoreAcl};
use treeacl_storage::{AclDataStore, MemoryAclStore, NewNode, StoredNodeKind};

/// Ids of the nodes created by [`seed_tree`].
#[derive(Debug, Clone, Copy)]
pub struct Tree {
    pub admins: u64,
    pub user_x: u64,
    pub editors: u64,
    pub controllers: u64,
    pub users: u64,
    pub edit: u64,
    pub view: u64,
}

/// Creates the fixture forests:
///
/// ```text
/// ARO: Admins ─ UserX (User::7)      Editors
/// ACO: controllers ─ Users ─ edit
///                          └ view
/// ```
pub async fn seed_tree(store: &MemoryAclStore) -> Tree {
    let admins = add(store, StoredNodeKind::Aro, NewNode::with_alias(None, "Admins")).await;
    let user_x = add(
        store,
        StoredNodeKind::Aro,
        NewNode::with_alias(Some(admins), "UserX").bound_to("User", "7"),
    )
    .await;
    let editors = add(store, StoredNodeKind::Aro, NewNode::with_alias(None, "Editors")).await;

    let controllers = add(store, StoredNodeKind::Aco, NewNode::with_alias(None, "controllers")).await;
    let users = add(store, StoredNodeKind::Aco, NewNode::with_alias(Some(controllers), "Users")).await;
    let edit = add(store, StoredNodeKind::Aco, NewNode::with_alias(Some(users), "edit")).await;
    let view = add(store, StoredNodeKind::Aco, NewNode::with_alias(Some(users), "view")).await;

    Tree {
        admins,
        user_x,
        editors,
        controllers,
        users,
        edit,
        view,
    }
}

async fn add(store: &MemoryAclStore, kind: StoredNodeKind, node: NewNode) -> u64 {
    store.create_node(kind, node).await.unwrap().id
}

/// A seeded store and the default `db` backend over it.
pub async fn db_acl() -> (StoreAcl<MemoryAclStore>, Arc<MemoryAclStore>, Tree) {
    let store = MemoryAclStore::new_shared();
    let tree = seed_tree(&store).await;
    let acl = build_acl(&AclServiceConfig::default(), Arc::clone(&store)).unwrap();
    (acl, store, tree)
}
