//! Database-backed tree ACL.
//!
//! # Check algorithm
//!
//! The ARO path is walked from the queried node up to its root. At each
//! ARO level the permission rows against every ACO on the ACO path are
//! fetched and visited most specific ACO first:
//!
//! - **Named action**: deny → `false`, allow → `true`, inherit → keep going.
//! - **Wildcard (`*`)**: any deny on any known action → `false`; allows are
//!   accumulated across rows and ARO levels, and the check passes once every
//!   known action has been allowed somewhere.
//!
//! Nothing decisive on the whole walk → `false`.
//!
//! Checks fail closed: lookup and storage errors are logged and reported as
//! a denial. The `try_*` variants surface the error instead.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{
    ActionSet, Actions, Node, NodeKind, NodePath, NodeRef, Permission, PermissionValue,
};

use super::config::ResolverConfig;
use super::path::PathResolver;
use super::traits::{NodeReader, PermissionStore};

/// The wildcard action.
pub const ALL_ACTIONS: &str = "*";

/// The two nodes a permission row links, plus the row when it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclLink {
    pub aro: Node,
    pub aco: Node,
    pub permission: Option<Permission>,
}

/// Tree ACL over a node store and a permission table.
pub struct DbAcl<N: NodeReader, P: PermissionStore> {
    paths: PathResolver<N>,
    permissions: Arc<P>,
    config: ResolverConfig,
}

impl<N: NodeReader, P: PermissionStore> DbAcl<N, P> {
    /// Creates an ACL with the default CRUD action set.
    pub fn new(nodes: Arc<N>, permissions: Arc<P>) -> Self {
        Self::with_config(nodes, permissions, ResolverConfig::default())
    }

    /// Creates an ACL with custom configuration.
    pub fn with_config(nodes: Arc<N>, permissions: Arc<P>, config: ResolverConfig) -> Self {
        Self {
            paths: PathResolver::new(nodes, config.max_depth),
            permissions,
            config,
        }
    }

    /// The known actions.
    pub fn actions(&self) -> &ActionSet {
        &self.config.actions
    }

    /// Resolves an ARO or ACO identifier to its path.
    pub async fn resolve_path(&self, kind: NodeKind, identifier: &NodeRef) -> DomainResult<NodePath> {
        self.paths.resolve(kind, identifier).await
    }

    /// Checks whether `aro` may perform `action` (or every action, for `*`) on `aco`.
    ///
    /// Never fails: empty identifiers, unknown actions, unresolvable nodes
    /// and storage errors all answer `false`.
    pub async fn check(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        action: &str,
    ) -> bool {
        let (aro, aco) = (aro.into(), aco.into());
        if aro.is_empty() || aco.is_empty() {
            return false;
        }

        match self.try_check(&aro, &aco, action).await {
            Ok(allowed) => allowed,
            Err(e @ DomainError::Storage { .. }) => {
                error!(aro = %aro, aco = %aco, action, error = %e, "permission check failed");
                false
            }
            Err(e) => {
                warn!(aro = %aro, aco = %aco, action, error = %e, "permission check failed");
                false
            }
        }
    }

    /// Same decision as [`check`](Self::check), with failures reported.
    #[instrument(skip_all, fields(aro = %aro, aco = %aco, action = action))]
    pub async fn try_check(&self, aro: &NodeRef, aco: &NodeRef, action: &str) -> DomainResult<bool> {
        let wanted = if action.trim() == ALL_ACTIONS {
            None
        } else {
            Some(self.config.actions.field_name(action).ok_or_else(|| {
                DomainError::UnknownAction {
                    action: action.to_string(),
                    known: self.config.actions.to_string(),
                }
            })?)
        };

        let aro_path = self.paths.resolve(NodeKind::Aro, aro).await?;
        let aco_path = self.paths.resolve(NodeKind::Aco, aco).await?;
        if aro_path.is_empty() || aco_path.is_empty() {
            return Err(DomainError::InvalidNode {
                message: format!("empty path for {aro} or {aco}"),
            });
        }

        let allowed = self.decide(&aro_path, &aco_path, wanted.as_deref()).await?;
        debug!(allowed, aro_path = %aro_path, aco_path = %aco_path, "acl check");
        Ok(allowed)
    }

    async fn decide(
        &self,
        aro_path: &NodePath,
        aco_path: &NodePath,
        wanted: Option<&str>,
    ) -> DomainResult<bool> {
        let aco_ids = aco_path.ids();
        let known = &self.config.actions;
        // Actions allowed so far; shared by every row and ARO level of this call
        let mut satisfied: HashSet<String> = HashSet::new();

        for aro_node in aro_path.iter() {
            let mut rows = self
                .permissions
                .find_permissions(aro_node.id, &aco_ids)
                .await?;
            if rows.is_empty() {
                continue;
            }
            rows.sort_by_key(|row| aco_path.depth_of(row.aco_id).unwrap_or(usize::MAX));

            for row in &rows {
                match wanted {
                    None => {
                        for field in known.fields() {
                            match row.get(&field) {
                                PermissionValue::Deny => {
                                    debug!(aro_id = row.aro_id, aco_id = row.aco_id, field = %field, "explicit deny");
                                    return Ok(false);
                                }
                                PermissionValue::Allow => {
                                    satisfied.insert(field);
                                }
                                PermissionValue::Inherit => {}
                            }
                        }
                        if satisfied.len() == known.len() {
                            return Ok(true);
                        }
                    }
                    Some(field) => match row.get(field) {
                        PermissionValue::Deny => return Ok(false),
                        PermissionValue::Allow => return Ok(true),
                        PermissionValue::Inherit => continue,
                    },
                }
            }
        }

        Ok(false)
    }

    /// Looks up both nodes and the permission row linking them.
    pub async fn link(&self, aro: &NodeRef, aco: &NodeRef) -> DomainResult<AclLink> {
        let invalid = |e: DomainError| match e {
            DomainError::Storage { .. } => e,
            other => DomainError::InvalidNode {
                message: other.to_string(),
            },
        };
        if aro.is_empty() || aco.is_empty() {
            return Err(DomainError::InvalidNode {
                message: "empty ARO or ACO identifier".to_string(),
            });
        }

        let aro_node = self
            .paths
            .resolve(NodeKind::Aro, aro)
            .await
            .map_err(invalid)?
            .target()
            .cloned();
        let aco_node = self
            .paths
            .resolve(NodeKind::Aco, aco)
            .await
            .map_err(invalid)?
            .target()
            .cloned();

        let (Some(aro), Some(aco)) = (aro_node, aco_node) else {
            return Err(DomainError::InvalidNode {
                message: "node lookup returned an empty path".to_string(),
            });
        };
        let permission = self.permissions.find_permission(aro.id, aco.id).await?;

        Ok(AclLink {
            aro,
            aco,
            permission,
        })
    }

    /// Sets `actions` to `value` on the row linking `aro` and `aco`,
    /// creating the row if needed. Returns whether the change was stored.
    pub async fn set_permission(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
        value: PermissionValue,
    ) -> bool {
        let (aro, aco, actions) = (aro.into(), aco.into(), actions.into());
        match self.try_set_permission(&aro, &aco, &actions, value).await {
            Ok(()) => true,
            Err(e @ DomainError::Storage { .. }) => {
                error!(aro = %aro, aco = %aco, error = %e, "failed to store permission");
                false
            }
            Err(e) => {
                warn!(aro = %aro, aco = %aco, error = %e, "failed to store permission");
                false
            }
        }
    }

    /// Same as [`set_permission`](Self::set_permission), with failures reported.
    #[instrument(skip_all, fields(aro = %aro, aco = %aco, value = ?value))]
    pub async fn try_set_permission(
        &self,
        aro: &NodeRef,
        aco: &NodeRef,
        actions: &Actions,
        value: PermissionValue,
    ) -> DomainResult<()> {
        let link = self.link(aro, aco).await?;
        let known = &self.config.actions;
        let mut row = link
            .permission
            .unwrap_or_else(|| Permission::new(link.aro.id, link.aco.id, known));

        match actions {
            Actions::All => {
                for field in known.fields() {
                    row.set(field, value);
                }
            }
            Actions::Named(names) => {
                for name in names {
                    match known.field_name(name) {
                        Some(field) => row.set(field, value),
                        None => debug!(action = %name, "ignoring unknown action"),
                    }
                }
            }
        }

        self.permissions.upsert_permission(row).await?;
        debug!("permission stored");
        Ok(())
    }

    /// Sets `actions` to allow.
    pub async fn allow(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
    ) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Allow)
            .await
    }

    /// Sets `actions` to deny.
    pub async fn deny(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
    ) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Deny)
            .await
    }

    /// Sets `actions` back to inherit from ancestors.
    pub async fn inherit(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
    ) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Inherit)
            .await
    }

    /// Alias of [`allow`](Self::allow).
    pub async fn grant(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
    ) -> bool {
        self.allow(aro, aco, actions).await
    }

    /// Alias of [`deny`](Self::deny).
    pub async fn revoke(
        &self,
        aro: impl Into<NodeRef>,
        aco: impl Into<NodeRef>,
        actions: impl Into<Actions>,
    ) -> bool {
        self.deny(aro, aco, actions).await
    }
}
