//! ACL strategy selection.
//!
//! The backend is picked once, at configuration time, from a closed set of
//! complete strategies. Callers program against [`Acl`] and never see which
//! one is active beyond [`Acl::backend_name`].

use crate::ini::IniAcl;
use crate::model::{Actions, NodeRef, PermissionValue};
use crate::resolver::{DbAcl, NodeReader, PermissionStore};

/// A configured ACL backend.
pub enum Acl<N: NodeReader, P: PermissionStore> {
    /// Tree ACL over the node and permission stores.
    Db(DbAcl<N, P>),
    /// Static flat-file ACL.
    Ini(IniAcl),
}

impl<N: NodeReader, P: PermissionStore> Acl<N, P> {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Acl::Db(_) => "db",
            Acl::Ini(_) => "ini",
        }
    }

    /// Checks whether `aro` may perform `action` on `aco`.
    pub async fn check(&self, aro: &str, aco: &str, action: &str) -> bool {
        match self {
            Acl::Db(acl) => acl.check(aro, aco, action).await,
            Acl::Ini(acl) => acl.check(aro, aco, action),
        }
    }

    /// Sets `actions` to `value` for the (aro, aco) pair.
    pub async fn set_permission(
        &self,
        aro: &str,
        aco: &str,
        actions: impl Into<Actions>,
        value: PermissionValue,
    ) -> bool {
        match self {
            Acl::Db(acl) => {
                acl.set_permission(NodeRef::from(aro), NodeRef::from(aco), actions, value)
                    .await
            }
            Acl::Ini(acl) => acl.set_permission(aro, aco),
        }
    }

    pub async fn allow(&self, aro: &str, aco: &str, actions: impl Into<Actions>) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Allow)
            .await
    }

    pub async fn deny(&self, aro: &str, aco: &str, actions: impl Into<Actions>) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Deny)
            .await
    }

    pub async fn inherit(&self, aro: &str, aco: &str, actions: impl Into<Actions>) -> bool {
        self.set_permission(aro, aco, actions, PermissionValue::Inherit)
            .await
    }

    /// Alias of [`allow`](Self::allow).
    pub async fn grant(&self, aro: &str, aco: &str, actions: impl Into<Actions>) -> bool {
        self.allow(aro, aco, actions).await
    }

    /// Alias of [`deny`](Self::deny).
    pub async fn revoke(&self, aro: &str, aco: &str, actions: impl Into<Actions>) -> bool {
        self.deny(aro, aco, actions).await
    }
}
