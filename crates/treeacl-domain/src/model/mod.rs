//! ACL data model: nodes, paths, identifiers, actions and tri-state flags.

mod types;
#[cfg(test)]
mod types_proptest;

pub use types::{
    ActionSet, Actions, Node, NodeId, NodeKind, NodePath, NodeRef, Permission, PermissionValue,
};
