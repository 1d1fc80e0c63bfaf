//! Tree ACL resolver.
//!
//! Resolves ARO/ACO identifiers to their ancestor paths and reduces the
//! tri-state permission rows found along them to an allow/deny decision.
//!
//! # Layout
//!
//! - `traits`  - Node and permission access the resolver needs
//! - `path`    - Identifier → ancestor path resolution
//! - `db_acl`  - Check algorithm and mutators
//! - `config`  - Action set and walk limits

mod config;
mod db_acl;
mod path;
mod traits;

#[cfg(test)]
pub(crate) mod tests;

pub use config::ResolverConfig;
pub use db_acl::{AclLink, DbAcl, ALL_ACTIONS};
pub use path::PathResolver;
pub use traits::{NodeReader, PermissionStore};
