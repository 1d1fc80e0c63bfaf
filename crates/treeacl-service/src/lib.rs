//! Service wiring for the tree ACL resolver.
//!
//! This crate connects the storage layer to the domain layer and picks the
//! ACL backend from configuration:
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────────┐
//! │  AclServiceConfig    │────▶│  build_acl               │
//! │  (YAML + TREEACL_*)  │     │  db  → DbAcl over store  │
//! └──────────────────────┘     │  ini → IniAcl from file  │
//!                              └────────────┬─────────────┘
//!                                           │ adapters
//!                              ┌────────────▼─────────────┐
//!                              │  AclDataStore            │
//!                              └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use treeacl_service::{build_acl, init_logging_from_settings, AclServiceConfig};
//! use treeacl_storage::MemoryAclStore;
//!
//! let config = AclServiceConfig::load("treeacl.yaml")?;
//! init_logging_from_settings(&config.logging)?;
//! let acl = build_acl(&config, MemoryAclStore::new_shared())?;
//! let allowed = acl.check("Admins/UserX", "controllers/Users/edit", "read").await;
//! ```

pub mod adapters;
pub mod builder;
pub mod config;
pub mod logging;

pub use adapters::{StoreNodeReader, StorePermissionStore};
pub use builder::{build_acl, StoreAcl};
pub use config::{AclServiceConfig, AclSettings, ConfigLoadError, LoggingSettings};
pub use logging::{init_logging, init_logging_from_settings, LoggingConfig};
