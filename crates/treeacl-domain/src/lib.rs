//! treeacl-domain: Core ACL domain logic
//!
//! This crate contains the permission resolution logic including:
//! - ACL data model (nodes, paths, tri-state flags, action sets)
//! - Tree resolver walking ARO and ACO ancestor paths
//! - Flat-file ACL read from an ini file
//! - Backend selection behind a single `Acl` type
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               treeacl-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  model/     - Nodes, paths, actions         │
//! │  resolver/  - Tree ACL check and mutators   │
//! │  ini/       - Flat-file ACL and parser      │
//! │  acl.rs     - Backend selection             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod acl;
pub mod error;
pub mod ini;
pub mod model;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use acl::Acl;
pub use error::{DomainError, DomainResult};
pub use ini::IniAcl;
pub use resolver::{DbAcl, ResolverConfig};
