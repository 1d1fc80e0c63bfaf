//! treeacl-storage: Storage abstraction layer
//!
//! This crate provides the persistence layer for the tree ACL resolver:
//! - AclDataStore trait covering the ARO/ACO node forests and the permission table
//! - In-memory implementation for tests and embedded hosts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              treeacl-storage                 │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - AclDataStore trait           │
//! │  memory.rs   - In-memory implementation     │
//! │  error.rs    - StorageError                 │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryAclStore;
pub use traits::{AclDataStore, NewNode, StoredNode, StoredNodeKind, StoredPermission};
