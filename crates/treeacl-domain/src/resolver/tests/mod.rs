//! Tests for the tree resolver module.
//!
//! Organized by functionality:
//! - Path resolution (ids, alias paths, bindings, corrupt forests)
//! - Permission checks (named actions, wildcard, specificity ordering)
//! - Mutators (allow/deny/inherit and their aliases)

pub(crate) mod mocks;
