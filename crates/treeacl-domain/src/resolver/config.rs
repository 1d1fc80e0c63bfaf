//! Configuration for the tree resolver.

use crate::model::ActionSet;

/// Configuration for [`DbAcl`](super::DbAcl).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Known action names; replaces schema introspection of permission fields.
    pub actions: ActionSet,
    /// Longest ancestor chain accepted before the forest is treated as cyclic.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            actions: ActionSet::crud(),
            max_depth: 256,
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified action set.
    pub fn with_actions(mut self, actions: ActionSet) -> Self {
        self.actions = actions;
        self
    }

    /// Creates a new configuration with the specified max depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
