//! Node path resolution.
//!
//! Turns a [`NodeRef`] into the chain of nodes from the referenced node up
//! to its root. Read-only.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{instrument, trace};

use crate::error::{DomainError, DomainResult};
use crate::model::{Node, NodeKind, NodePath, NodeRef};

use super::traits::NodeReader;

/// Resolves identifiers against one [`NodeReader`].
pub struct PathResolver<N: NodeReader> {
    nodes: Arc<N>,
    max_depth: usize,
}

impl<N: NodeReader> PathResolver<N> {
    pub fn new(nodes: Arc<N>, max_depth: usize) -> Self {
        Self { nodes, max_depth }
    }

    /// Resolves `identifier` to its path, queried node first.
    ///
    /// Fails with [`DomainError::NodeNotFound`] when nothing matches.
    #[instrument(skip_all, fields(kind = %kind, identifier = %identifier))]
    pub async fn resolve(&self, kind: NodeKind, identifier: &NodeRef) -> DomainResult<NodePath> {
        let not_found = || DomainError::NodeNotFound {
            kind,
            identifier: identifier.to_string(),
        };

        match identifier {
            NodeRef::Id(id) => {
                let node = self.nodes.find_node(kind, *id).await?.ok_or_else(not_found)?;
                self.ancestors_of(kind, node).await
            }
            NodeRef::Path(path) => {
                let segments: Vec<&str> = path
                    .split('/')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                let (first, rest) = segments.split_first().ok_or_else(not_found)?;

                // The first segment may sit at any depth; each later segment
                // must be a direct child of the previous match.
                let mut current = self
                    .nodes
                    .find_by_alias(kind, first)
                    .await?
                    .ok_or_else(not_found)?;
                for segment in rest {
                    current = self
                        .nodes
                        .find_child_by_alias(kind, current.id, segment)
                        .await?
                        .ok_or_else(not_found)?;
                    trace!(segment = *segment, node_id = current.id, "matched path segment");
                }

                self.ancestors_of(kind, current).await
            }
            NodeRef::Binding { model, foreign_key } => {
                let node = self
                    .nodes
                    .find_by_binding(kind, model, foreign_key)
                    .await?
                    .ok_or_else(not_found)?;
                self.ancestors_of(kind, node).await
            }
        }
    }

    /// Follows parent links from `node` to its root.
    async fn ancestors_of(&self, kind: NodeKind, node: Node) -> DomainResult<NodePath> {
        let start = node.id;
        let mut visited = HashSet::from([node.id]);
        let mut next_parent = node.parent_id;
        let mut chain = vec![node];

        while let Some(parent_id) = next_parent {
            if chain.len() >= self.max_depth || !visited.insert(parent_id) {
                return Err(DomainError::CycleDetected {
                    kind,
                    node_id: start,
                    max_depth: self.max_depth,
                });
            }
            let parent = self
                .nodes
                .find_node(kind, parent_id)
                .await?
                .ok_or_else(|| DomainError::NodeNotFound {
                    kind,
                    identifier: parent_id.to_string(),
                })?;
            next_parent = parent.parent_id;
            chain.push(parent);
        }

        Ok(NodePath::from_specific_first(chain))
    }
}
