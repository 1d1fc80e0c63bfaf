//! Core type definitions for the ACL model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Node identifier, unique within one forest.
pub type NodeId = u64;

/// Which forest a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Access request object: the subject asking for access.
    Aro,
    /// Access control object: the protected resource.
    Aco,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Aro => f.write_str("ARO"),
            NodeKind::Aco => f.write_str("ACO"),
        }
    }
}

/// An ARO or ACO node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    /// Discriminator matched by symbolic path segments.
    pub alias: Option<String>,
    pub model: Option<String>,
    pub foreign_key: Option<String>,
}

impl Node {
    /// Label used in logs: the alias when present, `#id` otherwise.
    pub fn label(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!("#{}", self.id),
        }
    }
}

/// Ancestor chain of a node.
///
/// `nodes[0]` is always the queried node; the last element is its root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath {
    nodes: Vec<Node>,
}

impl NodePath {
    /// Builds a path from nodes ordered most specific first.
    pub fn from_specific_first(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// The queried node.
    pub fn target(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates from the queried node up to the root.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Iterates from the root down to the queried node.
    pub fn root_to_target(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().rev()
    }

    /// Node ids, most specific first.
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Position of `id` in the path (0 = queried node).
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.root_to_target().map(Node::label).collect();
        f.write_str(&labels.join("/"))
    }
}

/// How a caller names a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRef {
    /// Raw node id.
    Id(NodeId),
    /// Slash-delimited alias path from a root, e.g. `controllers/Users/edit`.
    Path(String),
    /// Binding to a host record, written `Model::foreign_key`.
    Binding { model: String, foreign_key: String },
}

impl NodeRef {
    /// Parses the string form of an identifier.
    ///
    /// All digits → `Id`, `Model::key` → `Binding`, anything else → `Path`.
    /// Returns `None` for an empty or whitespace-only identifier.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = value.parse::<NodeId>() {
                return Some(NodeRef::Id(id));
            }
        }
        if let Some((model, foreign_key)) = value.split_once("::") {
            let (model, foreign_key) = (model.trim(), foreign_key.trim());
            if !model.is_empty() && !foreign_key.is_empty() {
                return Some(NodeRef::Binding {
                    model: model.to_string(),
                    foreign_key: foreign_key.to_string(),
                });
            }
        }
        Some(NodeRef::Path(value.to_string()))
    }

    /// Creates a binding reference.
    pub fn binding(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        NodeRef::Binding {
            model: model.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// True when the reference cannot name any node (the "null" identifier).
    pub fn is_empty(&self) -> bool {
        match self {
            NodeRef::Id(_) => false,
            NodeRef::Path(path) => path.split('/').all(|s| s.trim().is_empty()),
            NodeRef::Binding { model, foreign_key } => {
                model.trim().is_empty() || foreign_key.trim().is_empty()
            }
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Id(id) => write!(f, "{id}"),
            NodeRef::Path(path) => f.write_str(path),
            NodeRef::Binding { model, foreign_key } => write!(f, "{model}::{foreign_key}"),
        }
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::Id(id)
    }
}

impl From<&str> for NodeRef {
    fn from(value: &str) -> Self {
        NodeRef::parse(value).unwrap_or_else(|| NodeRef::Path(String::new()))
    }
}

impl From<String> for NodeRef {
    fn from(value: String) -> Self {
        NodeRef::from(value.as_str())
    }
}

impl From<&NodeRef> for NodeRef {
    fn from(value: &NodeRef) -> Self {
        value.clone()
    }
}

/// Tri-state permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionValue {
    Deny,
    #[default]
    Inherit,
    Allow,
}

impl PermissionValue {
    /// Stored representation: -1, 0 or 1.
    pub fn as_i8(self) -> i8 {
        match self {
            PermissionValue::Deny => -1,
            PermissionValue::Inherit => 0,
            PermissionValue::Allow => 1,
        }
    }
}

impl TryFrom<i8> for PermissionValue {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(PermissionValue::Deny),
            0 => Ok(PermissionValue::Inherit),
            1 => Ok(PermissionValue::Allow),
            other => Err(other),
        }
    }
}

/// The known action names, injected at construction.
///
/// Names are stored without the `_` prefix; [`ActionSet::field_name`] adds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSet {
    names: Vec<String>,
}

impl ActionSet {
    /// Builds an action set, normalising and de-duplicating names.
    pub fn new<I, S>(names: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for name in names {
            let name = Self::normalize(name.as_ref());
            if name.is_empty() || name == "*" {
                return Err(DomainError::Configuration {
                    message: format!("invalid action name '{}'", name),
                });
            }
            if !normalized.iter().any(|n| n == name) {
                normalized.push(name.to_string());
            }
        }
        if normalized.is_empty() {
            return Err(DomainError::Configuration {
                message: "action set cannot be empty".to_string(),
            });
        }
        Ok(Self { names: normalized })
    }

    /// The conventional create/read/update/delete set.
    pub fn crud() -> Self {
        Self {
            names: ["create", "read", "update", "delete"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Strips surrounding whitespace and one leading `_`.
    pub fn normalize(name: &str) -> &str {
        let name = name.trim();
        name.strip_prefix('_').unwrap_or(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = Self::normalize(name);
        self.names.iter().any(|n| n == name)
    }

    /// Permission field for a known action (`read` → `_read`).
    pub fn field_name(&self, name: &str) -> Option<String> {
        let name = Self::normalize(name);
        self.names
            .iter()
            .find(|n| *n == name)
            .map(|n| format!("_{n}"))
    }

    /// All permission fields, in configured order.
    pub fn fields(&self) -> impl Iterator<Item = String> + '_ {
        self.names.iter().map(|n| format!("_{n}"))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ActionSet {
    fn default() -> Self {
        Self::crud()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(", "))
    }
}

/// Actions addressed by a mutator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actions {
    /// `*`: every known action.
    All,
    /// Specific action names; unknown ones are ignored by mutators.
    Named(Vec<String>),
}

impl From<&str> for Actions {
    /// `"*"` → `All`; otherwise a comma-separated list of names.
    fn from(value: &str) -> Self {
        if value.trim() == "*" {
            return Actions::All;
        }
        Actions::Named(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

impl From<Vec<String>> for Actions {
    fn from(value: Vec<String>) -> Self {
        Actions::Named(value)
    }
}

impl From<&[&str]> for Actions {
    fn from(value: &[&str]) -> Self {
        Actions::Named(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Permission row for one (ARO, ACO) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub aro_id: NodeId,
    pub aco_id: NodeId,
    /// Field name (`_read`) → tri-state value.
    pub flags: BTreeMap<String, PermissionValue>,
}

impl Permission {
    /// A row with every field of `actions` set to inherit.
    pub fn new(aro_id: NodeId, aco_id: NodeId, actions: &ActionSet) -> Self {
        Self {
            aro_id,
            aco_id,
            flags: actions
                .fields()
                .map(|field| (field, PermissionValue::Inherit))
                .collect(),
        }
    }

    /// Value of a field; a missing field reads as inherit.
    pub fn get(&self, field: &str) -> PermissionValue {
        self.flags.get(field).copied().unwrap_or_default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: PermissionValue) {
        self.flags.insert(field.into(), value);
    }
}
