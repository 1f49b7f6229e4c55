//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::operator::Operator;

/// Opaque identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity of a decomposition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecompositionId(Uuid);

impl DecompositionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DecompositionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecompositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Layout position: `x` is depth, `y` is the depth-first sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: u32,
    pub y: u32,
}

/// One factor of a decomposition, e.g. "revenue".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Display name, unique within a batch and across the store
    pub label: String,
    /// `None` until the layout pass has visited the node
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            coordinates: None,
        }
    }

    pub fn is_laid_out(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Result of one formula: a root joined to its ordered children by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub id: DecompositionId,
    pub root: NodeId,
    /// `None` for a bare alias (`a = b`)
    pub operator: Option<Operator>,
    pub children: Vec<NodeId>,
}

impl Decomposition {
    /// Create a decomposition record, enforcing that an operator always has children.
    pub fn new(root: NodeId, operator: Option<Operator>, children: Vec<NodeId>) -> DomainResult<Self> {
        if let Some(op) = operator {
            if children.is_empty() {
                return Err(DomainError::validation(
                    root.to_string(),
                    format!("operator '{op}' without children"),
                ));
            }
        }
        Ok(Self {
            id: DecompositionId::new(),
            root,
            operator,
            children,
        })
    }
}

/// Formula template grouped by industry and target KPI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub industry_class: String,
    pub industry: String,
    pub tree_type: String,
    pub kpi: String,
    pub formulas: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// `industry_class -> industry -> tree types`
pub type CategoryIndex = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Node as returned to callers of `generate_trees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    pub x: Option<u32>,
    pub y: Option<u32>,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            label: node.label.clone(),
            x: node.coordinates.map(|c| c.x),
            y: node.coordinates.map(|c| c.y),
        }
    }
}

/// Decomposition as returned to callers of `generate_trees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionView {
    pub id: DecompositionId,
    pub root: NodeView,
    pub operator: Option<Operator>,
    pub children: Vec<NodeView>,
}
