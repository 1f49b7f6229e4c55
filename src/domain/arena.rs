use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Node, NodeId};
use crate::domain::error::{DomainError, DomainResult};

/// Arena storage for the nodes touched by one batch.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Nodes are only ever inserted, so iteration follows insertion order.
#[derive(Debug, Default)]
pub struct NodeArena {
    arena: Arena<Node>,
    by_id: HashMap<NodeId, Index>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; its identity must not already be present.
    #[instrument(level = "trace", skip(self), fields(label = %node.label))]
    pub fn insert(&mut self, node: Node) -> DomainResult<Index> {
        if self.by_id.contains_key(&node.id) {
            return Err(DomainError::consistency(format!(
                "node {} ({}) inserted twice",
                node.id, node.label
            )));
        }
        let id = node.id;
        let idx = self.arena.insert(node);
        self.by_id.insert(id, idx);
        Ok(idx)
    }

    pub fn get(&self, idx: Index) -> Option<&Node> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut Node> {
        self.arena.get_mut(idx)
    }

    pub fn index_of(&self, id: NodeId) -> Option<Index> {
        self.by_id.get(&id).copied()
    }

    pub fn by_id(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx = self.index_of(id)?;
        self.arena.get_mut(idx)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter().map(|(_, node)| node)
    }
}
