//! Transactional node and decomposition storage.
//!
//! Backends only need to answer label lookups against committed state and apply a
//! [`ChangeSet`] atomically. Staging, identity bookkeeping and rollback-on-drop
//! live in [`Transaction`], shared by all backends.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Coordinates, Decomposition, Node, NodeId, Operator};
use crate::infrastructure::traits::{
    DecompositionStore, NodeStore, StoreError, StoreResult, StoreTransaction,
};

/// Committed contents of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreState {
    pub nodes: Vec<Node>,
    pub decompositions: Vec<Decomposition>,
}

impl StoreState {
    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Apply staged writes, all or nothing.
    ///
    /// Label uniqueness and id references are checked against the current state.
    /// Coordinates already present are kept.
    #[instrument(level = "debug", skip_all, fields(nodes = changes.nodes.len(), decompositions = changes.decompositions.len()))]
    pub fn apply(&mut self, changes: &ChangeSet) -> StoreResult<()> {
        let mut next = self.clone();
        let mut labels: HashSet<String> = next.nodes.iter().map(|n| n.label.clone()).collect();
        let mut positions: HashMap<NodeId, usize> = next
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();

        for node in &changes.nodes {
            if !labels.insert(node.label.clone()) || positions.contains_key(&node.id) {
                return Err(StoreError::Conflict {
                    label: node.label.clone(),
                });
            }
            positions.insert(node.id, next.nodes.len());
            next.nodes.push(node.clone());
        }

        for (id, coordinates) in &changes.coordinates {
            let pos = *positions
                .get(id)
                .ok_or(StoreError::NotFound { id: *id })?;
            let node = &mut next.nodes[pos];
            if node.coordinates.is_none() {
                node.coordinates = Some(*coordinates);
            }
        }

        for decomposition in &changes.decompositions {
            for id in std::iter::once(&decomposition.root).chain(decomposition.children.iter()) {
                if !positions.contains_key(id) {
                    return Err(StoreError::NotFound { id: *id });
                }
            }
            next.decompositions.push(decomposition.clone());
        }

        *self = next;
        Ok(())
    }
}

/// Writes staged by one transaction.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub nodes: Vec<Node>,
    pub coordinates: Vec<(NodeId, Coordinates)>,
    pub decompositions: Vec<Decomposition>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.coordinates.is_empty() && self.decompositions.is_empty()
    }
}

/// What a storage backend provides to [`Transaction`].
pub trait Backend: Send + Sync {
    /// Latest committed node with `label`.
    fn find_committed(&self, label: &str) -> StoreResult<Option<Node>>;

    /// Apply `changes` atomically against the latest committed state.
    fn apply(&self, changes: &ChangeSet) -> StoreResult<()>;
}

/// Staging transaction over any [`Backend`].
///
/// Committed lookups go to the backend, or to a snapshot taken at `begin` for
/// backends where each lookup is expensive. Commit validates against the latest
/// committed state either way.
pub struct Transaction<'a> {
    backend: &'a dyn Backend,
    snapshot: Option<HashMap<String, Node>>,
    changes: ChangeSet,
    staged: HashMap<String, usize>,
    staged_ids: HashMap<NodeId, usize>,
    known: HashSet<NodeId>,
    overlay: HashMap<NodeId, Coordinates>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self {
            backend,
            snapshot: None,
            changes: ChangeSet::default(),
            staged: HashMap::new(),
            staged_ids: HashMap::new(),
            known: HashSet::new(),
            overlay: HashMap::new(),
            committed: false,
        }
    }

    /// Resolve committed lookups against `state` instead of the backend.
    pub fn with_snapshot(backend: &'a dyn Backend, state: StoreState) -> Self {
        let nodes = state
            .nodes
            .into_iter()
            .map(|node| (node.label.clone(), node))
            .collect();
        let mut tx = Self::new(backend);
        tx.snapshot = Some(nodes);
        tx
    }

    fn find_committed(&self, label: &str) -> StoreResult<Option<Node>> {
        match &self.snapshot {
            Some(nodes) => Ok(nodes.get(label).cloned()),
            None => self.backend.find_committed(label),
        }
    }

    fn ensure_known(&self, id: NodeId) -> StoreResult<()> {
        if self.known.contains(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound { id })
        }
    }
}

impl NodeStore for Transaction<'_> {
    fn find_by_label(&mut self, label: &str) -> StoreResult<Option<Node>> {
        if let Some(&pos) = self.staged.get(label) {
            return Ok(Some(self.changes.nodes[pos].clone()));
        }
        let found = self.find_committed(label)?.map(|mut node| {
            if node.coordinates.is_none() {
                node.coordinates = self.overlay.get(&node.id).copied();
            }
            node
        });
        if let Some(node) = &found {
            self.known.insert(node.id);
        }
        Ok(found)
    }

    fn create(&mut self, label: &str) -> StoreResult<Node> {
        if self.staged.contains_key(label) || self.find_committed(label)?.is_some() {
            return Err(StoreError::Conflict {
                label: label.to_string(),
            });
        }
        let node = Node::new(label);
        let pos = self.changes.nodes.len();
        self.staged.insert(label.to_string(), pos);
        self.staged_ids.insert(node.id, pos);
        self.known.insert(node.id);
        self.changes.nodes.push(node.clone());
        Ok(node)
    }

    fn update_coordinates(&mut self, id: NodeId, coordinates: Coordinates) -> StoreResult<()> {
        self.ensure_known(id)?;
        if let Some(&pos) = self.staged_ids.get(&id) {
            self.changes.nodes[pos].coordinates = Some(coordinates);
        } else {
            self.overlay.insert(id, coordinates);
            self.changes.coordinates.push((id, coordinates));
        }
        Ok(())
    }
}

impl DecompositionStore for Transaction<'_> {
    fn create(
        &mut self,
        root: NodeId,
        operator: Option<Operator>,
        children: &[NodeId],
    ) -> StoreResult<Decomposition> {
        self.ensure_known(root)?;
        for &child in children {
            self.ensure_known(child)?;
        }
        let decomposition = Decomposition::new(root, operator, children.to_vec())?;
        self.changes.decompositions.push(decomposition.clone());
        Ok(decomposition)
    }
}

impl StoreTransaction for Transaction<'_> {
    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.backend.apply(&self.changes)?;
        self.committed = true;
        debug!(
            "committed {} nodes, {} coordinate updates, {} decompositions",
            self.changes.nodes.len(),
            self.changes.coordinates.len(),
            self.changes.decompositions.len()
        );
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.changes.is_empty() {
            debug!(
                "rollback: discarding {} nodes, {} decompositions",
                self.changes.nodes.len(),
                self.changes.decompositions.len()
            );
        }
    }
}
