//! Batch-scoped node deduplication.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{DomainError, Node, NodeArena, NodeId};
use crate::infrastructure::traits::{NodeStore, StoreError};

/// Resolves labels to nodes for one batch.
///
/// Each label is looked up in the batch cache, then in the store, and only then
/// created. The registry is owned by a single batch and dropped with it.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: NodeArena,
    cache: HashMap<String, NodeId>,
    created: usize,
    adopted: usize,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the batch node for `label`, adopting a stored node or creating one.
    ///
    /// A uniqueness conflict on create means another writer won the race; the
    /// lookup is retried once and a still-missing node is a consistency error.
    #[instrument(level = "debug", skip(self, store))]
    pub fn find_or_create<S>(&mut self, store: &mut S, label: &str) -> ApplicationResult<NodeId>
    where
        S: NodeStore + ?Sized,
    {
        if let Some(&id) = self.cache.get(label) {
            return Ok(id);
        }

        let node = match store.find_by_label(label)? {
            Some(node) => {
                debug!("adopt stored node '{}'", label);
                self.adopted += 1;
                node
            }
            None => match store.create(label) {
                Ok(node) => {
                    debug!("create node '{}'", label);
                    self.created += 1;
                    node
                }
                Err(StoreError::Conflict { .. }) => {
                    warn!("label '{}' was created concurrently, retrying lookup", label);
                    let node = store.find_by_label(label)?.ok_or_else(|| {
                        DomainError::consistency(format!(
                            "label '{label}' conflicted on create but is missing on retry"
                        ))
                    })?;
                    self.adopted += 1;
                    node
                }
                Err(e) => return Err(e.into()),
            },
        };

        self.insert(node)
    }

    fn insert(&mut self, node: Node) -> ApplicationResult<NodeId> {
        let id = node.id;
        self.cache.insert(node.label.clone(), id);
        self.nodes.insert(node)?;
        Ok(id)
    }

    pub fn get(&self, label: &str) -> Option<&Node> {
        self.cache.get(label).and_then(|&id| self.nodes.by_id(id))
    }

    /// Number of distinct labels resolved so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn adopted_count(&self) -> usize {
        self.adopted
    }

    pub fn into_nodes(self) -> NodeArena {
        self.nodes
    }
}
