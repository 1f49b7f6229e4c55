//! The node-sharing forest produced by one batch of formulas.

use std::collections::{BTreeMap, HashMap};

use tracing::{instrument, warn};

use crate::domain::arena::NodeArena;
use crate::domain::entities::{Decomposition, DecompositionView, Node, NodeId, NodeView};
use crate::domain::error::{DomainError, DomainResult};

/// Nodes and decompositions of a batch.
///
/// A node may be the root of one decomposition and a child of others. Every
/// decomposition is kept in formula order; when two formulas share a root label the
/// later one is the active decomposition for that root (last formula wins).
#[derive(Debug, Default)]
pub struct Forest {
    nodes: NodeArena,
    decompositions: Vec<Decomposition>,
    active: HashMap<NodeId, usize>,
    roots: Vec<NodeId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl Forest {
    pub fn new(nodes: NodeArena) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    /// Add a decomposition whose root and children are already in the arena.
    ///
    /// Returns the decomposition it replaced as the active one for that root, if any.
    #[instrument(level = "trace", skip(self, decomposition), fields(root = %decomposition.root))]
    pub fn add_decomposition(
        &mut self,
        decomposition: Decomposition,
    ) -> DomainResult<Option<Decomposition>> {
        for id in std::iter::once(&decomposition.root).chain(decomposition.children.iter()) {
            if !self.nodes.contains(*id) {
                return Err(DomainError::consistency(format!(
                    "decomposition {} references node {} outside the batch",
                    decomposition.id, id
                )));
            }
        }

        let root = decomposition.root;
        let position = self.decompositions.len();
        self.decompositions.push(decomposition);

        match self.active.insert(root, position) {
            Some(previous) => {
                let replaced = self.decompositions[previous].clone();
                warn!(
                    "root '{}' decomposed twice; later formula wins",
                    self.label_of(root)
                );
                Ok(Some(replaced))
            }
            None => {
                self.roots.push(root);
                Ok(None)
            }
        }
    }

    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeArena {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.by_id(id)
    }

    pub fn node_by_label(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label == label)
    }

    /// Active decomposition rooted at `id`, if the node is decomposed in this batch.
    pub fn decomposition_of(&self, id: NodeId) -> Option<&Decomposition> {
        self.active.get(&id).map(|&pos| &self.decompositions[pos])
    }

    /// All decompositions in formula order, including overwritten ones.
    pub fn decompositions(&self) -> &[Decomposition] {
        &self.decompositions
    }

    /// Distinct decomposition roots in the order their first formula appeared.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn label_of(&self, id: NodeId) -> &str {
        self.nodes.by_id(id).map(|n| n.label.as_str()).unwrap_or("?")
    }

    /// Find an edge `(from, to)` through which a node reaches itself over active
    /// decompositions; `to` is where the cycle closes.
    ///
    /// Iterative depth-first search with visiting/done marks.
    #[instrument(level = "debug", skip(self))]
    pub fn find_cycle(&self) -> Option<(NodeId, NodeId)> {
        let mut marks: HashMap<NodeId, Mark> = HashMap::new();

        for &root in &self.roots {
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::Visiting);
            let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];

            while let Some(frame) = stack.last_mut() {
                let (id, next) = *frame;
                let child = self
                    .decomposition_of(id)
                    .and_then(|d| d.children.get(next))
                    .copied();
                let Some(child) = child else {
                    marks.insert(id, Mark::Done);
                    stack.pop();
                    continue;
                };
                frame.1 += 1;
                match marks.get(&child) {
                    Some(Mark::Visiting) => return Some((id, child)),
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(child, Mark::Visiting);
                        stack.push((child, 0));
                    }
                }
            }
        }
        None
    }

    /// Fails with `CycleDetected` if any active decomposition reaches itself.
    pub fn ensure_acyclic(&self) -> DomainResult<()> {
        match self.find_cycle() {
            Some((from, to)) => Err(self.cycle_error(from, to)),
            None => Ok(()),
        }
    }

    /// `CycleDetected` for the closing edge `from -> to`.
    pub fn cycle_error(&self, from: NodeId, to: NodeId) -> DomainError {
        DomainError::CycleDetected {
            label: self.label_of(to).to_string(),
            from: self.label_of(from).to_string(),
        }
    }

    /// Caller-facing mapping from root label to its active decomposition.
    pub fn views(&self) -> DomainResult<BTreeMap<String, DecompositionView>> {
        let mut views = BTreeMap::new();
        for &root in &self.roots {
            let Some(decomposition) = self.decomposition_of(root) else {
                continue;
            };
            let root_node = self.view_of(root)?;
            let children = decomposition
                .children
                .iter()
                .map(|&child| self.view_of(child))
                .collect::<DomainResult<Vec<_>>>()?;
            views.insert(
                root_node.label.clone(),
                DecompositionView {
                    id: decomposition.id,
                    root: root_node,
                    operator: decomposition.operator,
                    children,
                },
            );
        }
        Ok(views)
    }

    fn view_of(&self, id: NodeId) -> DomainResult<NodeView> {
        self.nodes
            .by_id(id)
            .map(NodeView::from)
            .ok_or_else(|| DomainError::consistency(format!("node {id} missing from batch")))
    }
}
