//! Depth-first coordinate assignment for a decomposition forest.
//!
//! Every node gets `x = depth` below the root the pass entered from and
//! `y = sequence number` in pre-order. The sequence is shared by all roots of a
//! pass. Nodes that already carry coordinates are skipped together with their
//! subtree, so repeated passes never move anything.

use tracing::{debug, instrument, trace};

use crate::domain::entities::{Coordinates, NodeId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::forest::Forest;

/// Summary of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOutcome {
    /// Nodes that received coordinates in this pass, in visitation order
    pub assigned: Vec<NodeId>,
    /// Sequence value the next pass would start from
    pub next_sequence: u32,
}

/// Assigns (depth, sequence) coordinates to a forest.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    max_depth: Option<usize>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the recursion ceiling (defaults to the forest's node count).
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    /// Lay out the forest starting from `roots`, in order, with the sequence at zero.
    ///
    /// The walk keeps its own stack, so chain length is bounded only by the ceiling.
    #[instrument(level = "debug", skip(self, forest), fields(roots = roots.len()))]
    pub fn layout(&self, roots: &[NodeId], forest: &mut Forest) -> DomainResult<LayoutOutcome> {
        let ceiling = self.max_depth.unwrap_or_else(|| forest.nodes().len()).max(1);
        let mut assigned = Vec::new();
        let mut sequence = 0;
        for &root in roots {
            sequence = self.place(forest, root, sequence, ceiling, &mut assigned)?;
        }
        debug!(
            "layout assigned {} nodes, next sequence {}",
            assigned.len(),
            sequence
        );
        Ok(LayoutOutcome {
            assigned,
            next_sequence: sequence,
        })
    }

    /// Pre-order walk below `root`; returns the next sequence value.
    ///
    /// Children are pushed in reverse so they pop in formula order. Whether a node
    /// is already laid out is decided when it is popped, after its earlier siblings'
    /// subtrees are complete.
    fn place(
        &self,
        forest: &mut Forest,
        root: NodeId,
        mut sequence: u32,
        ceiling: usize,
        assigned: &mut Vec<NodeId>,
    ) -> DomainResult<u32> {
        let mut stack: Vec<(NodeId, u32)> = vec![(root, 0)];

        while let Some((id, depth)) = stack.pop() {
            if depth as usize >= ceiling {
                return Err(DomainError::consistency(format!(
                    "layout depth {depth} exceeds ceiling {ceiling} at node {id}"
                )));
            }

            let node = forest.nodes_mut().by_id_mut(id).ok_or_else(|| {
                DomainError::consistency(format!("node {id} is not part of the batch"))
            })?;
            if node.is_laid_out() {
                trace!("skip '{}': already laid out", node.label);
                continue;
            }
            node.coordinates = Some(Coordinates {
                x: depth,
                y: sequence,
            });
            trace!("place '{}' at ({}, {})", node.label, depth, sequence);
            assigned.push(id);
            sequence += 1;

            if let Some(decomposition) = forest.decomposition_of(id) {
                stack.extend(
                    decomposition
                        .children
                        .iter()
                        .rev()
                        .map(|&child| (child, depth + 1)),
                );
            }
        }
        Ok(sequence)
    }
}
