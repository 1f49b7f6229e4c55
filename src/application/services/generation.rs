//! Decomposition tree generation service
//!
//! Runs one batch of formulas as a single unit of work: build the forest, lay it
//! out, persist the coordinates, commit. Any failure drops the transaction, so
//! nothing of a failed batch becomes visible.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::application::builder::TreeBuilder;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DecompositionView, DomainError, Forest, LayoutEngine};
use crate::infrastructure::traits::{CategoryProvider, StoreError, TreeStore};

/// Result of a committed batch.
#[derive(Debug)]
pub struct Generation {
    /// Laid-out forest of the batch
    pub forest: Forest,
    pub nodes_created: usize,
    pub nodes_adopted: usize,
    /// Nodes that received coordinates in this batch
    pub nodes_laid_out: usize,
}

impl Generation {
    /// Mapping from root label to its decomposition.
    pub fn views(&self) -> ApplicationResult<BTreeMap<String, DecompositionView>> {
        Ok(self.forest.views()?)
    }
}

/// Service for generating decomposition trees from formula batches.
pub struct GenerationService {
    store: Arc<dyn TreeStore>,
    layout: LayoutEngine,
    commit_retries: u32,
}

impl GenerationService {
    /// Create a new generation service.
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self {
            store,
            layout: LayoutEngine::new(),
            commit_retries: 1,
        }
    }

    /// How often a batch whose commit lost a label race is rebuilt.
    pub fn with_commit_retries(mut self, retries: u32) -> Self {
        self.commit_retries = retries;
        self
    }

    pub fn with_layout(mut self, layout: LayoutEngine) -> Self {
        self.layout = layout;
        self
    }

    /// Generate trees for `formulas` and return the decomposition per root label.
    ///
    /// When two formulas share a root label, the later one is returned.
    pub fn generate_trees(
        &self,
        formulas: &[String],
    ) -> ApplicationResult<BTreeMap<String, DecompositionView>> {
        self.generate(formulas)?.views()
    }

    /// Like [`Self::generate_trees`], aborting with full rollback once `cancel` is raised.
    pub fn generate_trees_cancellable(
        &self,
        formulas: &[String],
        cancel: &AtomicBool,
    ) -> ApplicationResult<BTreeMap<String, DecompositionView>> {
        self.generate_cancellable(formulas, cancel)?.views()
    }

    /// Generate trees from the template for `tree_type` and `kpi`.
    pub fn generate_for_category(
        &self,
        provider: &dyn CategoryProvider,
        tree_type: &str,
        kpi: &str,
    ) -> ApplicationResult<Generation> {
        let formulas = provider.get_formulas(tree_type, kpi)?;
        self.generate(&formulas)
    }

    pub fn generate(&self, formulas: &[String]) -> ApplicationResult<Generation> {
        self.generate_cancellable(formulas, &AtomicBool::new(false))
    }

    #[instrument(level = "info", skip(self, formulas, cancel), fields(formulas = formulas.len()))]
    pub fn generate_cancellable(
        &self,
        formulas: &[String],
        cancel: &AtomicBool,
    ) -> ApplicationResult<Generation> {
        let mut attempt = 0;
        loop {
            match self.run_batch(formulas, cancel) {
                Err(ApplicationError::Store(StoreError::Conflict { label }))
                    if attempt < self.commit_retries =>
                {
                    attempt += 1;
                    warn!(
                        "commit lost race on label '{}', rebuilding batch (attempt {})",
                        label, attempt
                    );
                }
                result => return result,
            }
        }
    }

    fn run_batch(&self, formulas: &[String], cancel: &AtomicBool) -> ApplicationResult<Generation> {
        let mut tx = self.store.begin()?;

        let outcome = TreeBuilder::new()
            .with_cancel(cancel)
            .build(&mut *tx, formulas)?;
        let mut forest = outcome.forest;

        let roots = forest.roots().to_vec();
        let layout = self.layout.layout(&roots, &mut forest)?;
        for &id in &layout.assigned {
            let coordinates = forest
                .node(id)
                .and_then(|n| n.coordinates)
                .ok_or_else(|| DomainError::consistency(format!("node {id} lost its coordinates")))?;
            tx.update_coordinates(id, coordinates)?;
        }

        if cancel.load(Ordering::SeqCst) {
            return Err(ApplicationError::Cancelled);
        }
        tx.commit()?;

        info!(
            "generated {} decompositions: {} nodes created, {} adopted, {} laid out",
            forest.decompositions().len(),
            outcome.nodes_created,
            outcome.nodes_adopted,
            layout.assigned.len()
        );
        Ok(Generation {
            forest,
            nodes_created: outcome.nodes_created,
            nodes_adopted: outcome.nodes_adopted,
            nodes_laid_out: layout.assigned.len(),
        })
    }
}
