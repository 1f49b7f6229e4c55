//! Tree builder: turns a batch of formulas into a forest of decompositions.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, instrument};

use crate::application::registry::NodeRegistry;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{parse, split_formula, Decomposition, DomainError, Forest};
use crate::infrastructure::traits::{DecompositionStore, NodeStore};

/// Forest built from one batch plus registry counters.
#[derive(Debug)]
pub struct BuildOutcome {
    pub forest: Forest,
    pub nodes_created: usize,
    pub nodes_adopted: usize,
}

/// Constructs decomposition forests from formula text.
#[derive(Debug, Default)]
pub struct TreeBuilder<'a> {
    cancel: Option<&'a AtomicBool>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new() -> Self {
        Self { cancel: None }
    }

    /// Abort with [`ApplicationError::Cancelled`] once `flag` is raised.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check_cancelled(&self) -> ApplicationResult<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(ApplicationError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Build the forest for `formulas`, strictly in input order.
    ///
    /// Nodes and decompositions are written through `store`; the caller decides
    /// whether the writes are committed. The first failing formula aborts the batch.
    ///
    /// A cycle is reported against the formula whose operand closes it: for
    /// `a = b + c` followed by `b = a * d` that is the second formula.
    #[instrument(level = "debug", skip(self, store, formulas), fields(formulas = formulas.len()))]
    pub fn build<S>(&self, store: &mut S, formulas: &[String]) -> ApplicationResult<BuildOutcome>
    where
        S: NodeStore + DecompositionStore + ?Sized,
    {
        let mut registry = NodeRegistry::new();
        let mut records: Vec<(usize, &str, Decomposition)> = Vec::with_capacity(formulas.len());

        for (i, formula) in formulas.iter().enumerate() {
            self.check_cancelled()?;
            let position = i + 1;
            let decomposition = self
                .build_one(&mut *store, &mut registry, formula)
                .map_err(|e| e.in_formula(position, formula))?;
            records.push((position, formula.as_str(), decomposition));
        }

        let nodes_created = registry.created_count();
        let nodes_adopted = registry.adopted_count();
        let mut forest = Forest::new(registry.into_nodes());
        for (position, formula, decomposition) in records.iter().cloned() {
            forest
                .add_decomposition(decomposition)
                .map_err(|e| ApplicationError::from(e).in_formula(position, formula))?;
        }

        if let Some((from, to)) = forest.find_cycle() {
            let offending = forest.decomposition_of(from).and_then(|active| {
                records
                    .iter()
                    .find(|(_, _, d)| d.id == active.id)
                    .map(|(position, formula, _)| (*position, *formula))
            });
            let err = ApplicationError::from(forest.cycle_error(from, to));
            return Err(match offending {
                Some((position, formula)) => err.in_formula(position, formula),
                None => err,
            });
        }

        debug!(
            "built {} decompositions over {} nodes ({} created, {} adopted)",
            forest.decompositions().len(),
            forest.nodes().len(),
            nodes_created,
            nodes_adopted
        );
        Ok(BuildOutcome {
            forest,
            nodes_created,
            nodes_adopted,
        })
    }

    fn build_one<S>(
        &self,
        store: &mut S,
        registry: &mut NodeRegistry,
        formula: &str,
    ) -> ApplicationResult<Decomposition>
    where
        S: NodeStore + DecompositionStore + ?Sized,
    {
        let parts = split_formula(formula)?;
        let root = registry.find_or_create(&mut *store, &parts.root)?;

        let parsed = parse(&parts.expression).map_err(|e| match e {
            DomainError::Parse { reason, .. } => DomainError::parse(formula, reason),
            other => other,
        })?;

        let children = parsed
            .operands
            .iter()
            .map(|label| registry.find_or_create(&mut *store, label))
            .collect::<ApplicationResult<Vec<_>>>()?;

        let decomposition = DecompositionStore::create(&mut *store, root, parsed.operator, &children)?;
        debug!(
            "'{}' -> {:?} over {} children",
            parts.root,
            parsed.operator,
            children.len()
        );
        Ok(decomposition)
    }
}
