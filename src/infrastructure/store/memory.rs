use std::sync::{Mutex, MutexGuard};

use crate::domain::Node;
use crate::infrastructure::store::{Backend, ChangeSet, StoreState, Transaction};
use crate::infrastructure::traits::{StoreError, StoreResult, StoreTransaction, TreeStore};

/// Process-local store; state lives for the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing committed state.
    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }
}

impl Backend for MemoryStore {
    fn find_committed(&self, label: &str) -> StoreResult<Option<Node>> {
        Ok(self.lock()?.node_by_label(label).cloned())
    }

    fn apply(&self, changes: &ChangeSet) -> StoreResult<()> {
        self.lock()?.apply(changes)
    }
}

impl TreeStore for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(Transaction::new(self)))
    }

    fn snapshot(&self) -> StoreResult<StoreState> {
        Ok(self.lock()?.clone())
    }
}
