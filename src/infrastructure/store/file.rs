use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use crate::domain::Node;
use crate::infrastructure::store::{Backend, ChangeSet, StoreState, Transaction};
use crate::infrastructure::traits::{
    FileSystem, StoreError, StoreResult, StoreTransaction, TreeStore,
};

/// Store persisted as one JSON document.
///
/// A transaction reads the file once at `begin`. Commits re-read it, apply the
/// staged changes and replace the file atomically. Writers are serialized within
/// this process only.
pub struct FileStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(level = "trace", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> StoreResult<StoreState> {
        if !self.fs.exists(&self.path) {
            return Ok(StoreState::default());
        }
        let content = self.fs.read_to_string(&self.path).map_err(|e| {
            StoreError::unavailable(format!("read {}: {}", self.path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(StoreState::default());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl Backend for FileStore {
    fn find_committed(&self, label: &str) -> StoreResult<Option<Node>> {
        Ok(self.load()?.node_by_label(label).cloned())
    }

    fn apply(&self, changes: &ChangeSet) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::unavailable("file store lock poisoned"))?;

        let mut state = self.load()?;
        state.apply(changes)?;

        let content = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::unavailable(format!("serialize store: {e}")))?;
        self.fs.write_atomic(&self.path, &content).map_err(|e| {
            StoreError::unavailable(format!("write {}: {}", self.path.display(), e))
        })?;
        debug!("wrote {} nodes to {}", state.nodes.len(), self.path.display());
        Ok(())
    }
}

impl TreeStore for FileStore {
    /// Reads the file once; lookups within the transaction use that state.
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let state = self.load()?;
        Ok(Box::new(Transaction::with_snapshot(self, state)))
    }

    fn snapshot(&self) -> StoreResult<StoreState> {
        self.load()
    }
}
